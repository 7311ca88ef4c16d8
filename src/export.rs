use std::fmt::Write;

use crate::models::{AuditLogEntry, Filter};

pub const CSV_HEADER: &str = "ID,Date,Employee Name,Tasks Performed,Calls Audited,\
Violations Caught,Sessions Conducted,Warning Letters Issued,Timestamp";

/// Exporting an empty subset is a reported rejection, not a zero-row file.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no data to export for the selected filters")]
pub struct EmptyExport;

/// Serializes the subset as delimited text: fixed header, one row per entry
/// in the subset's existing order, UNIX line endings. String fields are
/// always double-quoted with internal quotes doubled; numerics are bare.
pub fn render_csv(subset: &[AuditLogEntry]) -> Result<String, EmptyExport> {
    if subset.is_empty() {
        return Err(EmptyExport);
    }
    let mut out = String::from(CSV_HEADER);
    for log in subset {
        out.push('\n');
        let _ = write!(
            out,
            "{},{},{},{},{},{},{},{},{}",
            log.id,
            log.date.format("%Y-%m-%d"),
            quoted(&log.employee_name),
            quoted(&log.tasks_performed),
            log.calls_audited,
            log.violations_caught,
            log.sessions_conducted,
            log.warning_letters_issued,
            log.timestamp_string(),
        );
    }
    Ok(out)
}

/// `QA_Report_<EmployeePart>_<yyyyMMdd>_to_<yyyyMMdd>.csv`, with each
/// whitespace run in the employee part replaced by a single underscore.
/// Boundary runs are replaced too, not stripped.
pub fn export_filename(filter: &Filter) -> String {
    let employee_part = if filter.selects_all_employees() {
        "All_Employees".to_string()
    } else {
        underscore_whitespace(&filter.employee)
    };
    format!(
        "QA_Report_{}_{}_to_{}.csv",
        employee_part,
        filter.start_date.format("%Y%m%d"),
        filter.end_date.format("%Y%m%d"),
    )
}

fn underscore_whitespace(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
