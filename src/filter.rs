use crate::models::{AuditLogEntry, Filter};

/// Derives the working subset of logs for the current view: entries whose
/// business date falls within the inclusive `[start_date, end_date]` range
/// and that match the employee selector. Pure; preserves relative order.
pub fn visible_logs(all_logs: &[AuditLogEntry], filter: &Filter) -> Vec<AuditLogEntry> {
    all_logs
        .iter()
        .filter(|log| {
            log.date >= filter.start_date
                && log.date <= filter.end_date
                && (filter.selects_all_employees() || log.employee_name == filter.employee)
        })
        .cloned()
        .collect()
}
