use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::AuditLogEntry;

pub const LEADERBOARD_LIMIT: usize = 10;

/// KPI totals and derived rates for a log subset. Rates are percentages and
/// defined as zero when their denominator is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiTotals {
    pub total_calls: u64,
    pub total_violations: u64,
    pub total_sessions: u64,
    pub total_warnings: u64,
    pub violation_rate: f64,
    pub violation_entry_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTrendPoint {
    pub date: NaiveDate,
    pub calls_audited: u64,
    pub violations_caught: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub employee_name: String,
    pub calls_audited: u64,
    pub violations_caught: u64,
}

/// Single-pass reduction of the subset into KPI totals and rates.
pub fn kpi_totals(logs: &[AuditLogEntry]) -> KpiTotals {
    let mut totals = KpiTotals {
        total_calls: 0,
        total_violations: 0,
        total_sessions: 0,
        total_warnings: 0,
        violation_rate: 0.0,
        violation_entry_rate: 0.0,
    };
    let mut entries_with_audits = 0u64;
    let mut entries_with_violations = 0u64;

    for log in logs {
        totals.total_calls += u64::from(log.calls_audited);
        totals.total_violations += u64::from(log.violations_caught);
        totals.total_sessions += u64::from(log.sessions_conducted);
        totals.total_warnings += u64::from(log.warning_letters_issued);
        if log.calls_audited > 0 {
            entries_with_audits += 1;
            if log.violations_caught > 0 {
                entries_with_violations += 1;
            }
        }
    }

    if totals.total_calls > 0 {
        totals.violation_rate =
            totals.total_violations as f64 / totals.total_calls as f64 * 100.0;
    }
    if entries_with_audits > 0 {
        totals.violation_entry_rate =
            entries_with_violations as f64 / entries_with_audits as f64 * 100.0;
    }
    totals
}

/// Groups the subset by calendar date, summing calls and violations per day,
/// sorted ascending. Dates with no entries are real gaps, never synthesized.
pub fn daily_trend(logs: &[AuditLogEntry]) -> Vec<DailyTrendPoint> {
    let mut by_date: HashMap<NaiveDate, (u64, u64)> = HashMap::new();
    for log in logs {
        let entry = by_date.entry(log.date).or_insert((0, 0));
        entry.0 += u64::from(log.calls_audited);
        entry.1 += u64::from(log.violations_caught);
    }
    let mut points: Vec<DailyTrendPoint> = by_date
        .into_iter()
        .map(|(date, (calls_audited, violations_caught))| DailyTrendPoint {
            date,
            calls_audited,
            violations_caught,
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// Groups the subset by employee name and ranks by calls audited, descending,
/// truncated to the top ten. The sort is stable so ties keep the grouping's
/// encounter order.
pub fn leaderboard(logs: &[AuditLogEntry]) -> Vec<LeaderboardRow> {
    leaderboard_full(logs)
        .into_iter()
        .take(LEADERBOARD_LIMIT)
        .collect()
}

/// The untruncated ranking; the leaderboard is its first ten rows.
pub fn leaderboard_full(logs: &[AuditLogEntry]) -> Vec<LeaderboardRow> {
    let mut order: Vec<String> = Vec::new();
    let mut by_employee: HashMap<String, (u64, u64)> = HashMap::new();
    for log in logs {
        if !by_employee.contains_key(&log.employee_name) {
            order.push(log.employee_name.clone());
        }
        let entry = by_employee.entry(log.employee_name.clone()).or_insert((0, 0));
        entry.0 += u64::from(log.calls_audited);
        entry.1 += u64::from(log.violations_caught);
    }
    let mut rows: Vec<LeaderboardRow> = order
        .into_iter()
        .filter_map(|name| {
            by_employee.get(&name).map(|&(calls_audited, violations_caught)| {
                LeaderboardRow {
                    employee_name: name.clone(),
                    calls_audited,
                    violations_caught,
                }
            })
        })
        .collect();
    rows.sort_by(|a, b| b.calls_audited.cmp(&a.calls_audited));
    rows
}
