use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, Utc};
use serde::Deserialize;

/// Sentinel employee filter value meaning "no employee restriction".
pub const ALL_EMPLOYEES: &str = "All";

#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    pub id: u32,
    /// Business date of the audit, distinct from the creation instant.
    pub date: NaiveDate,
    /// Denormalized copy of the employee name at creation time, not a key.
    pub employee_name: String,
    pub tasks_performed: String,
    pub calls_audited: u32,
    pub violations_caught: u32,
    pub sessions_conducted: u32,
    pub warning_letters_issued: u32,
    /// Creation instant, assigned once by the store and never recomputed.
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    /// RFC 3339 seconds precision with a `Z` suffix, the export wire form.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Caller-supplied portion of a log entry; the store assigns id and timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct LogDraft {
    pub date: NaiveDate,
    pub employee_name: String,
    pub tasks_performed: String,
    pub calls_audited: u32,
    pub violations_caught: u32,
    pub sessions_conducted: u32,
    pub warning_letters_issued: u32,
}

#[derive(Debug, Clone)]
pub struct Employee {
    pub id: u32,
    pub name: String,
    pub role: String,
    pub campaign: String,
}

#[derive(Debug, Clone)]
pub struct SharedUser {
    pub email: String,
    pub role: UserRole,
}

/// Viewing role for the dashboard. Advisory, client-chosen; it gates which
/// affordances are exposed, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UserRole {
    Manager,
    Qa,
    Viewer,
}

impl UserRole {
    /// The KPI/trend/leaderboard view is hidden from the QA role.
    pub fn can_view_dashboard(self) -> bool {
        self != UserRole::Qa
    }

    /// Log entry is hidden from read-only viewers.
    pub fn can_add_logs(self) -> bool {
        self != UserRole::Viewer
    }

    pub fn can_manage_roster(self) -> bool {
        self == UserRole::Manager
    }

    pub fn can_export(self) -> bool {
        self == UserRole::Manager
    }

    pub fn can_share(self) -> bool {
        self == UserRole::Manager
    }

    /// Narrative generation rides on the dashboard view.
    pub fn can_summarize(self) -> bool {
        self.can_view_dashboard()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Manager => write!(f, "Manager"),
            UserRole::Qa => write!(f, "QA"),
            UserRole::Viewer => write!(f, "Viewer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manager" => Ok(UserRole::Manager),
            "qa" => Ok(UserRole::Qa),
            "viewer" => Ok(UserRole::Viewer),
            other => Err(format!(
                "unknown role '{other}' (expected manager, qa or viewer)"
            )),
        }
    }
}

/// Session-wide display preference. No business-logic effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DashboardTheme {
    Light,
    Dark,
}

impl DashboardTheme {
    pub fn toggled(self) -> Self {
        match self {
            DashboardTheme::Light => DashboardTheme::Dark,
            DashboardTheme::Dark => DashboardTheme::Light,
        }
    }
}

impl std::fmt::Display for DashboardTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardTheme::Light => write!(f, "light"),
            DashboardTheme::Dark => write!(f, "dark"),
        }
    }
}

/// Transient view filter: inclusive date bounds plus an employee selector.
#[derive(Debug, Clone)]
pub struct Filter {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub employee: String,
}

impl Filter {
    /// First and last day of the given date's calendar month, all employees.
    pub fn current_month(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        let next_month = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        let end = next_month.map(|d| d - Duration::days(1)).unwrap_or(today);
        Filter {
            start_date: start,
            end_date: end,
            employee: ALL_EMPLOYEES.to_string(),
        }
    }

    pub fn selects_all_employees(&self) -> bool {
        self.employee == ALL_EMPLOYEES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_month_covers_whole_month() {
        let filter = Filter::current_month(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(
            filter.start_date,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert_eq!(
            filter.end_date,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(filter.employee, ALL_EMPLOYEES);
    }

    #[test]
    fn current_month_handles_december_rollover() {
        let filter = Filter::current_month(NaiveDate::from_ymd_opt(2024, 12, 3).unwrap());
        assert_eq!(
            filter.end_date,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
    }

    #[test]
    fn role_gates_match_the_ui() {
        assert!(UserRole::Manager.can_view_dashboard());
        assert!(UserRole::Manager.can_manage_roster());
        assert!(UserRole::Manager.can_export());
        assert!(UserRole::Manager.can_share());
        assert!(UserRole::Manager.can_add_logs());

        assert!(!UserRole::Qa.can_view_dashboard());
        assert!(UserRole::Qa.can_add_logs());
        assert!(!UserRole::Qa.can_export());
        assert!(!UserRole::Qa.can_manage_roster());

        assert!(UserRole::Viewer.can_view_dashboard());
        assert!(!UserRole::Viewer.can_add_logs());
        assert!(!UserRole::Viewer.can_share());
    }

    #[test]
    fn timestamp_string_uses_z_suffix() {
        let entry = AuditLogEntry {
            id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            employee_name: "A".into(),
            tasks_performed: String::new(),
            calls_audited: 0,
            violations_caught: 0,
            sessions_conducted: 0,
            warning_letters_issued: 0,
            timestamp: DateTime::parse_from_rfc3339("2024-01-05T10:00:00+00:00")
                .unwrap()
                .with_timezone(&Utc),
        };
        assert_eq!(entry.timestamp_string(), "2024-01-05T10:00:00Z");
    }
}
