use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::models::{AuditLogEntry, Employee, LogDraft, SharedUser};

/// Recoverable domain-store rejections. Each one leaves the store unchanged.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("an employee named '{name}' already exists")]
    DuplicateEmployee { name: String },

    #[error("a shared user with email '{email}' already exists")]
    DuplicateEmail { email: String },

    #[error("employee {id} not found; nothing was removed")]
    EmployeeNotFound { id: u32 },
}

/// Result of a cascading employee removal.
#[derive(Debug, PartialEq, Eq)]
pub struct RemovedEmployee {
    pub name: String,
    pub logs_removed: usize,
}

/// Owns the canonical in-memory collections and the mutations that keep them
/// consistent. Single-writer: all mutation happens on the caller's sequence.
#[derive(Debug, Default)]
pub struct DomainStore {
    logs: Vec<AuditLogEntry>,
    employees: Vec<Employee>,
    roles: Vec<String>,
    campaigns: Vec<String>,
    shared_users: Vec<SharedUser>,
}

impl DomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> &[AuditLogEntry] {
        &self.logs
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn campaigns(&self) -> &[String] {
        &self.campaigns
    }

    pub fn shared_users(&self) -> &[SharedUser] {
        &self.shared_users
    }

    /// Appends a log entry, assigning the next id and stamping the creation
    /// instant. Never fails.
    pub fn add_log(&mut self, draft: LogDraft) -> AuditLogEntry {
        self.add_log_at(draft, Utc::now())
    }

    /// Same as `add_log` with an explicit creation instant, for seed data and
    /// tests that need reproducible timestamps.
    pub fn add_log_at(&mut self, draft: LogDraft, created: DateTime<Utc>) -> AuditLogEntry {
        let id = self.logs.iter().map(|l| l.id).max().map_or(1, |m| m + 1);
        let entry = AuditLogEntry {
            id,
            date: draft.date,
            employee_name: draft.employee_name,
            tasks_performed: draft.tasks_performed,
            calls_audited: draft.calls_audited,
            violations_caught: draft.violations_caught,
            sessions_conducted: draft.sessions_conducted,
            warning_letters_issued: draft.warning_letters_issued,
            timestamp: created,
        };
        self.logs.push(entry.clone());
        entry
    }

    /// Inserts a roster member. Names are unique case-insensitively; the
    /// roster stays sorted by name for display.
    pub fn add_employee(
        &mut self,
        name: &str,
        role: &str,
        campaign: &str,
    ) -> Result<Employee, StoreError> {
        let lowered = name.to_lowercase();
        if self
            .employees
            .iter()
            .any(|e| e.name.to_lowercase() == lowered)
        {
            return Err(StoreError::DuplicateEmployee {
                name: name.to_string(),
            });
        }
        let id = self.employees.iter().map(|e| e.id).max().map_or(1, |m| m + 1);
        let employee = Employee {
            id,
            name: name.to_string(),
            role: role.to_string(),
            campaign: campaign.to_string(),
        };
        self.employees.push(employee.clone());
        self.employees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(employee)
    }

    /// Removes an employee and, keyed by the denormalized name, every log
    /// entry that references them. Both collections are consistent when this
    /// returns. A missing id is reported, not fatal: the desired end state
    /// already holds, and duplicate delete events from the UI are expected.
    ///
    /// Renaming an employee is deliberately unsupported; the name-based
    /// cascade would silently orphan their logs otherwise.
    pub fn remove_employee(&mut self, id: u32) -> Result<RemovedEmployee, StoreError> {
        let position = self
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreError::EmployeeNotFound { id })?;
        let name = self.employees.remove(position).name;
        let before = self.logs.len();
        self.logs.retain(|log| log.employee_name != name);
        Ok(RemovedEmployee {
            logs_removed: before - self.logs.len(),
            name,
        })
    }

    /// No-op if the role is already present (exact match); keeps the set
    /// sorted.
    pub fn add_role(&mut self, role: &str) {
        if self.roles.iter().any(|r| r == role) {
            return;
        }
        self.roles.push(role.to_string());
        self.roles.sort();
    }

    pub fn add_campaign(&mut self, campaign: &str) {
        if self.campaigns.iter().any(|c| c == campaign) {
            return;
        }
        self.campaigns.push(campaign.to_string());
        self.campaigns.sort();
    }

    /// Appends a shared user, preserving insertion order. Emails are unique
    /// case-insensitively.
    pub fn add_shared_user(&mut self, user: SharedUser) -> Result<(), StoreError> {
        let lowered = user.email.to_lowercase();
        if self
            .shared_users
            .iter()
            .any(|u| u.email.to_lowercase() == lowered)
        {
            return Err(StoreError::DuplicateEmail { email: user.email });
        }
        self.shared_users.push(user);
        Ok(())
    }

    /// Removes every shared user with an exactly matching email. Removing an
    /// absent email is a no-op.
    pub fn remove_shared_user(&mut self, email: &str) {
        self.shared_users.retain(|u| u.email != email);
    }

    /// Loads log drafts from a CSV file, appending each through `add_log` so
    /// id and timestamp assignment stay uniform. Returns the number inserted.
    pub fn import_csv(&mut self, csv_path: &Path) -> anyhow::Result<usize> {
        let mut reader = csv::Reader::from_path(csv_path)
            .with_context(|| format!("failed to open {}", csv_path.display()))?;
        let mut inserted = 0usize;
        for result in reader.deserialize::<LogDraft>() {
            let draft = result.with_context(|| {
                format!("malformed log row in {}", csv_path.display())
            })?;
            self.add_log(draft);
            inserted += 1;
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn draft(date: &str, employee: &str, calls: u32) -> LogDraft {
        LogDraft {
            date: date.parse().unwrap(),
            employee_name: employee.to_string(),
            tasks_performed: "Standard call auditing.".to_string(),
            calls_audited: calls,
            violations_caught: 0,
            sessions_conducted: 1,
            warning_letters_issued: 0,
        }
    }

    #[test]
    fn log_ids_are_monotonic_from_one() {
        let mut store = DomainStore::new();
        assert_eq!(store.add_log(draft("2024-01-05", "Alice Johnson", 10)).id, 1);
        assert_eq!(store.add_log(draft("2024-01-06", "Alice Johnson", 12)).id, 2);
    }

    #[test]
    fn log_id_resumes_after_max() {
        let mut store = DomainStore::new();
        store.add_log(draft("2024-01-05", "Alice Johnson", 10));
        store.add_log(draft("2024-01-06", "Bob Williams", 8));
        store.add_log(draft("2024-01-07", "Bob Williams", 9));
        let alice = store
            .add_employee("Alice Johnson", "Senior QA", "Project Alpha")
            .unwrap()
            .id;
        let removed = store.remove_employee(alice).unwrap();
        assert_eq!(removed.logs_removed, 1);
        // max surviving id is 3, so the next assignment is 4
        assert_eq!(store.add_log(draft("2024-01-08", "Bob Williams", 7)).id, 4);
    }

    #[test]
    fn duplicate_employee_name_is_case_insensitive() {
        let mut store = DomainStore::new();
        store
            .add_employee("Alice", "Senior QA", "Project Alpha")
            .unwrap();
        let err = store
            .add_employee("alice", "QA Specialist", "Project Beta")
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateEmployee {
                name: "alice".to_string()
            }
        );
        assert_eq!(store.employees().len(), 1);
    }

    #[test]
    fn roster_stays_sorted_by_name() {
        let mut store = DomainStore::new();
        store
            .add_employee("Charlie Brown", "QA Specialist", "Project Alpha")
            .unwrap();
        store
            .add_employee("Alice Johnson", "Senior QA", "Project Alpha")
            .unwrap();
        let names: Vec<&str> = store.employees().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alice Johnson", "Charlie Brown"]);
        // ids reflect insertion order, not sort position
        assert_eq!(store.employees()[0].id, 2);
    }

    #[test]
    fn remove_employee_cascades_by_name() {
        let mut store = DomainStore::new();
        let bob_id = store
            .add_employee("Bob Williams", "QA Specialist", "Project Beta")
            .unwrap()
            .id;
        store
            .add_employee("Diana Miller", "Team Lead", "Project Gamma")
            .unwrap();
        store.add_log(draft("2024-01-05", "Bob Williams", 10));
        store.add_log(draft("2024-01-06", "Diana Miller", 12));
        store.add_log(draft("2024-01-07", "Bob Williams", 8));

        let removed = store.remove_employee(bob_id).unwrap();
        assert_eq!(removed.name, "Bob Williams");
        assert_eq!(removed.logs_removed, 2);
        assert_eq!(store.employees().len(), 1);
        assert_eq!(store.logs().len(), 1);
        assert_eq!(store.logs()[0].employee_name, "Diana Miller");
    }

    #[test]
    fn remove_missing_employee_reports_not_found() {
        let mut store = DomainStore::new();
        let err = store.remove_employee(42).unwrap_err();
        assert_eq!(err, StoreError::EmployeeNotFound { id: 42 });
    }

    #[test]
    fn roles_and_campaigns_dedup_and_sort() {
        let mut store = DomainStore::new();
        store.add_role("Team Lead");
        store.add_role("QA Specialist");
        store.add_role("Team Lead");
        assert_eq!(store.roles(), ["QA Specialist", "Team Lead"]);

        store.add_campaign("Project Beta");
        store.add_campaign("Project Alpha");
        store.add_campaign("Project Beta");
        assert_eq!(store.campaigns(), ["Project Alpha", "Project Beta"]);
    }

    #[test]
    fn shared_users_keep_insertion_order_and_reject_duplicate_email() {
        let mut store = DomainStore::new();
        store
            .add_shared_user(SharedUser {
                email: "zoe@example.com".to_string(),
                role: UserRole::Viewer,
            })
            .unwrap();
        store
            .add_shared_user(SharedUser {
                email: "adam@example.com".to_string(),
                role: UserRole::Qa,
            })
            .unwrap();
        let err = store
            .add_shared_user(SharedUser {
                email: "ZOE@example.com".to_string(),
                role: UserRole::Manager,
            })
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateEmail {
                email: "ZOE@example.com".to_string()
            }
        );
        let emails: Vec<&str> = store
            .shared_users()
            .iter()
            .map(|u| u.email.as_str())
            .collect();
        assert_eq!(emails, vec!["zoe@example.com", "adam@example.com"]);
    }

    #[test]
    fn imported_logs_continue_the_id_sequence() {
        let mut store = DomainStore::new();
        store.add_log(draft("2024-01-04", "Alice Johnson", 10));

        let path = std::env::temp_dir().join(format!("qa-import-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "date,employee_name,tasks_performed,calls_audited,violations_caught,\
             sessions_conducted,warning_letters_issued\n\
             2024-01-05,Bob Williams,Coaching follow-up,8,1,2,0\n\
             2024-01-06,Bob Williams,Call auditing,9,0,1,0\n",
        )
        .unwrap();
        let inserted = store.import_csv(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(inserted, 2);
        let ids: Vec<u32> = store.logs().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        // imported entries flow straight through to the exporter
        let content = crate::export::render_csv(store.logs()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("2,2024-01-05,\"Bob Williams\",\"Coaching follow-up\",8"));
        assert!(lines[3].starts_with("3,2024-01-06,\"Bob Williams\""));
    }

    #[test]
    fn import_rejects_malformed_rows() {
        let mut store = DomainStore::new();
        let path =
            std::env::temp_dir().join(format!("qa-import-bad-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "date,employee_name,tasks_performed,calls_audited,violations_caught,\
             sessions_conducted,warning_letters_issued\n\
             2024-01-05,Bob Williams,Coaching,not-a-number,1,2,0\n",
        )
        .unwrap();
        let err = store.import_csv(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(err.to_string().contains("malformed log row"));
    }

    #[test]
    fn remove_shared_user_is_idempotent() {
        let mut store = DomainStore::new();
        store
            .add_shared_user(SharedUser {
                email: "zoe@example.com".to_string(),
                role: UserRole::Viewer,
            })
            .unwrap();
        store.remove_shared_user("zoe@example.com");
        store.remove_shared_user("zoe@example.com");
        assert!(store.shared_users().is_empty());
    }
}
