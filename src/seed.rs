use anyhow::Context;
use chrono::{Duration, NaiveDate};

use crate::models::{LogDraft, SharedUser, UserRole};
use crate::store::DomainStore;

const SEED_ROLES: [&str; 3] = ["QA Specialist", "Senior QA", "Team Lead"];
const SEED_CAMPAIGNS: [&str; 3] = ["Project Alpha", "Project Beta", "Project Gamma"];

const SEED_EMPLOYEES: [(&str, &str, &str); 5] = [
    ("Alice Johnson", "Senior QA", "Project Alpha"),
    ("Bob Williams", "QA Specialist", "Project Beta"),
    ("Charlie Brown", "QA Specialist", "Project Alpha"),
    ("Diana Miller", "Team Lead", "Project Gamma"),
    ("Ethan Davis", "QA Specialist", "Project Beta"),
];

/// How far back the seeded log history reaches.
const SEED_HISTORY_DAYS: i64 = 60;

/// Populates the store with the demo roster, sharing list, and a
/// deterministic log history over the trailing two months, so default
/// current-month filters always see data. No randomness: counts are derived
/// arithmetically from the day offset and employee index.
pub fn seed_store(store: &mut DomainStore, today: NaiveDate) -> anyhow::Result<()> {
    for role in SEED_ROLES {
        store.add_role(role);
    }
    for campaign in SEED_CAMPAIGNS {
        store.add_campaign(campaign);
    }
    for (name, role, campaign) in SEED_EMPLOYEES {
        store.add_employee(name, role, campaign)?;
    }
    store.add_shared_user(SharedUser {
        email: "manager@example.com".to_string(),
        role: UserRole::Manager,
    })?;
    store.add_shared_user(SharedUser {
        email: "qa.specialist@example.com".to_string(),
        role: UserRole::Qa,
    })?;

    // Oldest first so seeded ids ascend with the business date.
    for offset in (0..SEED_HISTORY_DAYS).rev() {
        let date = today - Duration::days(offset);
        for (index, (name, _, _)) in SEED_EMPLOYEES.iter().enumerate() {
            let index = index as i64;
            // each employee audits roughly every third day
            if (offset + index) % 3 != 0 {
                continue;
            }
            let calls_audited = 10 + ((offset * 7 + index * 5) % 21) as u32;
            let violations_caught = if (offset + index) % 4 == 0 {
                (1 + offset % 5) as u32
            } else {
                0
            };
            let created = date
                .and_hms_opt(9, 0, 0)
                .context("invalid seed timestamp")?
                .and_utc();
            store.add_log_at(
                LogDraft {
                    date,
                    employee_name: name.to_string(),
                    tasks_performed: "Standard call auditing and feedback session."
                        .to_string(),
                    calls_audited,
                    violations_caught,
                    sessions_conducted: (1 + (offset + index) % 4) as u32,
                    warning_letters_issued: u32::from(violations_caught > 3),
                },
                created,
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> DomainStore {
        let mut store = DomainStore::new();
        seed_store(&mut store, "2024-03-15".parse().unwrap()).unwrap();
        store
    }

    #[test]
    fn seed_is_deterministic() {
        let a = seeded();
        let b = seeded();
        assert_eq!(a.logs().len(), b.logs().len());
        assert!(a
            .logs()
            .iter()
            .zip(b.logs())
            .all(|(x, y)| x.id == y.id
                && x.date == y.date
                && x.employee_name == y.employee_name
                && x.calls_audited == y.calls_audited));
    }

    #[test]
    fn seed_covers_the_known_roster() {
        let store = seeded();
        assert_eq!(store.employees().len(), 5);
        assert_eq!(store.roles().len(), 3);
        assert_eq!(store.campaigns().len(), 3);
        assert_eq!(store.shared_users().len(), 2);
        assert!(!store.logs().is_empty());
    }

    #[test]
    fn seeded_ids_ascend_with_date() {
        let store = seeded();
        assert!(store
            .logs()
            .windows(2)
            .all(|w| w[0].id < w[1].id && w[0].date <= w[1].date));
    }

    #[test]
    fn seeded_counts_are_plausible() {
        let store = seeded();
        assert!(store
            .logs()
            .iter()
            .all(|l| l.calls_audited >= 10 && l.calls_audited <= 30));
        assert!(store
            .logs()
            .iter()
            .all(|l| l.warning_letters_issued == u32::from(l.violations_caught > 3)));
    }
}
