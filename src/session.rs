use std::fmt::Write as _;
use std::io::{BufRead, Write as _};
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;

use crate::export;
use crate::filter::visible_logs;
use crate::metrics::{self, DailyTrendPoint, KpiTotals, LeaderboardRow};
use crate::models::{
    AuditLogEntry, DashboardTheme, Filter, LogDraft, SharedUser, UserRole, ALL_EMPLOYEES,
};
use crate::store::DomainStore;
use crate::summary::{self, Summarizer};

/// One interactive dashboard session: the store, the current filter and view
/// context, and the derived snapshot. Every mutation or filter change runs
/// through `refresh`, which recomputes the visible subset and everything
/// displayed from it.
pub struct Session {
    store: DomainStore,
    filter: Filter,
    role: UserRole,
    theme: DashboardTheme,
    summarizer: Box<dyn Summarizer + Send + Sync>,
    visible: Vec<AuditLogEntry>,
    kpis: KpiTotals,
    trend: Vec<DailyTrendPoint>,
    leaders: Vec<LeaderboardRow>,
}

pub enum Outcome {
    Continue(String),
    Quit,
}

impl Session {
    pub fn new(
        store: DomainStore,
        role: UserRole,
        theme: DashboardTheme,
        today: NaiveDate,
        summarizer: Box<dyn Summarizer + Send + Sync>,
    ) -> Self {
        let mut session = Session {
            store,
            filter: Filter::current_month(today),
            role,
            theme,
            summarizer,
            visible: Vec::new(),
            kpis: metrics::kpi_totals(&[]),
            trend: Vec::new(),
            leaders: Vec::new(),
        };
        session.refresh();
        session
    }

    /// Recomputes the visible subset and every derived metric from scratch.
    fn refresh(&mut self) {
        self.visible = visible_logs(self.store.logs(), &self.filter);
        self.kpis = metrics::kpi_totals(&self.visible);
        self.trend = metrics::daily_trend(&self.visible);
        self.leaders = metrics::leaderboard(&self.visible);
    }

    pub fn visible(&self) -> &[AuditLogEntry] {
        &self.visible
    }

    /// Reads commands from stdin until `quit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!(
            "QA dashboard session (role {}, theme {}). Type 'help' for commands.",
            self.role, self.theme
        );
        let stdin = std::io::stdin();
        loop {
            print!("> ");
            std::io::stdout().flush().context("failed to flush prompt")?;
            let mut line = String::new();
            let read = stdin
                .lock()
                .read_line(&mut line)
                .context("failed to read command")?;
            if read == 0 {
                break;
            }
            match self.handle_line(&line).await {
                Outcome::Continue(output) => {
                    if !output.is_empty() {
                        println!("{output}");
                    }
                }
                Outcome::Quit => break,
            }
        }
        Ok(())
    }

    /// Dispatches one command line and returns the text to display.
    pub async fn handle_line(&mut self, line: &str) -> Outcome {
        let tokens = tokenize(line);
        let parts: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let output = match parts.as_slice() {
            [] => String::new(),
            ["help"] => help_text(),
            ["quit"] | ["exit"] => return Outcome::Quit,
            ["show"] => self.show_dashboard(),
            ["logs"] => self.show_logs(),
            ["filter", rest @ ..] => self.set_filter(rest),
            ["log", "add", rest @ ..] => self.add_log(rest),
            ["employee", "add", rest @ ..] => self.add_employee(rest),
            ["employee", "remove", rest @ ..] => self.remove_employee(rest),
            ["roles", "add", name] => self.add_role(name),
            ["roles", "list"] => self.store.roles().join(", "),
            ["campaigns", "add", name] => self.add_campaign(name),
            ["campaigns", "list"] => self.store.campaigns().join(", "),
            ["share", rest @ ..] => self.share(rest),
            ["export", rest @ ..] => self.export(rest),
            ["summarize"] => self.summarize().await,
            ["role", name] => self.switch_role(name),
            ["theme"] => {
                self.theme = self.theme.toggled();
                format!("Theme is now {}.", self.theme)
            }
            _ => "Unrecognized command. Type 'help' for the command list.".to_string(),
        };
        Outcome::Continue(output)
    }

    fn show_dashboard(&self) -> String {
        if !self.role.can_view_dashboard() {
            return denied("view the dashboard");
        }
        render_dashboard(&self.filter, &self.kpis, &self.trend, &self.leaders)
    }

    fn show_logs(&self) -> String {
        if !self.role.can_add_logs() {
            return denied("view the log data table");
        }
        if self.visible.is_empty() {
            return "No log entries match the current filter.".to_string();
        }
        let mut out = String::new();
        for log in &self.visible {
            let _ = writeln!(
                out,
                "#{} {} {} | calls {} violations {} sessions {} warnings {}",
                log.id,
                log.date.format("%Y-%m-%d"),
                log.employee_name,
                log.calls_audited,
                log.violations_caught,
                log.sessions_conducted,
                log.warning_letters_issued,
            );
        }
        out.trim_end().to_string()
    }

    /// `filter <start-date> <end-date> [employee]`
    fn set_filter(&mut self, args: &[&str]) -> String {
        let (start, end, employee) = match args {
            [start, end] => (start, end, None),
            [start, end, employee] => (start, end, Some(*employee)),
            _ => return "Usage: filter <start-date> <end-date> [employee]".to_string(),
        };
        let start_date: NaiveDate = match start.parse() {
            Ok(date) => date,
            Err(_) => return format!("Invalid start date '{start}' (expected YYYY-MM-DD)."),
        };
        let end_date: NaiveDate = match end.parse() {
            Ok(date) => date,
            Err(_) => return format!("Invalid end date '{end}' (expected YYYY-MM-DD)."),
        };
        self.filter.start_date = start_date;
        self.filter.end_date = end_date;
        if let Some(employee) = employee {
            self.filter.employee = employee.to_string();
        }
        self.refresh();
        format!(
            "Filter set: {} to {}, employee {}. {} entries visible.",
            self.filter.start_date,
            self.filter.end_date,
            self.filter.employee,
            self.visible.len()
        )
    }

    /// `log add <employee> <date> <calls> <violations> <sessions> <warnings> [tasks]`
    fn add_log(&mut self, args: &[&str]) -> String {
        if !self.role.can_add_logs() {
            return denied("add log entries");
        }
        let (name, date, counts, tasks) = match args {
            [name, date, calls, violations, sessions, warnings, tasks @ ..] => {
                (name, date, [calls, violations, sessions, warnings], tasks)
            }
            _ => {
                return "Usage: log add <employee> <date> <calls> <violations> \
                        <sessions> <warnings> [tasks]"
                    .to_string()
            }
        };
        if name.trim().is_empty() {
            return "Employee name is required.".to_string();
        }
        if !self.store.employees().iter().any(|e| e.name == **name) {
            return format!("'{name}' is not on the roster; add the employee first.");
        }
        let date: NaiveDate = match date.parse() {
            Ok(date) => date,
            Err(_) => return format!("Invalid date '{date}' (expected YYYY-MM-DD)."),
        };
        let mut parsed = [0u32; 4];
        for (slot, raw) in parsed.iter_mut().zip(counts) {
            match raw.parse::<u32>() {
                Ok(value) => *slot = value,
                Err(_) => return format!("'{raw}' is not a non-negative count."),
            }
        }
        let tasks = if tasks.is_empty() {
            "Standard call auditing and feedback session.".to_string()
        } else {
            tasks.join(" ")
        };
        let entry = self.store.add_log(LogDraft {
            date,
            employee_name: name.to_string(),
            tasks_performed: tasks,
            calls_audited: parsed[0],
            violations_caught: parsed[1],
            sessions_conducted: parsed[2],
            warning_letters_issued: parsed[3],
        });
        let id = entry.id;
        self.refresh();
        format!("Log entry #{id} recorded.")
    }

    /// `employee add <name> <role> <campaign>`
    fn add_employee(&mut self, args: &[&str]) -> String {
        if !self.role.can_manage_roster() {
            return denied("manage the roster");
        }
        let [name, role, campaign] = args else {
            return "Usage: employee add <name> <role> <campaign>".to_string();
        };
        if name.trim().is_empty() {
            return "Employee name is required.".to_string();
        }
        match self.store.add_employee(name, role, campaign) {
            Ok(employee) => {
                let line = format!("Added employee #{} {}.", employee.id, employee.name);
                self.refresh();
                line
            }
            Err(err) => err.to_string(),
        }
    }

    /// `employee remove <id>`
    fn remove_employee(&mut self, args: &[&str]) -> String {
        if !self.role.can_manage_roster() {
            return denied("manage the roster");
        }
        let [id] = args else {
            return "Usage: employee remove <id>".to_string();
        };
        let id: u32 = match id.parse() {
            Ok(id) => id,
            Err(_) => return format!("'{id}' is not an employee id."),
        };
        match self.store.remove_employee(id) {
            Ok(removed) => {
                self.refresh();
                format!(
                    "Removed employee \"{}\" and {} associated log entries.",
                    removed.name, removed.logs_removed
                )
            }
            // already gone: report it and carry on
            Err(err) => err.to_string(),
        }
    }

    fn add_role(&mut self, name: &str) -> String {
        if !self.role.can_manage_roster() {
            return denied("manage roles");
        }
        self.store.add_role(name);
        format!("Roles: {}", self.store.roles().join(", "))
    }

    fn add_campaign(&mut self, name: &str) -> String {
        if !self.role.can_manage_roster() {
            return denied("manage campaigns");
        }
        self.store.add_campaign(name);
        format!("Campaigns: {}", self.store.campaigns().join(", "))
    }

    /// `share add <email> <role>` | `share remove <email>` | `share list`
    fn share(&mut self, args: &[&str]) -> String {
        if !self.role.can_share() {
            return denied("manage dashboard sharing");
        }
        match args {
            ["add", email, role] => {
                let role: UserRole = match role.parse() {
                    Ok(role) => role,
                    Err(err) => return err,
                };
                match self.store.add_shared_user(SharedUser {
                    email: email.to_string(),
                    role,
                }) {
                    Ok(()) => format!("Shared with {email} as {role}."),
                    Err(err) => err.to_string(),
                }
            }
            ["remove", email] => {
                self.store.remove_shared_user(email);
                format!("{email} no longer has access.")
            }
            ["list"] => {
                if self.store.shared_users().is_empty() {
                    "Nobody has been granted access.".to_string()
                } else {
                    self.store
                        .shared_users()
                        .iter()
                        .map(|u| format!("{} ({})", u.email, u.role))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            _ => "Usage: share add <email> <role> | share remove <email> | share list"
                .to_string(),
        }
    }

    /// `export [directory]`
    fn export(&mut self, args: &[&str]) -> String {
        if !self.role.can_export() {
            return denied("export reports");
        }
        let dir = match args {
            [] => ".",
            [dir] => dir,
            _ => return "Usage: export [directory]".to_string(),
        };
        match write_report(&self.visible, &self.filter, Path::new(dir)) {
            Ok(path) => format!("Report written to {path}."),
            Err(err) => format!("{err:#}"),
        }
    }

    async fn summarize(&mut self) -> String {
        if !self.role.can_summarize() {
            return denied("generate summaries");
        }
        if self.visible.is_empty() {
            return "No log entries to summarize for the current filter.".to_string();
        }
        println!("Generating summary...");
        let text = summary::generate_summary(
            self.summarizer.as_ref(),
            &self.visible,
            &self.filter.employee,
        )
        .await;
        render_summary(&text)
    }

    /// Switching the viewing role is itself a Manager affordance.
    fn switch_role(&mut self, name: &str) -> String {
        if !self.role.can_manage_roster() {
            return denied("switch the viewing role");
        }
        match name.parse::<UserRole>() {
            Ok(role) => {
                self.role = role;
                format!("Viewing as {role}.")
            }
            Err(err) => err,
        }
    }
}

fn denied(action: &str) -> String {
    format!("The current role is not allowed to {action}.")
}

fn help_text() -> String {
    [
        "show                                   Print KPIs, daily trend and leaderboard",
        "logs                                   List the visible log entries",
        "filter <start> <end> [employee]        Set the date range and employee selector",
        "log add <employee> <date> <calls> <violations> <sessions> <warnings> [tasks]",
        "employee add <name> <role> <campaign>  Add a roster member",
        "employee remove <id>                   Remove a member and their logs",
        "roles add <name> | roles list",
        "campaigns add <name> | campaigns list",
        "share add <email> <role> | share remove <email> | share list",
        "export [directory]                     Write the CSV report",
        "summarize                              Generate the AI narrative",
        "role <manager|qa|viewer>               Switch the viewing role",
        "theme                                  Toggle light/dark",
        "quit",
    ]
    .join("\n")
}

/// Splits a command line on whitespace; double quotes group words into one
/// token so names like "Bob Williams" survive.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut saw_quote = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                saw_quote = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || saw_quote {
                    tokens.push(std::mem::take(&mut current));
                }
                saw_quote = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || saw_quote {
        tokens.push(current);
    }
    tokens
}

/// Renders the dashboard view the way the UI lays it out: KPI cards first,
/// then the daily trend, then the leaderboard.
pub fn render_dashboard(
    filter: &Filter,
    kpis: &KpiTotals,
    trend: &[DailyTrendPoint],
    leaders: &[LeaderboardRow],
) -> String {
    let mut out = String::new();
    let scope = if filter.employee == ALL_EMPLOYEES {
        "all employees".to_string()
    } else {
        filter.employee.clone()
    };
    let _ = writeln!(
        out,
        "QA performance for {scope}, {} to {}",
        filter.start_date, filter.end_date
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "KPIs");
    let _ = writeln!(out, "- Calls Audited: {}", kpis.total_calls);
    let _ = writeln!(out, "- Violations Caught: {}", kpis.total_violations);
    let _ = writeln!(out, "- Coaching Sessions: {}", kpis.total_sessions);
    let _ = writeln!(out, "- Warning Letters: {}", kpis.total_warnings);
    let _ = writeln!(out, "- Violation Rate: {:.2}%", kpis.violation_rate);
    let _ = writeln!(
        out,
        "- Audits w/ Violation: {:.2}%",
        kpis.violation_entry_rate
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Daily Trends");
    if trend.is_empty() {
        let _ = writeln!(out, "No entries in this window.");
    } else {
        for point in trend {
            let _ = writeln!(
                out,
                "- {}: {} calls audited, {} violations",
                point.date, point.calls_audited, point.violations_caught
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Employee Leaderboard");
    if leaders.is_empty() {
        let _ = writeln!(out, "No entries in this window.");
    } else {
        for (rank, row) in leaders.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {}: {} calls audited, {} violations",
                rank + 1,
                row.employee_name,
                row.calls_audited,
                row.violations_caught
            );
        }
    }
    out.trim_end().to_string()
}

/// Indents the numbered assessment lines so they read as items.
pub fn render_summary(text: &str) -> String {
    summary::summary_paragraphs(text)
        .into_iter()
        .map(|line| {
            if summary::is_numbered_item(&line) {
                format!("  {line}")
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the CSV report and writes it under `dir` with the derived
/// filename. An empty subset is a reported rejection, never an empty file.
pub fn write_report(
    subset: &[AuditLogEntry],
    filter: &Filter,
    dir: &Path,
) -> anyhow::Result<String> {
    let content = export::render_csv(subset)?;
    let path = dir.join(export::export_filename(filter));
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.display().to_string())
}
