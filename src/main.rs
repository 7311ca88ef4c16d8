use std::path::PathBuf;

use anyhow::bail;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

mod export;
mod filter;
mod metrics;
mod models;
mod seed;
mod session;
mod store;
mod summary;

use models::{DashboardTheme, Filter, UserRole, ALL_EMPLOYEES};
use store::DomainStore;
use summary::{GeminiSummarizer, Summarizer};

#[derive(Parser)]
#[command(name = "qa-dashboard")]
#[command(about = "QA performance dashboard for call-center audit operations", long_about = None)]
struct Cli {
    /// Viewing role; advisory, it only gates which commands are available
    #[arg(long, value_enum, default_value_t = UserRole::Manager)]
    role: UserRole,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Import audit log entries from a CSV file
    #[arg(long)]
    import: Option<PathBuf>,

    /// Skip the built-in demo roster and log history
    #[arg(long)]
    no_seed: bool,
}

#[derive(Args)]
struct FilterArgs {
    /// Inclusive range start; defaults to the first day of the current month
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Inclusive range end; defaults to the last day of the current month
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Employee name, or "All"
    #[arg(long, default_value = ALL_EMPLOYEES)]
    employee: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPI totals, the daily trend and the employee leaderboard
    Dashboard {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write the filtered subset as a CSV report
    Export {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Directory the report file is written into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Generate the AI performance narrative for the filtered subset
    Summarize {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Interactive dashboard session over the in-memory store
    Session {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, value_enum, default_value_t = DashboardTheme::Light)]
        theme: DashboardTheme,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Dashboard { data, filter } => {
            if !cli.role.can_view_dashboard() {
                bail!("the {} role cannot view the dashboard", cli.role);
            }
            let store = build_store(&data, today)?;
            let filter = resolve_filter(&filter, today);
            let visible = filter::visible_logs(store.logs(), &filter);
            println!(
                "{}",
                session::render_dashboard(
                    &filter,
                    &metrics::kpi_totals(&visible),
                    &metrics::daily_trend(&visible),
                    &metrics::leaderboard(&visible),
                )
            );
        }
        Commands::Export {
            data,
            filter,
            out_dir,
        } => {
            if !cli.role.can_export() {
                bail!("only the Manager role can export reports");
            }
            let store = build_store(&data, today)?;
            let filter = resolve_filter(&filter, today);
            let visible = filter::visible_logs(store.logs(), &filter);
            match export::render_csv(&visible) {
                Ok(content) => {
                    let path = out_dir.join(export::export_filename(&filter));
                    std::fs::write(&path, content)?;
                    println!("Report written to {}.", path.display());
                }
                Err(err) => println!("{err}."),
            }
        }
        Commands::Summarize { data, filter } => {
            if !cli.role.can_summarize() {
                bail!("the {} role cannot generate summaries", cli.role);
            }
            let store = build_store(&data, today)?;
            let filter = resolve_filter(&filter, today);
            let visible = filter::visible_logs(store.logs(), &filter);
            if visible.is_empty() {
                println!("No log entries to summarize for the selected filters.");
                return Ok(());
            }
            let summarizer = GeminiSummarizer::from_env()?;
            println!("Generating summary...");
            let text =
                summary::generate_summary(&summarizer, &visible, &filter.employee).await;
            println!("{}", session::render_summary(&text));
        }
        Commands::Session { data, theme } => {
            let store = build_store(&data, today)?;
            let summarizer: Box<dyn Summarizer + Send + Sync> =
                match GeminiSummarizer::from_env() {
                    Ok(summarizer) => Box::new(summarizer),
                    Err(err) => {
                        eprintln!("note: {err:#}");
                        Box::new(summary::UnconfiguredSummarizer)
                    }
                };
            let mut session =
                session::Session::new(store, cli.role, theme, today, summarizer);
            session.run().await?;
        }
    }

    Ok(())
}

fn build_store(data: &DataArgs, today: NaiveDate) -> anyhow::Result<DomainStore> {
    let mut store = DomainStore::new();
    if !data.no_seed {
        seed::seed_store(&mut store, today)?;
    }
    if let Some(csv) = &data.import {
        let inserted = store.import_csv(csv)?;
        println!("Imported {inserted} log entries from {}.", csv.display());
    }
    Ok(store)
}

fn resolve_filter(args: &FilterArgs, today: NaiveDate) -> Filter {
    let mut filter = Filter::current_month(today);
    if let Some(start) = args.start_date {
        filter.start_date = start;
    }
    if let Some(end) = args.end_date {
        filter.end_date = end;
    }
    filter.employee = args.employee.clone();
    filter
}
