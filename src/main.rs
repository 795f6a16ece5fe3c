use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod client;
mod config;
mod dashboard;
mod error;
mod export;
#[cfg(test)]
mod fixtures;
mod metrics;
mod models;
mod render;
mod report;
mod watch;

use client::HttpDirectory;
use config::{DashboardConfig, DEFAULT_TIMEOUT_SECS};
use dashboard::{Action, Intent, Orchestrator};
use models::{ListQuery, RiskLevel, SortOption};
use render::{render_dashboard, Palette};

#[derive(Parser)]
#[command(name = "dropout-risk-dashboard")]
#[command(about = "Student dropout risk dashboard backed by the student directory service", long_about = None)]
struct Cli {
    /// Directory service address (overrides STUDENT_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Per-request timeout in seconds, 0 to wait indefinitely
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
    /// Disable ANSI colours in terminal output
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct ViewArgs {
    /// Only include students at this risk level
    #[arg(long, value_enum, ignore_case = true)]
    risk_level: Option<RiskLevel>,
    /// Ordering applied by the directory service
    #[arg(long, value_enum, ignore_case = true, default_value_t = SortOption::Default)]
    sort_by: SortOption,
}

impl ViewArgs {
    fn query(self) -> ListQuery {
        ListQuery::new(self.risk_level, self.sort_by)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current student list
    List {
        #[command(flatten)]
        view: ViewArgs,
        /// Include attendance, assignment and contact history
        #[arg(long)]
        expand: bool,
    },
    /// Re-run risk evaluation, then show the refreshed list
    Evaluate {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long)]
        expand: bool,
    },
    /// Interactive dashboard driven by commands on stdin
    Watch {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "risk-report.md")]
        out: PathBuf,
    },
    /// Export students with derived metrics as CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "students.csv")]
        csv: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn load(
    directory: Rc<HttpDirectory>,
    view: ViewArgs,
    evaluate: bool,
) -> Orchestrator<HttpDirectory> {
    let mut dashboard = Orchestrator::new(directory, view.query());
    dashboard.dispatch(Action::Mount);
    if evaluate {
        dashboard.dispatch(Intent::Evaluate);
    }
    dashboard.run_until_idle().await;
    dashboard
}

fn show(
    dashboard: &Orchestrator<HttpDirectory>,
    expand: bool,
    palette: Palette,
) -> anyhow::Result<()> {
    let state = dashboard.state();
    let expanded: HashSet<String> = if expand {
        state
            .students
            .iter()
            .map(|student| student.student_id.clone())
            .collect()
    } else {
        HashSet::new()
    };
    print!("{}", render_dashboard(state, &expanded, palette));

    if let Some(error) = &state.error {
        anyhow::bail!("{error}");
    }
    Ok(())
}

fn loaded_students(
    dashboard: &Orchestrator<HttpDirectory>,
) -> anyhow::Result<&[models::StudentRecord]> {
    let state = dashboard.state();
    match &state.error {
        Some(error) => anyhow::bail!("{error}"),
        None => Ok(state.students.as_slice()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config =
        DashboardConfig::resolve(cli.base_url.as_deref(), cli.timeout_secs, !cli.no_color)?;
    let directory = Rc::new(HttpDirectory::new(&config)?);
    let palette = Palette::new(config.color);

    match cli.command {
        Commands::List { view, expand } => {
            let dashboard = load(directory, view, false).await;
            show(&dashboard, expand, palette)?;
        }
        Commands::Evaluate { view, expand } => {
            let dashboard = load(directory, view, true).await;
            show(&dashboard, expand, palette)?;
        }
        Commands::Watch { view } => {
            let mut dashboard = Orchestrator::new(directory, view.query());
            watch::watch(&mut dashboard, palette).await?;
        }
        Commands::Report { view, out } => {
            let dashboard = load(directory, view, false).await;
            let students = loaded_students(&dashboard)?;
            let report = report::build_report(view.query(), students, chrono::Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { view, csv } => {
            let dashboard = load(directory, view, false).await;
            let students = loaded_students(&dashboard)?;
            let exported = export::export_csv(&csv, students)?;
            println!("Exported {exported} students to {}.", csv.display());
        }
    }

    Ok(())
}
