//! daylog CLI - Daily task-log reconciliation
//!
//! Fills the summary column of a Google Sheets daily log with the tasks
//! completed in a Todoist project, for each of the last seven days.

mod report;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use daylog_core::{window_offsets, Config, DateRange, PartialConfig};
use daylog_remote::{SheetsClient, TodoistClient};
use daylog_sync::Reconciler;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::report::ReportFormat;

#[derive(Parser)]
#[command(name = "daylog")]
#[command(author, version, about = "Reconcile completed Todoist tasks into a Google Sheets log", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Arguments for `run` when no subcommand is given
    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill empty summary cells for the last seven days (default)
    Run(RunArgs),

    /// Show the days, UTC ranges and tabs a run would check, without network access
    Window {
        /// Reference date instead of today (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        today: Option<NaiveDate>,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// TOML config file; flags and environment variables take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Todoist API token
    #[arg(long, env = "TODOIST_API_TOKEN", hide_env_values = true)]
    todoist_token: Option<String>,

    /// Google spreadsheet id
    #[arg(long, env = "GOOGLE_SHEET_ID")]
    sheet_id: Option<String>,

    /// Service-account key file, relative to the working directory
    #[arg(long, env = "SERVICE_ACCOUNT_FILE", value_name = "FILE")]
    service_account_file: Option<PathBuf>,

    /// Todoist project whose completed tasks are logged
    #[arg(long, env = "TODOIST_PROJECT_NAME")]
    project: Option<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

impl RunArgs {
    /// Layer flags and environment over the optional config file
    fn resolve_config(&self) -> Result<Config> {
        let file = match &self.config {
            Some(path) => PartialConfig::load(path)?,
            None => PartialConfig::default(),
        };
        let flags = PartialConfig {
            todoist_api_token: self.todoist_token.clone(),
            google_sheet_id: self.sheet_id.clone(),
            service_account_file: self.service_account_file.clone(),
            todoist_project_name: self.project.clone(),
            ..PartialConfig::default()
        };
        let working_dir = std::env::current_dir().context("reading working directory")?;
        Ok(file.overlay(flags).resolve(&working_dir)?)
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn cmd_run(args: &RunArgs) -> Result<()> {
    let config = args.resolve_config()?;
    info!(?config, "configuration loaded");

    let todoist = TodoistClient::from_config(&config);
    let sheets = SheetsClient::from_config(&config).with_context(|| {
        format!(
            "loading service-account key {}",
            config.service_account_file.display()
        )
    })?;

    let reconciler = Reconciler::new(&todoist, &sheets).with_retry_policy(config.retry);
    let today = Utc::now().date_naive();
    let report = reconciler
        .run(&config.todoist_project_name, today)
        .with_context(|| {
            format!(
                "resolving Todoist project '{}'",
                config.todoist_project_name
            )
        })?;

    let mut stdout = std::io::stdout().lock();
    report::write_report(&mut stdout, &report, args.format)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_window(today: Option<NaiveDate>) -> Result<()> {
    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let days: Vec<_> = window_offsets()
        .map(|offset| (offset, DateRange::for_offset(today, offset)))
        .collect();

    let mut stdout = std::io::stdout().lock();
    report::write_window(&mut stdout, &days)?;
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Run(args)) => cmd_run(&args),
        Some(Commands::Window { today }) => cmd_window(today),
        None => cmd_run(&cli.run),
    }
}
