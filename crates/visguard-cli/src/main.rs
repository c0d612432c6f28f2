//! visguard - ensure GitLab projects have the correct visibility
//!
//! Reads the project list from `KNOWN_OPEN`, checks each project against
//! GitLab concurrently, and prints one line per project it had to change.
//!
//! Exit status: 0 on completion, 1 on a fatal startup error (including
//! unparseable arguments or environment values), 2 when `FAIL_ON_ERROR` is
//! set and any project could not be reconciled.

mod output;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;

use visguard_core::telemetry::{init_tracing, level_for};
use visguard_core::{ConsoleSink, ProjectDirectory, ReconcileReport, Reconciler, ReportSink};
use visguard_gitlab::GitLabDirectory;

use settings::{Cli, Settings};

const EXIT_OK: u8 = 0;
const EXIT_FATAL: u8 = 1;
const EXIT_PROJECT_FAILURES: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_error_code(&e));
        }
    };
    init_tracing(cli.json, level_for(cli.verbose));

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// `--help` and `--version` succeed; any other parse failure is fatal.
fn parse_error_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => EXIT_OK,
        _ => EXIT_FATAL,
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let settings = Settings::resolve(cli)?;
    let directory =
        GitLabDirectory::new(settings.gitlab.clone()).context("creating GitLab client")?;
    info!(base_url = %directory.base_url(), projects = settings.projects.len(), "starting");

    let mut sink = ConsoleSink::stdout();
    execute(Arc::new(directory), &settings, &mut sink).await
}

/// Reconcile the configured batch against `directory` and decide the exit
/// status. Only a failure to write the report file is an `Err`.
async fn execute(
    directory: Arc<dyn ProjectDirectory>,
    settings: &Settings,
    sink: &mut dyn ReportSink,
) -> Result<u8> {
    let reconciler = Reconciler::with_config(directory, settings.reconcile.clone());
    let report = reconciler
        .reconcile_with_sink(settings.projects.clone(), settings.target, sink)
        .await;

    if let Some(path) = &settings.report_file {
        output::write_report_json(path, &report)?;
    }

    Ok(exit_status(&report, settings.fail_on_error))
}

fn exit_status(report: &ReconcileReport, fail_on_error: bool) -> u8 {
    if fail_on_error && report.has_failures() {
        EXIT_PROJECT_FAILURES
    } else {
        EXIT_OK
    }
}
