//! Environment-driven settings.
//!
//! Every option is read from its environment variable; the matching long
//! flag exists for ad-hoc overrides. Running with no arguments uses the
//! environment alone.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use visguard_core::{ProjectId, ReconcileConfig, Visibility};
use visguard_gitlab::GitLabConfig;

#[derive(Parser, Debug)]
#[command(name = "visguard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ensure GitLab projects have the correct visibility", long_about = None)]
pub struct Cli {
    /// GitLab instance or API URL (default: https://gitlab.com/api/v4/)
    #[arg(long, env = "GITLAB_URL")]
    pub gitlab_url: Option<String>,

    /// Personal access token with api scope
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub gitlab_token: Option<String>,

    /// Comma-separated project ids or paths to enforce
    #[arg(long, env = "KNOWN_OPEN")]
    pub known_open: Option<String>,

    /// Visibility the listed projects must have
    #[arg(long, env = "TARGET_VISIBILITY", default_value = "public")]
    pub target_visibility: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "GITLAB_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Cap on concurrent project checks (default: unbounded)
    #[arg(long, env = "MAX_CONCURRENT")]
    pub max_concurrent: Option<usize>,

    /// Exit with status 2 when any project could not be reconciled
    #[arg(long, env = "FAIL_ON_ERROR", value_parser = clap::builder::FalseyValueParser::new())]
    pub fail_on_error: bool,

    /// Also write the full run report as JSON to this path
    #[arg(long, env = "REPORT_FILE")]
    pub report_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    pub json: bool,
}

/// Validated settings for one run.
#[derive(Debug)]
pub struct Settings {
    pub gitlab: GitLabConfig,
    pub projects: Vec<ProjectId>,
    pub target: Visibility,
    pub reconcile: ReconcileConfig,
    pub fail_on_error: bool,
    pub report_file: Option<PathBuf>,
}

impl Settings {
    /// Validate parsed arguments. Any error here is fatal for the run.
    pub fn resolve(cli: Cli) -> Result<Settings> {
        let token = cli.gitlab_token.unwrap_or_default();
        if token.trim().is_empty() {
            bail!("GITLAB_TOKEN is not set");
        }

        let target: Visibility = cli
            .target_visibility
            .parse()
            .context("reading TARGET_VISIBILITY")?;

        if cli.timeout_secs == 0 {
            bail!("GITLAB_TIMEOUT_SECS must be greater than zero");
        }

        let gitlab = GitLabConfig::new(token.trim())
            .with_base_url(cli.gitlab_url.as_deref().unwrap_or_default())
            .with_timeout(Duration::from_secs(cli.timeout_secs));

        Ok(Settings {
            gitlab,
            projects: split_project_ids(cli.known_open.as_deref().unwrap_or_default()),
            target,
            reconcile: ReconcileConfig {
                max_concurrent: cli.max_concurrent,
            },
            fail_on_error: cli.fail_on_error,
            report_file: cli.report_file,
        })
    }
}

/// Split a comma-separated list and trim each entry.
///
/// Empty entries between commas are kept so the directory can reject them;
/// a blank list yields no ids at all.
pub fn split_project_ids(raw: &str) -> Vec<ProjectId> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| ProjectId::from(s.trim())).collect()
}
