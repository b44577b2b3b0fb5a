//! CodeBuild Check Reporter
//!
//! Reports a CI job's build/check status to the GitHub Checks API,
//! authenticating as a GitHub App whose private key lives in AWS Secrets
//! Manager.
//!
//! # Usage
//! ```bash
//! # Mark the build in progress
//! check-reporter unit-tests in_progress
//!
//! # Completed run with rich output loaded from files
//! check-reporter unit-tests completed success \
//!   "Unit tests" "312 passed" file://target/report.md \
//!   file://target/annotations.json
//! ```
//!
//! CI scripts pass `""` for positions they want to skip.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

mod auth;
mod checks;
mod config;
mod input;
mod secrets;

use checks::{CheckRunClient, SubmitOutcome};
use config::Config;

#[derive(Parser, Debug)]
#[command(name = "check-reporter")]
#[command(about = "Report CodeBuild job status to the GitHub Checks API", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Check name shown in the GitHub UI (e.g. "code-coverage")
    name: String,

    /// Check status: queued, in_progress, completed, waiting, requested, pending
    status: Option<String>,

    /// Final conclusion: action_required, cancelled, failure, neutral,
    /// success, skipped, stale, timed_out
    conclusion: Option<String>,

    /// Output title
    title: Option<String>,

    /// Output summary (Markdown)
    summary: Option<String>,

    /// Output details (Markdown), literal or file://<path>
    text: Option<String>,

    /// Inline annotations: JSON array, literal or file://<path>
    annotations: Option<String>,
}

#[tokio::main]
async fn main() {
    // clap exits 2 on usage errors by default; this tool's contract is 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print().ok();
            std::process::exit(code);
        }
    };

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to initialize logging: {}", err);
        std::process::exit(1);
    }

    if let Err(err) = run(cli).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    debug!(
        "Reporting to {} for commit {}",
        config.repository, config.head_sha
    );

    info!("🔐 Fetching GitHub App key from Secrets Manager");
    let private_key = secrets::fetch_private_key(&config.region, &config.secret_id).await?;

    let jwt = auth::generate_jwt(&config.app_id, &private_key)?;
    let token = auth::installation_token(&jwt, config.installation_id).await?;
    info!("🔑 Installation token obtained for app {}", config.app_id);

    let status: Option<checks::CheckStatus> = supplied(cli.status)
        .map(|v| v.parse())
        .transpose()
        .context("invalid status argument")?;
    let conclusion: Option<checks::CheckConclusion> = supplied(cli.conclusion)
        .map(|v| v.parse())
        .transpose()
        .context("invalid conclusion argument")?;
    let text = supplied(cli.text)
        .map(|v| input::load_content(&v))
        .transpose()?;
    let annotations = supplied(cli.annotations)
        .map(|v| input::load_json(&v))
        .transpose()?;

    let check_run = checks::build_check_run(
        cli.name,
        config.head_sha.clone(),
        status,
        conclusion,
        supplied(cli.title),
        supplied(cli.summary),
        text,
        annotations,
    );

    let client = CheckRunClient::new(token)?;
    match client.submit(&config.repository, &check_run).await? {
        SubmitOutcome::Created { body } => {
            info!("✅ Check run created");
            debug!("Check run response: {}", body);
        }
        // Fire-and-forget: the build's exit status stays decoupled from
        // whether the check run displayed.
        SubmitOutcome::Rejected { status, body } => {
            error!("Error creating check run ({}): {}", status, body);
        }
    }

    Ok(())
}

/// Treat empty-string positionals as absent. CI scripts pass `""` to skip
/// middle positions.
fn supplied(arg: Option<String>) -> Option<String> {
    arg.filter(|value| !value.is_empty())
}
