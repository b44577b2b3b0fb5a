//! GitHub Checks API Client
//!
//! Builds the check-run creation payload and submits it for a repository.
//! Submission is fire-and-forget: a non-201 response is reported as an
//! explicit `SubmitOutcome`, never an error, so the caller decides exit
//! behavior.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("check-reporter/", env!("CARGO_PKG_VERSION"));

/// Current status of a check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
}

impl FromStr for CheckStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        Ok(match value {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "waiting" => Self::Waiting,
            "requested" => Self::Requested,
            "pending" => Self::Pending,
            other => bail!("unknown check status: {}", other),
        })
    }
}

/// Final conclusion of a completed check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    ActionRequired,
    Cancelled,
    Failure,
    Neutral,
    Success,
    Skipped,
    Stale,
    TimedOut,
}

impl FromStr for CheckConclusion {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        Ok(match value {
            "action_required" => Self::ActionRequired,
            "cancelled" => Self::Cancelled,
            "failure" => Self::Failure,
            "neutral" => Self::Neutral,
            "success" => Self::Success,
            "skipped" => Self::Skipped,
            "stale" => Self::Stale,
            "timed_out" => Self::TimedOut,
            other => bail!("unknown check conclusion: {}", other),
        })
    }
}

/// Rich output block shown in the check run UI
#[derive(Debug, Serialize)]
pub struct CheckRunOutput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<serde_json::Value>,
}

/// Check-run creation request body
#[derive(Debug, Serialize)]
pub struct CheckRun {
    pub name: String,
    pub head_sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CheckStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<CheckConclusion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CheckRunOutput>,
}

/// Assemble a check-run payload from optional fields.
///
/// The `output` block exists only when `title` is supplied; `summary`,
/// `text` and `annotations` are dropped without it, so callers can
/// suppress the whole output block by omitting the title. Dropped fields
/// are logged so the gating is visible.
#[allow(clippy::too_many_arguments)]
pub fn build_check_run(
    name: String,
    head_sha: String,
    status: Option<CheckStatus>,
    conclusion: Option<CheckConclusion>,
    title: Option<String>,
    summary: Option<String>,
    text: Option<String>,
    annotations: Option<serde_json::Value>,
) -> CheckRun {
    let output = match title {
        Some(title) => Some(CheckRunOutput {
            title,
            summary,
            text,
            annotations,
        }),
        None => {
            for (field, supplied) in [
                ("summary", summary.is_some()),
                ("text", text.is_some()),
                ("annotations", annotations.is_some()),
            ] {
                if supplied {
                    warn!("Dropping {} because no title was supplied", field);
                }
            }
            None
        }
    };

    CheckRun {
        name,
        head_sha,
        status,
        conclusion,
        output,
    }
}

/// Result of a check-run submission
#[derive(Debug)]
pub enum SubmitOutcome {
    /// GitHub created the check run (201)
    Created { body: String },
    /// GitHub refused the check run; the response was received and logged
    Rejected { status: StatusCode, body: String },
}

/// Checks API client holding the installation token
pub struct CheckRunClient {
    client: reqwest::Client,
    token: String,
}

impl CheckRunClient {
    pub fn new(token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, token })
    }

    /// Submit a check run for `repository` (`owner/repo`).
    ///
    /// # Errors
    /// Only transport failures are errors; any HTTP response, success or
    /// not, comes back as a `SubmitOutcome`.
    pub async fn submit(&self, repository: &str, check_run: &CheckRun) -> Result<SubmitOutcome> {
        let url = format!("https://api.github.com/repos/{}/check-runs", repository);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(check_run)
            .send()
            .await
            .context("failed to send check-run request to GitHub API")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        Ok(classify_response(status, body))
    }
}

/// Map an HTTP response to a submission outcome: only 201 counts as
/// created, everything else is a rejection carrying status and body.
fn classify_response(status: StatusCode, body: String) -> SubmitOutcome {
    if status == StatusCode::CREATED {
        SubmitOutcome::Created { body }
    } else {
        SubmitOutcome::Rejected { status, body }
    }
}
