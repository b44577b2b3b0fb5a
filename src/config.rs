//! Build Environment Configuration
//!
//! All environment reads happen here, once, at process start. Components
//! downstream receive plain values so they can be tested without touching
//! the process environment.

use anyhow::{bail, Context, Result};

/// Configuration for one check-run submission, read from the CodeBuild
/// environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository in `owner/repo` form, resolved from the CI initiator
    pub repository: String,
    /// Commit SHA the check run attaches to
    pub head_sha: String,
    /// AWS region hosting the Secrets Manager secret
    pub region: String,
    /// Secrets Manager id of the GitHub App private key
    pub secret_id: String,
    /// GitHub App ID (JWT issuer)
    pub app_id: String,
    /// GitHub App installation ID
    pub installation_id: u64,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required variable is missing, the initiator
    /// is unsupported, or the installation ID is not numeric.
    pub fn from_env() -> Result<Self> {
        let initiator = env_var("CODEBUILD_INITIATOR")?;
        let repository = resolve_repository(
            &initiator,
            std::env::var("CODEPIPELINE_FULL_REPOSITORY_NAME").ok().as_deref(),
            std::env::var("CODEBUILD_SRC_DIR").ok().as_deref(),
        )?;

        let installation_id = env_var("GITHUB_APP_INSTALLATION_ID")?
            .parse()
            .context("GITHUB_APP_INSTALLATION_ID is not a number")?;

        Ok(Self {
            repository,
            head_sha: env_var("CODEBUILD_RESOLVED_SOURCE_VERSION")?,
            region: env_var("AWS_REGION")?,
            secret_id: env_var("SECRETS_MANAGER_SECRETID")?,
            app_id: env_var("GITHUB_APP_ID")?,
            installation_id,
        })
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("required environment variable not set: {}", name))
}

/// Resolve `owner/repo` from the CodeBuild initiator.
///
/// CodePipeline invocations carry the repository name in a pipeline stage
/// variable. Webhook invocations (GitHub-Hookshot) encode it in the source
/// directory path after the `github.com/` marker.
pub fn resolve_repository(
    initiator: &str,
    repo_name: Option<&str>,
    src_dir: Option<&str>,
) -> Result<String> {
    if initiator.starts_with("codepipeline/") {
        let name = repo_name.context(
            "required environment variable not set: CODEPIPELINE_FULL_REPOSITORY_NAME",
        )?;
        Ok(name.to_owned())
    } else if initiator.starts_with("GitHub-Hookshot/") {
        let dir =
            src_dir.context("required environment variable not set: CODEBUILD_SRC_DIR")?;
        let (_, repository) = dir.split_once("github.com/").with_context(|| {
            format!("no github.com/ marker in CODEBUILD_SRC_DIR: {}", dir)
        })?;
        Ok(repository.to_owned())
    } else {
        bail!("unsupported CODEBUILD_INITIATOR: {}", initiator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_initiator_returns_variable_verbatim() {
        let repo = resolve_repository(
            "codepipeline/my-pipeline",
            Some("acme/widgets"),
            None,
        )
        .unwrap();
        assert_eq!(repo, "acme/widgets");
    }

    #[test]
    fn test_pipeline_initiator_without_repo_variable_fails() {
        let err = resolve_repository("codepipeline/my-pipeline", None, None).unwrap_err();
        assert!(err
            .to_string()
            .contains("CODEPIPELINE_FULL_REPOSITORY_NAME"));
    }

    #[test]
    fn test_hookshot_initiator_splits_source_dir() {
        let repo = resolve_repository(
            "GitHub-Hookshot/abc123",
            None,
            Some("/codebuild/output/src000/src/github.com/acme/widgets"),
        )
        .unwrap();
        assert_eq!(repo, "acme/widgets");
    }

    #[test]
    fn test_hookshot_initiator_splits_on_first_marker() {
        let repo = resolve_repository(
            "GitHub-Hookshot/abc123",
            None,
            Some("/src/github.com/acme/github.com-mirror"),
        )
        .unwrap();
        assert_eq!(repo, "acme/github.com-mirror");
    }

    #[test]
    fn test_hookshot_initiator_without_marker_fails() {
        let err = resolve_repository(
            "GitHub-Hookshot/abc123",
            None,
            Some("/codebuild/output/src000/src/example.org/acme/widgets"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no github.com/ marker"));
    }

    #[test]
    fn test_hookshot_initiator_without_src_dir_fails() {
        let err = resolve_repository("GitHub-Hookshot/abc123", None, None).unwrap_err();
        assert!(err.to_string().contains("CODEBUILD_SRC_DIR"));
    }

    #[test]
    fn test_unsupported_initiator_fails() {
        let err = resolve_repository("manual", Some("acme/widgets"), Some("/src"))
            .unwrap_err();
        assert!(err.to_string().contains("unsupported CODEBUILD_INITIATOR"));
    }
}
