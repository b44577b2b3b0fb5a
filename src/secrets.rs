//! AWS Secrets Manager Integration
//!
//! Fetches the GitHub App private key at runtime. No hardcoded credentials:
//! authentication comes from the CodeBuild service role via the default
//! AWS credential chain.

use anyhow::{bail, Context, Result};
use aws_config::{BehaviorVersion, Region};
use tracing::{debug, info};

/// Fetch a secret's payload bytes from Secrets Manager.
///
/// Prefers the binary payload; falls back to the string payload, since PEM
/// keys are stored either way.
pub async fn fetch_private_key(region: &str, secret_id: &str) -> Result<Vec<u8>> {
    debug!("Fetching secret {} from Secrets Manager ({})", secret_id, region);

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .load()
        .await;
    let client = aws_sdk_secretsmanager::Client::new(&aws_config);

    let response = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .with_context(|| format!("failed to fetch secret {}", secret_id))?;

    if let Some(blob) = response.secret_binary() {
        let bytes = blob.as_ref().to_vec();
        info!("Secret retrieved successfully (length: {} bytes)", bytes.len());
        return Ok(bytes);
    }
    if let Some(text) = response.secret_string() {
        let bytes = text.as_bytes().to_vec();
        info!("Secret retrieved successfully (length: {} bytes)", bytes.len());
        return Ok(bytes);
    }

    bail!("secret {} has no binary or string payload", secret_id)
}
