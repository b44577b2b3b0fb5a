//! GitHub App Authentication
//!
//! Authenticates as a GitHub App: mints a short-lived RS256 JWT from the
//! App's private key, then exchanges it for an installation access token.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("check-reporter/", env!("CARGO_PKG_VERSION"));

/// JWT claims for GitHub App authentication
#[derive(Debug, Serialize)]
pub struct AppClaims {
    /// Issued at time (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issuer (GitHub App ID)
    pub iss: String,
}

impl AppClaims {
    /// Build claims for `app_id` at time `now`: issued 60 seconds in the
    /// past to absorb clock skew, expiring in 10 minutes.
    pub fn new(app_id: &str, now: u64) -> Self {
        Self {
            iat: now.saturating_sub(60),
            exp: now + 600,
            iss: app_id.to_string(),
        }
    }
}

/// Response from the GitHub installation token endpoint
#[derive(Debug, Deserialize)]
struct InstallationToken {
    token: String,
    expires_at: String,
}

/// Generate a JWT for GitHub App authentication.
///
/// # Errors
/// Returns an error if the key is not a valid RSA PEM or the system clock
/// is unreadable.
pub fn generate_jwt(app_id: &str, private_key_pem: &[u8]) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("failed to get current time")?
        .as_secs();

    let claims = AppClaims::new(app_id, now);

    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)
        .context("failed to parse private key as RSA PEM")?;

    encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .context("failed to encode JWT")
}

/// Exchange a JWT for an installation access token using the GitHub REST API.
pub async fn installation_token(jwt: &str, installation_id: u64) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;

    let url = format!(
        "https://api.github.com/app/installations/{}/access_tokens",
        installation_id
    );

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", jwt))
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .send()
        .await
        .context("failed to send request to GitHub API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("GitHub API error ({}): {}", status, body);
    }

    let token_response = response
        .json::<InstallationToken>()
        .await
        .context("failed to parse installation token response")?;

    debug!("Installation token expires at {}", token_response.expires_at);
    Ok(token_response.token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_window() {
        let claims = AppClaims::new("123456", 1_700_000_000);
        assert_eq!(claims.iat, 1_700_000_000 - 60);
        assert_eq!(claims.exp, 1_700_000_000 + 600);
        assert_eq!(claims.iss, "123456");
    }

    #[test]
    fn test_claims_saturate_near_epoch() {
        let claims = AppClaims::new("123456", 30);
        assert_eq!(claims.iat, 0);
    }

    #[test]
    fn test_generate_jwt_rejects_bad_key() {
        let err = generate_jwt("123456", b"not a pem key").unwrap_err();
        assert!(err.to_string().contains("RSA PEM"));
    }
}
