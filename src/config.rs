// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment and read
//! once at startup.

use std::env;

/// Default Clerk backend API base URL.
pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com/v1";

/// Default webhook timestamp tolerance (matches the Svix libraries).
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 5 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Firestore project ID (the database connection target)
    pub firestore_project_id: String,
    /// Clerk backend API base URL
    pub clerk_api_url: String,
    /// Accepted clock skew for webhook timestamps, in seconds
    pub webhook_tolerance_secs: u64,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Svix signing secret for Clerk webhooks (`whsec_...`)
    pub webhook_secret: String,
    /// Clerk backend API secret key
    pub clerk_secret_key: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            firestore_project_id: "test-project".to_string(),
            clerk_api_url: "http://127.0.0.1:9".to_string(),
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            port: 8080,
            // base64("test_webhook_signing_secret")
            webhook_secret: "whsec_dGVzdF93ZWJob29rX3NpZ25pbmdfc2VjcmV0".to_string(),
            clerk_secret_key: "sk_test_clerk".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            firestore_project_id: required("FIRESTORE_PROJECT_ID")?,
            clerk_api_url: env::var("CLERK_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_CLERK_API_URL.to_string()),
            webhook_tolerance_secs: match env::var("WEBHOOK_TOLERANCE_SECS") {
                Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "WEBHOOK_TOLERANCE_SECS",
                    reason: format!("expected a number of seconds, got {:?}", v),
                })?,
                Err(_) => DEFAULT_WEBHOOK_TOLERANCE_SECS,
            },
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            webhook_secret: required("WEBHOOK_SECRET")?,
            clerk_secret_key: required("CLERK_SECRET_KEY")?,
        })
    }
}

/// Read a required variable; blank values count as missing.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
