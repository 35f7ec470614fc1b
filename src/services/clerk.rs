// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clerk backend API client.
//!
//! Only the metadata endpoint is used: after a user is created locally its
//! internal ID is written to the Clerk user's public metadata so the frontend
//! can read it from the session.

use crate::error::{AppError, Result};

/// Clerk backend API client.
#[derive(Clone)]
pub struct ClerkClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl ClerkClient {
    /// Create a new client for the given API base URL and secret key.
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Merge `public_metadata` into a user's public metadata.
    ///
    /// PATCH {base_url}/users/{user_id}/metadata
    pub async fn update_public_metadata(
        &self,
        user_id: &str,
        public_metadata: serde_json::Value,
    ) -> Result<()> {
        let url = format!(
            "{}/users/{}/metadata",
            self.base_url,
            urlencoding::encode(user_id)
        );

        let body = serde_json::json!({
            "public_metadata": public_metadata
        });

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Clerk(e.to_string()))?;

        self.check_response(response).await
    }

    /// Record the internal user ID on the Clerk user (`publicMetadata.userId`).
    pub async fn set_internal_user_id(&self, clerk_id: &str, user_id: &str) -> Result<()> {
        self.update_public_metadata(clerk_id, serde_json::json!({ "userId": user_id }))
            .await?;
        tracing::info!(clerk_id, user_id, "Clerk public metadata updated");
        Ok(())
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Clerk rate limit hit (429)");
        }

        Err(AppError::Clerk(format!("HTTP {}: {}", status, body)))
    }
}
