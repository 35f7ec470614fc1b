// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the service layer and the webhook HTTP edge.

use crate::db::ConnectError;
use crate::models::EventError;
use crate::services::signature::SignatureError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Service-layer error returned by the user store and the Clerk client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Clerk API error: {0}")]
    Clerk(String),
}

/// Result type alias for the service layer
pub type Result<T> = std::result::Result<T, AppError>;

/// Terminal outcome of a webhook request that did not succeed.
///
/// Client input problems map to 400 so the sender does not keep retrying a
/// request that can never succeed; dependency failures map to 500 so it does.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("missing svix signing headers")]
    MissingHeaders,

    #[error("request body is not valid JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("webhook signature verification failed: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("webhook payload does not match the event envelope: {0}")]
    InvalidEvent(#[source] serde_json::Error),

    #[error("missing user ID in webhook data")]
    MissingUserId,

    #[error("database unavailable: {0}")]
    DatabaseUnavailable(#[from] ConnectError),

    #[error("failed to create user: {0}")]
    CreateUser(#[source] AppError),

    #[error("failed to update user: {0}")]
    UpdateUser(#[source] AppError),

    #[error("failed to delete user: {0}")]
    DeleteUser(#[source] AppError),

    /// The local record exists; only the Clerk metadata push failed.
    #[error("user {user_id} was created but Clerk metadata sync failed: {source}")]
    MetadataSync {
        user_id: String,
        #[source]
        source: AppError,
    },
}

impl WebhookError {
    /// HTTP status for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::MissingHeaders
            | WebhookError::InvalidBody(_)
            | WebhookError::InvalidSignature(_)
            | WebhookError::InvalidEvent(_)
            | WebhookError::MissingUserId => StatusCode::BAD_REQUEST,
            WebhookError::DatabaseUnavailable(_)
            | WebhookError::CreateUser(_)
            | WebhookError::UpdateUser(_)
            | WebhookError::DeleteUser(_)
            | WebhookError::MetadataSync { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text response body. Details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            WebhookError::MissingHeaders => "Error occurred -- no svix headers",
            WebhookError::InvalidBody(_) => "Error parsing request body",
            WebhookError::InvalidSignature(_) => "Error occurred -- invalid signature",
            WebhookError::InvalidEvent(_) => "Error occurred -- malformed event",
            WebhookError::MissingUserId => "Missing user ID in webhook data",
            WebhookError::DatabaseUnavailable(_) => "Error occurred while connecting to database",
            WebhookError::CreateUser(_) => "Error occurred while creating user",
            WebhookError::UpdateUser(_) => "Error occurred while updating user",
            WebhookError::DeleteUser(_) => "Error occurred while deleting user",
            WebhookError::MetadataSync { .. } => {
                "User created but updating Clerk user metadata failed"
            }
        }
    }
}

impl From<EventError> for WebhookError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Malformed(e) => WebhookError::InvalidEvent(e),
            EventError::MissingId => WebhookError::MissingUserId,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
