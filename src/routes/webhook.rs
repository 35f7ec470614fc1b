// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for Clerk user lifecycle events.
//!
//! Each request runs a short pipeline: signing headers, JSON body, signature,
//! typed event, then dispatch to the user store. The first failing step ends
//! the request with its [`WebhookError`].

use crate::error::WebhookError;
use crate::models::{User, WebhookEvent};
use crate::services::signature::{
    SigningHeaders, WebhookVerifier, HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP,
};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/webhooks/clerk", post(handle_event))
}

/// Body returned for handled user events.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct WebhookResponse {
    pub message: String,
    pub user: User,
}

/// Handle a Clerk webhook delivery (POST).
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let event = verify_event(&state.verifier, &headers, &body).map_err(|e| {
        tracing::warn!(
            svix_id = header_str(&headers, HEADER_ID).unwrap_or_default(),
            error = %e,
            "Rejected webhook delivery"
        );
        e
    })?;

    let event_type = event.event_type().to_string();
    let subject_id = event.subject_id().to_string();

    tracing::info!(
        event_type = %event_type,
        user_id = %subject_id,
        "Webhook event verified"
    );

    match dispatch(&state, event).await {
        Ok(Some(user)) => Ok(Json(WebhookResponse {
            message: "OK".to_string(),
            user,
        })
        .into_response()),
        Ok(None) => Ok(StatusCode::OK.into_response()),
        Err(e) => {
            tracing::error!(
                event_type = %event_type,
                user_id = %subject_id,
                error = %e,
                "Webhook event processing failed"
            );
            Err(e)
        }
    }
}

/// Validate headers and body, check the signature, and decode the event.
///
/// The body must be valid JSON before the signature is checked, but the MAC is
/// always computed over the raw bytes rather than the parsed value.
fn verify_event(
    verifier: &WebhookVerifier,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<WebhookEvent, WebhookError> {
    let signing = signing_headers(headers)?;

    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(WebhookError::InvalidBody)?;

    verifier.verify(&signing, body)?;

    Ok(WebhookEvent::from_json(value)?)
}

/// Extract the three Svix headers; any missing or empty one is an error.
fn signing_headers(headers: &HeaderMap) -> Result<SigningHeaders<'_>, WebhookError> {
    match (
        header_str(headers, HEADER_ID),
        header_str(headers, HEADER_TIMESTAMP),
        header_str(headers, HEADER_SIGNATURE),
    ) {
        (Some(id), Some(timestamp), Some(signature)) => Ok(SigningHeaders {
            id,
            timestamp,
            signature,
        }),
        _ => Err(WebhookError::MissingHeaders),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Run the sync action for a verified event.
///
/// Returns the affected record, or `None` for event types we do not handle.
async fn dispatch(state: &AppState, event: WebhookEvent) -> Result<Option<User>, WebhookError> {
    match event {
        WebhookEvent::UserCreated(new_user) => {
            let store = state.users.acquire().await?;
            let clerk_id = new_user.clerk_id.clone();

            let user = store
                .create_user(new_user)
                .await
                .map_err(WebhookError::CreateUser)?;

            // The record is already persisted; a failure here must be reported
            // as such so Clerk's retry is not mistaken for a fresh create.
            state
                .clerk
                .set_internal_user_id(&clerk_id, &user.id)
                .await
                .map_err(|source| WebhookError::MetadataSync {
                    user_id: user.id.clone(),
                    source,
                })?;

            Ok(Some(user))
        }
        WebhookEvent::UserUpdated { clerk_id, update } => {
            let store = state.users.acquire().await?;
            let user = store
                .update_user(&clerk_id, update)
                .await
                .map_err(WebhookError::UpdateUser)?;
            Ok(Some(user))
        }
        WebhookEvent::UserDeleted { clerk_id } => {
            let store = state.users.acquire().await?;
            let user = store
                .delete_user(&clerk_id)
                .await
                .map_err(WebhookError::DeleteUser)?;
            Ok(Some(user))
        }
        WebhookEvent::Unhandled {
            event_type,
            subject_id,
        } => {
            tracing::info!(
                event_type = %event_type,
                id = %subject_id,
                "Ignoring unhandled webhook event type"
            );
            Ok(None)
        }
    }
}
