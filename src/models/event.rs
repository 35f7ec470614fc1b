// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clerk webhook event payloads.
//!
//! The wire envelope is decoded once and turned into a [`WebhookEvent`] that
//! carries only the normalized fields each sync action needs.

use crate::models::user::{NewUser, UserUpdate};
use serde::Deserialize;

pub const USER_CREATED: &str = "user.created";
pub const USER_UPDATED: &str = "user.updated";
pub const USER_DELETED: &str = "user.deleted";

/// Raw Clerk event envelope: `{ "type": ..., "data": {...} }`.
///
/// `data` stays untyped until the event type is known, since its shape
/// differs between event types.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

/// The one field every event's `data` is read for.
#[derive(Deserialize)]
struct EventSubject {
    #[serde(default)]
    id: Option<String>,
}

/// Profile fields of a Clerk user object. Clerk sends `null` for unset fields.
#[derive(Debug, Default, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub email_addresses: Option<Vec<EmailAddress>>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

/// A verified event, normalized for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    UserCreated(NewUser),
    UserUpdated { clerk_id: String, update: UserUpdate },
    UserDeleted { clerk_id: String },
    /// Any other event type; acknowledged and ignored.
    Unhandled { event_type: String, subject_id: String },
}

/// Why a verified payload could not become a [`WebhookEvent`].
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("malformed event envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("event data has no id")]
    MissingId,
}

impl WebhookEvent {
    /// Decode a parsed JSON body.
    pub fn from_json(value: serde_json::Value) -> Result<Self, EventError> {
        let envelope: EventEnvelope = serde_json::from_value(value)?;
        Self::try_from(envelope)
    }

    /// Clerk event type string, e.g. `user.created`.
    pub fn event_type(&self) -> &str {
        match self {
            WebhookEvent::UserCreated(_) => USER_CREATED,
            WebhookEvent::UserUpdated { .. } => USER_UPDATED,
            WebhookEvent::UserDeleted { .. } => USER_DELETED,
            WebhookEvent::Unhandled { event_type, .. } => event_type.as_str(),
        }
    }

    /// The `data.id` of the event (a Clerk user ID for user events).
    pub fn subject_id(&self) -> &str {
        match self {
            WebhookEvent::UserCreated(user) => user.clerk_id.as_str(),
            WebhookEvent::UserUpdated { clerk_id, .. } | WebhookEvent::UserDeleted { clerk_id } => {
                clerk_id.as_str()
            }
            WebhookEvent::Unhandled { subject_id, .. } => subject_id.as_str(),
        }
    }
}

impl TryFrom<EventEnvelope> for WebhookEvent {
    type Error = EventError;

    fn try_from(envelope: EventEnvelope) -> Result<Self, Self::Error> {
        let EventEnvelope { event_type, data } = envelope;

        let subject = EventSubject::deserialize(&data)?;
        let id = match subject.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(EventError::MissingId),
        };

        let event = match event_type.as_str() {
            USER_CREATED => {
                let user = UserData::deserialize(&data)?;
                WebhookEvent::UserCreated(NewUser {
                    clerk_id: id,
                    // First address wins; an account without one still syncs.
                    email: user
                        .email_addresses
                        .and_then(|list| list.into_iter().next())
                        .map(|e| e.email_address)
                        .unwrap_or_default(),
                    username: user.username.unwrap_or_default(),
                    first_name: user.first_name.unwrap_or_default(),
                    last_name: user.last_name.unwrap_or_default(),
                    photo: user.image_url.unwrap_or_default(),
                })
            }
            USER_UPDATED => {
                let user = UserData::deserialize(&data)?;
                WebhookEvent::UserUpdated {
                    clerk_id: id,
                    update: UserUpdate {
                        username: user.username.unwrap_or_default(),
                        first_name: user.first_name.unwrap_or_default(),
                        last_name: user.last_name.unwrap_or_default(),
                        photo: user.image_url.unwrap_or_default(),
                    },
                }
            }
            USER_DELETED => WebhookEvent::UserDeleted { clerk_id: id },
            _ => WebhookEvent::Unhandled {
                event_type,
                subject_id: id,
            },
        };

        Ok(event)
    }
}
