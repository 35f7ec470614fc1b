// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct User {
    /// Internal user ID (written back to Clerk public metadata as `userId`)
    pub id: String,
    /// Clerk user ID (also used as document ID)
    pub clerk_id: String,
    /// Primary email address (empty if Clerk sent none)
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Profile picture URL
    pub photo: String,
    /// When the user was created (RFC 3339)
    pub created_at: String,
    /// Last profile sync (RFC 3339)
    pub updated_at: String,
}

/// Fields for a new user, normalized from a `user.created` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub clerk_id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub photo: String,
}

/// Profile fields replaced by a `user.updated` event.
///
/// Every field is written, so a value Clerk no longer sends becomes empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub photo: String,
}

impl User {
    /// Build a fresh record with a newly assigned internal ID.
    pub fn from_new(new_user: NewUser, now: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            clerk_id: new_user.clerk_id,
            email: new_user.email,
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            photo: new_user.photo,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Apply an update in place.
    pub fn apply(&mut self, update: UserUpdate, now: &str) {
        self.username = update.username;
        self.first_name = update.first_name;
        self.last_name = update.last_name;
        self.photo = update.photo;
        self.updated_at = now.to_string();
    }
}
