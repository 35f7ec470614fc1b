// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod connection;
pub mod firestore;

pub use connection::{ConnectError, ConnectionCache};
pub use firestore::FirestoreDb;

use crate::error::AppError;
use crate::models::{NewUser, User, UserUpdate};
use async_trait::async_trait;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    /// Users keyed by Clerk user ID
    pub const USERS: &str = "users";
}

/// User sync operations invoked by the webhook handler.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user record. Fails if one already exists for the Clerk ID.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Overwrite the profile fields of an existing user.
    async fn update_user(&self, clerk_id: &str, update: UserUpdate) -> Result<User, AppError>;

    /// Delete a user and return the removed record.
    async fn delete_user(&self, clerk_id: &str) -> Result<User, AppError>;
}

/// Connection handle shared by all requests.
pub type UserStoreHandle = Arc<dyn UserStore>;

/// Process-wide lazily connected user store.
pub type UserStoreCache = ConnectionCache<UserStoreHandle>;

/// Build a cache that connects to Firestore on first use.
pub fn firestore_cache(project_id: &str) -> UserStoreCache {
    let project_id = project_id.to_string();
    ConnectionCache::new(move || {
        let project_id = project_id.clone();
        async move {
            let db = FirestoreDb::new(&project_id)
                .await
                .map_err(|e| ConnectError(e.to_string()))?;
            Ok(Arc::new(db) as UserStoreHandle)
        }
    })
}
