// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed user operations.
//!
//! Users live in one collection keyed by Clerk user ID, so the external ID is
//! unique by construction and every lookup is a direct document read.

use crate::db::{collections, UserStore};
use crate::error::AppError;
use crate::models::{NewUser, User, UserUpdate};
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Get a user by Clerk user ID.
    pub async fn get_user(&self, clerk_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(clerk_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_existing_user(&self, clerk_id: &str) -> Result<User, AppError> {
        self.get_user(clerk_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", clerk_id)))
    }

    /// Overwrite an existing user document with `user`.
    ///
    /// The write only applies if the document still exists, so a delete that
    /// lands after the caller read the record is not undone.
    pub async fn replace_user(&self, user: &User) -> Result<User, AppError> {
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(&user.clerk_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| missing_document_error(e, &user.clerk_id))
    }
}

/// Map a failed `Exists(true)` precondition to `NotFound`.
///
/// The backend reports it as either NOT_FOUND or FAILED_PRECONDITION.
fn missing_document_error(err: FirestoreError, clerk_id: &str) -> AppError {
    match err {
        FirestoreError::DataNotFoundError(_) => AppError::NotFound(format!("User {}", clerk_id)),
        FirestoreError::DatabaseError(ref db_err) if db_err.public.code == "FailedPrecondition" => {
            AppError::NotFound(format!("User {}", clerk_id))
        }
        other => AppError::Database(other.to_string()),
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = User::from_new(new_user, &now_rfc3339());

        // Insert (not upsert): a redelivered user.created must not mint a
        // second internal ID for the same Clerk user.
        let created: User = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.clerk_id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => {
                    AppError::Conflict(format!("User {}", user.clerk_id))
                }
                other => AppError::Database(other.to_string()),
            })?;

        tracing::info!(clerk_id = %created.clerk_id, user_id = %created.id, "User created");
        Ok(created)
    }

    async fn update_user(&self, clerk_id: &str, update: UserUpdate) -> Result<User, AppError> {
        let mut user = self.get_existing_user(clerk_id).await?;
        user.apply(update, &now_rfc3339());

        let updated = self.replace_user(&user).await?;

        tracing::info!(clerk_id, user_id = %updated.id, "User updated");
        Ok(updated)
    }

    async fn delete_user(&self, clerk_id: &str) -> Result<User, AppError> {
        let user = self.get_existing_user(clerk_id).await?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(clerk_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(clerk_id, user_id = %user.id, "User deleted");
        Ok(user)
    }
}
