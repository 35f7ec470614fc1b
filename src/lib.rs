// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Imaginify API: keeps the user database in step with Clerk.
//!
//! This crate provides the backend that receives Clerk user lifecycle
//! webhooks, mirrors the users into Firestore, and writes the internal user
//! ID back to Clerk.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserStoreCache;
use services::{ClerkClient, WebhookVerifier};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Lazily connected user store, shared by all requests
    pub users: UserStoreCache,
    pub clerk: ClerkClient,
    pub verifier: WebhookVerifier,
}
