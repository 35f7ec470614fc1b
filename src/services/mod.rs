// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external integrations.

pub mod clerk;
pub mod signature;

pub use clerk::ClerkClient;
pub use signature::{SignatureError, SigningHeaders, WebhookVerifier};
