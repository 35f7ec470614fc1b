// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod user;

pub use event::{EventError, WebhookEvent};
pub use user::{NewUser, User, UserUpdate};
