// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC3339 with a `Z` suffix, for record timestamps.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}
