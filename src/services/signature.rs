// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Svix webhook signature verification.
//!
//! Clerk delivers webhooks through Svix. Each delivery is signed with
//! HMAC-SHA256 over `"{svix-id}.{svix-timestamp}.{raw body}"` and the
//! `svix-signature` header carries one or more space-separated `v1,<base64>`
//! entries (several during secret rotation). The MAC must be computed over
//! the exact bytes received: re-serializing the JSON can reorder keys or
//! change whitespace and break the signature.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// The three signing headers of one delivery.
#[derive(Debug, Clone, Copy)]
pub struct SigningHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

/// Signature verification errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signing secret is not valid base64")]
    InvalidSecret,

    #[error("invalid svix-timestamp header")]
    InvalidTimestamp,

    #[error("message timestamp too old")]
    TimestampTooOld,

    #[error("message timestamp too new")]
    TimestampTooNew,

    #[error("no matching signature found")]
    NoMatchingSignature,
}

/// Verifies Svix-signed webhook deliveries with one signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_`-prefixed (or bare) base64 secret.
    pub fn new(secret: &str, tolerance_secs: u64) -> Result<Self, SignatureError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = BASE64
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;
        if key.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }

        Ok(Self {
            key,
            tolerance_secs: i64::try_from(tolerance_secs).unwrap_or(i64::MAX),
        })
    }

    /// Verify a delivery against the current time.
    pub fn verify(&self, headers: &SigningHeaders<'_>, body: &[u8]) -> Result<(), SignatureError> {
        self.verify_at(headers, body, crate::time_utils::unix_now())
    }

    /// Verify a delivery as if the current Unix time were `now`.
    pub fn verify_at(
        &self,
        headers: &SigningHeaders<'_>,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;

        if now.saturating_sub(timestamp) > self.tolerance_secs {
            return Err(SignatureError::TimestampTooOld);
        }
        if timestamp.saturating_sub(now) > self.tolerance_secs {
            return Err(SignatureError::TimestampTooNew);
        }

        let expected = self.mac(headers.id, headers.timestamp.trim(), body)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| BASE64.decode(sig).ok())
            .any(|candidate| bool::from(candidate.as_slice().ct_eq(expected.as_slice())));

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }

    /// Produce the `v1,<base64>` signature for a payload.
    pub fn sign(&self, msg_id: &str, timestamp: i64, body: &[u8]) -> Result<String, SignatureError> {
        let mac = self.mac(msg_id, &timestamp.to_string(), body)?;
        Ok(format!("{},{}", SIGNATURE_VERSION, BASE64.encode(mac)))
    }

    fn mac(&self, msg_id: &str, timestamp: &str, body: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
