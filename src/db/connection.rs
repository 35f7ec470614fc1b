// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lazily established, process-wide database connection.
//!
//! The first caller starts the connection attempt and parks it in the slot as
//! a [`Shared`] future before awaiting it, so callers that arrive while the
//! attempt is in flight await the same attempt instead of opening their own.
//! A successful handle is kept for the life of the process. A failed attempt
//! is dropped from the slot and the next caller starts a fresh one.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Connection failure shared by every caller awaiting the same attempt.
#[derive(Debug, Clone, thiserror::Error)]
#[error("database connection failed: {0}")]
pub struct ConnectError(pub String);

type PendingConnect<T> = Shared<BoxFuture<'static, Result<T, ConnectError>>>;
type Connector<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, ConnectError>> + Send + Sync>;

enum Slot<T> {
    Empty,
    Connecting(PendingConnect<T>),
    Ready(T),
}

/// Single-flight cache around one connection handle.
pub struct ConnectionCache<T> {
    slot: Mutex<Slot<T>>,
    connect: Connector<T>,
}

impl<T> ConnectionCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty cache. `connect` is invoked at most once per attempt.
    pub fn new<F, Fut>(connect: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ConnectError>> + Send + 'static,
    {
        Self {
            slot: Mutex::new(Slot::Empty),
            connect: Box::new(move || connect().boxed()),
        }
    }

    /// Return the cached handle, connecting first if needed.
    pub async fn acquire(&self) -> Result<T, ConnectError> {
        let pending = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Ready(handle) => return Ok(handle.clone()),
                Slot::Connecting(pending) => pending.clone(),
                Slot::Empty => {
                    tracing::info!("Opening database connection");
                    let pending = (self.connect)().shared();
                    *slot = Slot::Connecting(pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut slot = self.lock();
        // Only the attempt we awaited may be resolved here; a newer attempt
        // started after a failure must be left alone.
        let owns_slot = matches!(&*slot, Slot::Connecting(current) if current.ptr_eq(&pending));
        if owns_slot {
            match &result {
                Ok(handle) => {
                    tracing::info!("Database connection established");
                    *slot = Slot::Ready(handle.clone());
                }
                Err(err) => {
                    tracing::error!(error = %err, "Database connection attempt failed");
                    *slot = Slot::Empty;
                }
            }
        }

        result
    }

    /// Whether a connected handle is cached.
    pub fn is_ready(&self) -> bool {
        matches!(&*self.lock(), Slot::Ready(_))
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // The slot is never left half-written, so a poisoned lock is still usable.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
