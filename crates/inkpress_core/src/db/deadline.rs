//! Cancellable deadlines for store calls.
//!
//! # Responsibility
//! - Carry an optional expiry instant and an optional cancellation token.
//! - Interrupt in-flight SQLite statements once the deadline is gone.
//!
//! # Invariants
//! - Expiry surfaces as `StoreError::Timeout`, cancellation as
//!   `StoreError::Cancelled`; cancellation wins when both apply.
//! - An unbounded deadline never installs a progress handler.

use super::{StoreError, StoreResult};
use rusqlite::Connection;
use std::ffi::c_int;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// VM instructions between two deadline checks inside one statement.
const PROGRESS_CHECK_INTERVAL_OPS: c_int = 1_000;

/// Shared flag used by a caller to abandon a request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Deadline accepted by every core entry point.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl Deadline {
    /// Deadline that never expires and cannot be cancelled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Deadline expiring `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
            cancel: None,
        }
    }

    /// Deadline expiring at `instant`.
    pub fn at(instant: Instant) -> Self {
        Self {
            expires_at: Some(instant),
            cancel: None,
        }
    }

    /// Attaches a cancellation token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.expires_at.is_some() || self.cancel.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Returns whether the caller is gone, by expiry or cancellation.
    pub fn is_expired(&self) -> bool {
        self.is_cancelled()
            || self
                .expires_at
                .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    /// Time left before expiry, `None` when unbounded in time.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
    }

    /// Fails fast when the deadline is already gone.
    pub fn check(&self) -> StoreResult<()> {
        if self.is_expired() {
            return Err(self.interruption_error());
        }
        Ok(())
    }

    pub(crate) fn interruption_error(&self) -> StoreError {
        if self.is_cancelled() {
            StoreError::Cancelled
        } else {
            StoreError::Timeout
        }
    }
}

/// Installs a progress handler interrupting statements on `conn` while alive.
pub(crate) struct InterruptGuard<'conn> {
    conn: &'conn Connection,
    installed: bool,
}

impl<'conn> InterruptGuard<'conn> {
    pub(crate) fn install(conn: &'conn Connection, deadline: &Deadline) -> Self {
        if !deadline.is_bounded() {
            return Self {
                conn,
                installed: false,
            };
        }

        let watched = deadline.clone();
        conn.progress_handler(
            PROGRESS_CHECK_INTERVAL_OPS,
            Some(move || watched.is_expired()),
        );
        Self {
            conn,
            installed: true,
        }
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        if self.installed {
            self.conn.progress_handler(0, None::<fn() -> bool>);
        }
    }
}
