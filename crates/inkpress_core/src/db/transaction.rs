//! Multi-collection unit-of-work coordinator.
//!
//! # Responsibility
//! - Run a unit of work inside one `BEGIN IMMEDIATE` transaction.
//! - Commit on success, abandon on error, expired deadline or failed commit.
//!
//! # Invariants
//! - No partial writes of a failed unit of work become visible.
//! - Non-transactional execution happens only under
//!   `FallbackPolicy::AllowNonTransactional`, and is always logged.
//! - Lock contention on begin is `StoreError::Busy` and never falls back.
//! - Unit-of-work errors are returned unchanged.
//! - A unit of work started inside an open transaction joins it.

use super::document::DocumentStore;
use super::{is_contention, Deadline, StoreError};
use log::{debug, error, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// What to do when the store refuses to open a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Fail with `StoreError::TransactionUnavailable`.
    #[default]
    Required,
    /// Run the unit of work without atomicity.
    AllowNonTransactional,
}

/// Runs units of work atomically against one connection.
pub struct TransactionCoordinator<'conn> {
    conn: &'conn Connection,
    fallback: FallbackPolicy,
}

impl<'conn> TransactionCoordinator<'conn> {
    pub fn new(conn: &'conn Connection, fallback: FallbackPolicy) -> Self {
        Self { conn, fallback }
    }

    /// Executes `work` with a transaction-bound document handle.
    ///
    /// # Errors
    /// - Errors returned by `work`, unchanged.
    /// - `StoreError::Timeout`/`Cancelled` when the deadline is gone before
    ///   begin or before commit; the transaction is rolled back.
    /// - `StoreError::Busy` when another worker holds the write lock past the
    ///   busy timeout.
    /// - `StoreError::TransactionUnavailable` when begin fails otherwise and
    ///   fallback is not allowed.
    /// - `StoreError::TransactionAborted` when commit fails.
    pub fn execute<T, E, F>(&self, deadline: &Deadline, work: F) -> Result<T, E>
    where
        F: FnOnce(&DocumentStore<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        deadline.check()?;

        if !self.conn.is_autocommit() {
            debug!("event=tx_join module=db status=ok");
            let store = DocumentStore::new(self.conn, deadline.clone());
            return work(&store);
        }

        let started_at = Instant::now();
        let tx = match Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate) {
            Ok(tx) => tx,
            Err(err) if is_contention(&err) => {
                warn!("event=tx_begin module=db status=error error_code=busy error={err}");
                return Err(StoreError::Busy(err).into());
            }
            Err(err) => return self.run_without_transaction(deadline, err, work),
        };

        let outcome = {
            let store = DocumentStore::new(&tx, deadline.clone());
            work(&store)
        };

        let value = match outcome {
            Ok(value) => value,
            Err(err) => {
                // Dropping rolls back unless SQLite already aborted the transaction.
                drop(tx);
                debug!(
                    "event=tx_execute module=db status=rolled_back duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Err(err);
            }
        };

        if let Err(err) = deadline.check() {
            drop(tx);
            warn!(
                "event=tx_execute module=db status=rolled_back duration_ms={} error_code=deadline",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }

        if let Err(err) = tx.commit() {
            error!(
                "event=tx_commit module=db status=error duration_ms={} error_code=commit_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(StoreError::TransactionAborted(err).into());
        }

        debug!(
            "event=tx_execute module=db status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(value)
    }

    fn run_without_transaction<T, E, F>(
        &self,
        deadline: &Deadline,
        begin_error: rusqlite::Error,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&DocumentStore<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        match self.fallback {
            FallbackPolicy::Required => {
                error!(
                    "event=tx_begin module=db status=error error_code=tx_unavailable error={}",
                    begin_error
                );
                Err(StoreError::TransactionUnavailable(begin_error).into())
            }
            FallbackPolicy::AllowNonTransactional => {
                warn!(
                    "event=tx_begin module=db status=fallback error_code=tx_unavailable error={}",
                    begin_error
                );
                let store = DocumentStore::new(self.conn, deadline.clone());
                work(&store)
            }
        }
    }
}
