//! Document store bootstrap, adapter, transactions and schema migrations.
//!
//! # Responsibility
//! - Open and configure SQLite-backed document stores for Inkpress core.
//! - Expose generic document CRUD over JSON bodies (`document`).
//! - Coordinate multi-collection units of work (`transaction`).
//! - Apply/revert batch-tracked schema migrations (`migrations`).
//!
//! # Invariants
//! - Every collection is a table of `(uid TEXT PRIMARY KEY, body TEXT)` rows.
//! - Core code must not read/write application data before migrations succeed.
//! - Errors surface unchanged; this layer never retries.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod deadline;
pub mod document;
pub mod filter;
pub mod migrations;
mod open;
pub mod transaction;

pub use deadline::{CancelToken, Deadline};
pub use document::{DocumentStore, IndexSpec};
pub use filter::{FieldPath, Filter, FilterValue, FindOptions, SortDirection};
pub use open::{open_store, open_store_in_memory, JournalMode, Store, StoreConfig, StoreLocation};
pub use transaction::{FallbackPolicy, TransactionCoordinator};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Serialization {
        collection: &'static str,
        source: serde_json::Error,
    },
    /// A uniqueness constraint rejected the write.
    Conflict {
        collection: &'static str,
        message: String,
    },
    NotFound {
        collection: &'static str,
        uid: Uuid,
    },
    /// The identity written by the store differs from the client identity.
    Integrity {
        collection: &'static str,
        expected: Uuid,
        actual: String,
    },
    /// Another worker holds the write lock past the busy timeout.
    Busy(rusqlite::Error),
    TransactionUnavailable(rusqlite::Error),
    TransactionAborted(rusqlite::Error),
    Timeout,
    Cancelled,
    InvalidFilter(String),
    MigrationFailed {
        name: &'static str,
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Returns whether the whole operation may be retried by its caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Busy(_) | Self::TransactionAborted(_) => true,
            Self::MigrationFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns whether the error was caused by an expired or cancelled deadline.
    pub fn is_interruption(&self) -> bool {
        match self {
            Self::Timeout | Self::Cancelled => true,
            Self::MigrationFailed { source, .. } => source.is_interruption(),
            _ => false,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Serialization { collection, source } => {
                write!(f, "invalid document in `{collection}`: {source}")
            }
            Self::Conflict {
                collection,
                message,
            } => write!(f, "conflicting write to `{collection}`: {message}"),
            Self::NotFound { collection, uid } => {
                write!(f, "document {uid} not found in `{collection}`")
            }
            Self::Integrity {
                collection,
                expected,
                actual,
            } => write!(
                f,
                "identity mismatch in `{collection}`: wrote {expected}, store returned {actual}"
            ),
            Self::Busy(err) => write!(f, "store is busy: {err}"),
            Self::TransactionUnavailable(err) => write!(f, "cannot start transaction: {err}"),
            Self::TransactionAborted(err) => write!(f, "transaction aborted: {err}"),
            Self::Timeout => write!(f, "deadline exceeded"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::InvalidFilter(message) => write!(f, "invalid filter: {message}"),
            Self::MigrationFailed { name, source } => {
                write!(f, "migration `{name}` failed: {source}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Serialization { source, .. } => Some(source),
            Self::Busy(err) => Some(err),
            Self::TransactionUnavailable(err) => Some(err),
            Self::TransactionAborted(err) => Some(err),
            Self::MigrationFailed { source, .. } => Some(source.as_ref()),
            Self::Conflict { .. }
            | Self::NotFound { .. }
            | Self::Integrity { .. }
            | Self::Timeout
            | Self::Cancelled
            | Self::InvalidFilter(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Maps a raw SQLite failure on `collection` into the store taxonomy.
///
/// Interrupts are resolved against `deadline` so cancellation and expiry stay
/// distinguishable.
pub(crate) fn classify_sqlite(
    err: rusqlite::Error,
    collection: &'static str,
    deadline: &Deadline,
) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == ErrorCode::OperationInterrupted {
            return deadline.interruption_error();
        }
        if failure.code == ErrorCode::ConstraintViolation
            && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        {
            return StoreError::Conflict {
                collection,
                message: message
                    .clone()
                    .unwrap_or_else(|| "unique constraint violated".to_string()),
            };
        }
    }
    if is_contention(&err) {
        return StoreError::Busy(err);
    }
    StoreError::Sqlite(err)
}

/// Returns whether `err` is lock contention rather than a hard failure.
pub(crate) fn is_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
