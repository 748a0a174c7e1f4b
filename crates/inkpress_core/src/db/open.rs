//! Store bootstrap utilities.
//!
//! # Responsibility
//! - Open file or in-memory SQLite document stores from explicit config.
//! - Configure connection settings required by core behavior.
//! - Optionally apply pending migrations before returning the store.
//!
//! # Invariants
//! - Configuration is passed in by the caller; this module never reads the
//!   process environment.
//! - `open_store_in_memory` returns a fully migrated store.

use super::document::DocumentStore;
use super::migrations::Migrator;
use super::transaction::{FallbackPolicy, TransactionCoordinator};
use super::{Deadline, StoreError, StoreResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Write-ahead log; lets readers proceed while one worker writes.
    Wal,
    /// SQLite rollback journal.
    Delete,
}

impl JournalMode {
    fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
        }
    }
}

/// Explicit store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// How long a worker waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Ignored for in-memory stores.
    pub journal_mode: JournalMode,
    /// Opt-in for running units of work without a transaction.
    pub transaction_fallback: FallbackPolicy,
    pub migrate_on_open: bool,
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            journal_mode: JournalMode::Wal,
            transaction_fallback: FallbackPolicy::Required,
            migrate_on_open: false,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            ..Self::file(PathBuf::new())
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_journal_mode(mut self, journal_mode: JournalMode) -> Self {
        self.journal_mode = journal_mode;
        self
    }

    pub fn with_transaction_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.transaction_fallback = fallback;
        self
    }

    pub fn with_migrate_on_open(mut self, migrate_on_open: bool) -> Self {
        self.migrate_on_open = migrate_on_open;
        self
    }

    fn mode_label(&self) -> &'static str {
        match self.location {
            StoreLocation::File(_) => "file",
            StoreLocation::Memory => "memory",
        }
    }
}

/// One worker's handle to the document store.
pub struct Store {
    conn: Connection,
    config: StoreConfig,
}

impl Store {
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Raw connection access for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Non-transactional document handle bound to `deadline`.
    pub fn documents(&self, deadline: &Deadline) -> DocumentStore<'_> {
        DocumentStore::new(&self.conn, deadline.clone())
    }

    pub fn coordinator(&self) -> TransactionCoordinator<'_> {
        TransactionCoordinator::new(&self.conn, self.config.transaction_fallback)
    }

    /// Runs `work` atomically; see `TransactionCoordinator::execute`.
    pub fn transact<T, E, F>(&self, deadline: &Deadline, work: F) -> Result<T, E>
    where
        F: FnOnce(&DocumentStore<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.coordinator().execute(deadline, work)
    }
}

/// Opens a store described by `config`.
///
/// # Side effects
/// - Applies connection settings; runs migrations when `migrate_on_open`.
/// - Emits `store_open` logging events with duration and status.
pub fn open_store(config: &StoreConfig) -> StoreResult<Store> {
    let started_at = Instant::now();
    let mode = config.mode_label();
    info!("event=store_open module=db status=start mode={mode}");

    let opened = match &config.location {
        StoreLocation::File(path) => Connection::open(path),
        StoreLocation::Memory => Connection::open_in_memory(),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=store_open module=db status=error mode={} duration_ms={} error_code=store_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let store = Store {
        conn,
        config: config.clone(),
    };
    match bootstrap_store(&store) {
        Ok(()) => {
            info!(
                "event=store_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(store)
        }
        Err(err) => {
            error!(
                "event=store_open module=db status=error mode={} duration_ms={} error_code=store_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Opens an in-memory store with all migrations applied.
pub fn open_store_in_memory() -> StoreResult<Store> {
    open_store(&StoreConfig::in_memory().with_migrate_on_open(true))
}

fn bootstrap_store(store: &Store) -> StoreResult<()> {
    store.conn.busy_timeout(store.config.busy_timeout)?;
    if let StoreLocation::File(_) = store.config.location {
        let pragma = format!(
            "PRAGMA journal_mode = {};",
            store.config.journal_mode.pragma_value()
        );
        let _mode: String = store.conn.query_row(&pragma, [], |row| row.get(0))?;
    }
    if store.config.migrate_on_open {
        Migrator::new(store).migrate(&Deadline::none())?;
    }
    Ok(())
}
