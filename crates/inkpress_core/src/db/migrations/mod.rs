//! Batch-tracked migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in a fixed, declared order.
//! - Apply pending migrations as one batch; revert the latest batch.
//!
//! # Invariants
//! - Declaration order is the dependency order, for both directions.
//! - A migration is pending while no `MigrationRecord` carries its name.
//! - Every `migrate` run records its migrations under one new batch number.
//! - `rollback` only touches the highest batch present.
//! - The first failing step halts the run; nothing after it executes.
//! - A migration's record is written before its `up` step runs, so a failed
//!   `up` leaves its record behind.

use crate::db::document::{Document, DocumentStore, IndexSpec};
use crate::db::filter::{Filter, FindOptions};
use crate::db::{Deadline, Store, StoreError, StoreResult};
use crate::model::migration::MigrationRecord;
use log::{error, info, warn};
use std::time::Instant;

mod steps;

pub use steps::{CollectionMigration, MIGRATIONS};

/// One named, reversible schema step.
pub trait Migration {
    fn name(&self) -> &'static str;
    fn up(&self, store: &DocumentStore<'_>) -> StoreResult<()>;
    fn down(&self, store: &DocumentStore<'_>) -> StoreResult<()>;
}

/// Returns the migrations known by this binary, in declared order.
pub fn registered_migrations() -> Vec<Box<dyn Migration>> {
    MIGRATIONS
        .iter()
        .map(|migration| Box::new(*migration) as Box<dyn Migration>)
        .collect()
}

/// Outcome of one `migrate` or `rollback` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Batch applied or reverted; `None` when the run was a no-op.
    pub batch: Option<i64>,
    /// Migration names in the order they were processed.
    pub names: Vec<&'static str>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.names.is_empty()
    }
}

/// Applied/pending state of one declared migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: &'static str,
    /// Batch that applied it, `None` while pending.
    pub batch: Option<i64>,
}

/// Applies and reverts migrations against one store.
pub struct Migrator<'store> {
    store: &'store Store,
    migrations: Vec<Box<dyn Migration>>,
}

impl<'store> Migrator<'store> {
    /// Migrator over `registered_migrations()`.
    pub fn new(store: &'store Store) -> Self {
        Self::with_migrations(store, registered_migrations())
    }

    /// Migrator over a caller-supplied, already ordered list.
    pub fn with_migrations(store: &'store Store, migrations: Vec<Box<dyn Migration>>) -> Self {
        Self { store, migrations }
    }

    /// Applies every pending migration under one new batch.
    ///
    /// # Errors
    /// - `StoreError::MigrationFailed` naming the first failing step.
    pub fn migrate(&self, deadline: &Deadline) -> StoreResult<MigrationReport> {
        let started_at = Instant::now();
        let docs = self.store.documents(deadline);
        info!("event=migrate module=migrations status=start");

        docs.create_collection(MigrationRecord::COLLECTION)?;
        let records = match load_records(&docs) {
            Ok(records) => records,
            Err(err) if err.is_interruption() => return Err(err),
            Err(err) => {
                warn!(
                    "event=migrate module=migrations status=degraded error_code=records_unreadable error={}",
                    err
                );
                Vec::new()
            }
        };
        let batch = records.iter().map(|record| record.batch).max().unwrap_or(0) + 1;

        let mut report = MigrationReport::default();
        for migration in &self.migrations {
            let name = migration.name();
            if records.iter().any(|record| record.name == name) {
                continue;
            }

            docs.save(&MigrationRecord::new(batch, name))
                .map_err(|err| step_failed(name, err))?;
            migration
                .up(&docs)
                .map_err(|err| step_failed(name, err))?;

            info!("event=migration_up module=migrations status=ok name={name} batch={batch}");
            report.batch = Some(batch);
            report.names.push(name);
        }

        info!(
            "event=migrate module=migrations status=ok applied={} duration_ms={}",
            report.names.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Reverts every migration recorded under the highest batch.
    ///
    /// # Errors
    /// - `StoreError::MigrationFailed` naming the first failing step.
    pub fn rollback(&self, deadline: &Deadline) -> StoreResult<MigrationReport> {
        let started_at = Instant::now();
        let docs = self.store.documents(deadline);
        info!("event=rollback module=migrations status=start");

        if !docs.collection_exists(MigrationRecord::COLLECTION)? {
            info!("event=rollback module=migrations status=noop reason=no_records");
            return Ok(MigrationReport::default());
        }
        let records = load_records(&docs)?;
        let Some(latest) = records.iter().map(|record| record.batch).max() else {
            info!("event=rollback module=migrations status=noop reason=no_records");
            return Ok(MigrationReport::default());
        };

        let mut report = MigrationReport {
            batch: Some(latest),
            names: Vec::new(),
        };
        for migration in &self.migrations {
            let name = migration.name();
            let Some(record) = records
                .iter()
                .find(|record| record.name == name && record.batch == latest)
            else {
                continue;
            };

            migration
                .down(&docs)
                .map_err(|err| step_failed(name, err))?;
            docs.delete(record).map_err(|err| step_failed(name, err))?;

            info!("event=migration_down module=migrations status=ok name={name} batch={latest}");
            report.names.push(name);
        }

        info!(
            "event=rollback module=migrations status=ok reverted={} duration_ms={}",
            report.names.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Reports each declared migration with the batch that applied it.
    pub fn status(&self, deadline: &Deadline) -> StoreResult<Vec<MigrationStatus>> {
        let docs = self.store.documents(deadline);
        let records = if docs.collection_exists(MigrationRecord::COLLECTION)? {
            load_records(&docs)?
        } else {
            Vec::new()
        };

        Ok(self
            .migrations
            .iter()
            .map(|migration| MigrationStatus {
                name: migration.name(),
                batch: records
                    .iter()
                    .find(|record| record.name == migration.name())
                    .map(|record| record.batch),
            })
            .collect())
    }
}

fn load_records(docs: &DocumentStore<'_>) -> StoreResult<Vec<MigrationRecord>> {
    docs.read_many::<MigrationRecord>(&Filter::All, &FindOptions::new())
}

fn step_failed(name: &'static str, err: StoreError) -> StoreError {
    error!("event=migration_step module=migrations status=error name={name} error={err}");
    StoreError::MigrationFailed {
        name,
        source: Box::new(err),
    }
}

/// Index helper kept next to the registry for readability of `steps`.
pub(crate) const fn index(
    name: &'static str,
    collection: &'static str,
    fields: &'static [&'static str],
    unique: bool,
    active_only: bool,
) -> IndexSpec {
    IndexSpec {
        name,
        collection,
        fields,
        unique,
        active_only,
    }
}
