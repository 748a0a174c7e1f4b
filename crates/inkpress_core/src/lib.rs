//! Core persistence and lifecycle logic for Inkpress.
//! This crate is the single source of truth for content state invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::migrations::{Migration, MigrationReport, MigrationStatus, Migrator};
pub use db::{
    open_store, open_store_in_memory, CancelToken, Deadline, FallbackPolicy, Filter,
    FindOptions, SortDirection, Store, StoreConfig, StoreError, StoreResult,
};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget};
pub use service::{ErrorClass, ServiceError, ServiceResult, Transition};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
