//! Migration bookkeeping document.

use super::{now_epoch_ms, Uid};
use crate::db::document::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One applied migration; `batch` groups the records of one migrate run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub uid: Uid,
    pub batch: i64,
    pub name: String,
    pub migrated_at: i64,
}

impl MigrationRecord {
    pub fn new(batch: i64, name: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            batch,
            name: name.into(),
            migrated_at: now_epoch_ms(),
        }
    }
}

impl Document for MigrationRecord {
    const COLLECTION: &'static str = "migrations";

    fn uid(&self) -> Uid {
        self.uid
    }
}
