//! Category document.

use super::{now_epoch_ms, Lifecycle, Uid};
use crate::db::document::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub uid: Uid,
    /// Unique among non-deleted categories.
    pub slug: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Category {
    /// Creates an active category with a generated identity.
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            uid: Uuid::new_v4(),
            slug: slug.into(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";

    fn uid(&self) -> Uid {
        self.uid
    }
}

impl Lifecycle for Category {
    fn deleted_at(&self) -> Option<i64> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, value: Option<i64>) {
        self.deleted_at = value;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}
