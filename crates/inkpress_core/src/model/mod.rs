//! Blog domain documents.
//!
//! # Responsibility
//! - Define the persisted shape of every collection.
//! - Expose lifecycle accessors shared by trash/publish transitions.
//!
//! # Invariants
//! - `uid` is assigned at creation and never changes.
//! - `deleted_at` is `None` unless trashed; `published_at` is `None` for drafts.
//! - Split entities (page/post) share one `uid` between metadata and content.
//! - Timestamps are Unix epoch milliseconds.

use crate::db::document::Document;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod category;
pub mod comment;
pub(crate) mod fields;
pub mod migration;
pub mod notification;
pub mod page;
pub mod post;
pub mod snapshot;
pub mod token;
pub mod user;

/// Stable identifier of every document.
pub type Uid = Uuid;

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Soft-delete axis shared by every trashable document.
pub trait Lifecycle: Document + Clone {
    fn deleted_at(&self) -> Option<i64>;
    fn set_deleted_at(&mut self, value: Option<i64>);

    /// Refreshes `updated_at` when the document carries one.
    fn touch(&mut self, _now: i64) {}

    fn is_trashed(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Draft/published axis of pages and posts.
pub trait Publishable: Lifecycle {
    fn published_at(&self) -> Option<i64>;
    fn set_published_at(&mut self, value: Option<i64>);

    fn is_published(&self) -> bool {
        self.published_at().is_some()
    }
}
