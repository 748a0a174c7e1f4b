//! Page split entity: `Page` metadata plus `PageContent` body.

use super::snapshot::AuthorSnapshot;
use super::{now_epoch_ms, Lifecycle, Publishable, Uid};
use crate::db::document::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub uid: Uid,
    pub slug: String,
    pub title: String,
    pub author: AuthorSnapshot,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Body of a page; `uid` always equals the owning `Page::uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub uid: Uid,
    pub content: String,
}

impl Page {
    /// Creates an active draft page with a generated identity.
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        author: AuthorSnapshot,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            uid: Uuid::new_v4(),
            slug: slug.into(),
            title: title.into(),
            author,
            published_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Content document paired with this page.
    pub fn content(&self, content: impl Into<String>) -> PageContent {
        PageContent {
            uid: self.uid,
            content: content.into(),
        }
    }
}

impl Document for Page {
    const COLLECTION: &'static str = "pages";

    fn uid(&self) -> Uid {
        self.uid
    }
}

impl Document for PageContent {
    const COLLECTION: &'static str = "page_contents";

    fn uid(&self) -> Uid {
        self.uid
    }
}

impl Lifecycle for Page {
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

impl Publishable for Page {
    fn published_at(&self) -> Option<i64> {
        self.published_at
    }

    fn set_published_at(&mut self, value: Option<i64>) {
        self.published_at = value;
    }
}
