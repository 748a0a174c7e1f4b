//! Post split entity: `Post` metadata plus `PostContent` body.

use super::snapshot::{AuthorSnapshot, CategorySnapshot};
use super::{now_epoch_ms, Lifecycle, Publishable, Uid};
use crate::db::document::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub uid: Uid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub categories: Vec<CategorySnapshot>,
    pub tags: Vec<String>,
    pub author: AuthorSnapshot,
    /// Active top-level comments; maintained on every comment transition.
    pub comment_count: i64,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Body of a post; `uid` always equals the owning `Post::uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub uid: Uid,
    pub content: String,
}

impl Post {
    /// Creates an active draft post with no comments.
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
            description: String::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            author,
            comment_count: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Content document paired with this post.
    pub fn content(&self, content: impl Into<String>) -> PostContent {
        PostContent {
            uid: self.uid,
            content: content.into(),
        }
    }

    /// Whether readers may see and comment on this post.
    pub fn is_visible(&self) -> bool {
        self.deleted_at.is_none() && self.published_at.is_some()
    }
}

impl Document for Post {
    const COLLECTION: &'static str = "posts";

    fn uid(&self) -> Uid {
        self.uid
    }
}

impl Document for PostContent {
    const COLLECTION: &'static str = "post_contents";

    fn uid(&self) -> Uid {
        self.uid
    }
}

impl Lifecycle for Post {
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

impl Publishable for Post {
    fn published_at(&self) -> Option<i64> {
        self.published_at
    }

    fn set_published_at(&mut self, value: Option<i64>) {
        self.published_at = value;
    }
}
