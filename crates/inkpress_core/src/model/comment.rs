//! Comment document with two-level threading.
//!
//! # Invariants
//! - `parent_comment_uid == None` marks a top-level comment; replies point at a
//!   top-level comment and never at another reply.
//! - Replies carry the same `post_uid`/`post_slug`/`post_author_uid` as their
//!   parent.
//! - `reply_count` counts active replies.

use super::post::Post;
use super::{now_epoch_ms, Lifecycle, Uid};
use crate::db::document::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub uid: Uid,
    pub post_uid: Uid,
    pub post_slug: String,
    pub post_author_uid: Uid,
    pub parent_comment_uid: Option<Uid>,
    pub email: String,
    pub name: String,
    pub content: String,
    pub reply_count: i64,
    pub created_at: i64,
    pub deleted_at: Option<i64>,
}

impl Comment {
    /// Creates a top-level comment on `post`.
    pub fn top_level(
        post: &Post,
        email: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            uid: Uuid::new_v4(),
            post_uid: post.uid,
            post_slug: post.slug.clone(),
            post_author_uid: post.author.uid,
            parent_comment_uid: None,
            email: email.into(),
            name: name.into(),
            content: content.into(),
            reply_count: 0,
            created_at: now_epoch_ms(),
            deleted_at: None,
        }
    }

    /// Creates a reply copying post linkage from `parent`.
    pub fn reply_to(
        parent: &Comment,
        email: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            uid: Uuid::new_v4(),
            post_uid: parent.post_uid,
            post_slug: parent.post_slug.clone(),
            post_author_uid: parent.post_author_uid,
            parent_comment_uid: Some(parent.uid),
            email: email.into(),
            name: name.into(),
            content: content.into(),
            reply_count: 0,
            created_at: now_epoch_ms(),
            deleted_at: None,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.parent_comment_uid.is_some()
    }
}

impl Document for Comment {
    const COLLECTION: &'static str = "comments";

    fn uid(&self) -> Uid {
        self.uid
    }
}

impl Lifecycle for Comment {
    fn deleted_at(&self) -> Option<i64> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, value: Option<i64>) {
        self.deleted_at = value;
    }
}
