//! Notification document addressed to a user.

use super::comment::Comment;
use super::{now_epoch_ms, Uid};
use crate::db::document::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewComment,
    NewReply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub uid: Uid,
    pub recipient_uid: Uid,
    pub kind: NotificationKind,
    pub post_uid: Uid,
    pub comment_uid: Uid,
    pub message: String,
    pub read_at: Option<i64>,
    pub created_at: i64,
}

impl Notification {
    /// Notifies the post author about `comment`.
    pub fn for_comment(comment: &Comment) -> Self {
        let (kind, message) = if comment.is_reply() {
            (
                NotificationKind::NewReply,
                format!("{} replied on `{}`", comment.name, comment.post_slug),
            )
        } else {
            (
                NotificationKind::NewComment,
                format!("{} commented on `{}`", comment.name, comment.post_slug),
            )
        };
        Self {
            uid: Uuid::new_v4(),
            recipient_uid: comment.post_author_uid,
            kind,
            post_uid: comment.post_uid,
            comment_uid: comment.uid,
            message,
            read_at: None,
            created_at: now_epoch_ms(),
        }
    }
}

impl Document for Notification {
    const COLLECTION: &'static str = "notifications";

    fn uid(&self) -> Uid {
        self.uid
    }
}
