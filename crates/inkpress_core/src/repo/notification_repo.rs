//! Notification repository.

use super::Repository;
use crate::db::{Filter, FindOptions, SortDirection, StoreResult};
use crate::model::fields::{CREATED_AT, READ_AT, RECIPIENT_UID};
use crate::model::notification::Notification;
use crate::model::Uid;

pub type NotificationRepository<'a> = Repository<'a, Notification>;

impl Repository<'_, Notification> {
    pub fn push(&self, notification: &Notification) -> StoreResult<()> {
        self.save(notification)
    }

    /// Unread notifications of `recipient_uid`, newest first.
    pub fn list_unread(&self, recipient_uid: Uid, limit: u32) -> StoreResult<Vec<Notification>> {
        self.find_many(
            &unread_filter(recipient_uid),
            &FindOptions::new()
                .sort_by(CREATED_AT, SortDirection::Descending)
                .limit(limit),
        )
    }

    pub fn count_unread(&self, recipient_uid: Uid) -> StoreResult<i64> {
        self.count(&unread_filter(recipient_uid))
    }

    /// Marks one notification read; `false` when missing or already read.
    pub fn mark_read(&self, uid: Uid, now: i64) -> StoreResult<bool> {
        let Some(mut notification) = self.find(uid)? else {
            return Ok(false);
        };
        notification.read_at = Some(now);
        self.update_if(&notification, &Filter::is_null(READ_AT))
    }
}

fn unread_filter(recipient_uid: Uid) -> Filter {
    Filter::eq(RECIPIENT_UID, recipient_uid).and(Filter::is_null(READ_AT))
}
