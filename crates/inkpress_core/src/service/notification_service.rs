//! Read side of author notifications.

use super::ServiceResult;
use crate::db::{Deadline, Store};
use crate::model::notification::Notification;
use crate::model::{now_epoch_ms, Uid};
use crate::repo::notification_repo::NotificationRepository;

/// Upper bound for one unread listing.
const MAX_UNREAD_LIMIT: u32 = 100;

pub struct NotificationService<'s> {
    store: &'s Store,
}

impl<'s> NotificationService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Newest unread notifications, capped at 100.
    pub fn list_unread(
        &self,
        deadline: &Deadline,
        recipient_uid: Uid,
        limit: u32,
    ) -> ServiceResult<Vec<Notification>> {
        let docs = self.store.documents(deadline);
        Ok(NotificationRepository::new(&docs)
            .list_unread(recipient_uid, limit.clamp(1, MAX_UNREAD_LIMIT))?)
    }

    pub fn count_unread(&self, deadline: &Deadline, recipient_uid: Uid) -> ServiceResult<i64> {
        let docs = self.store.documents(deadline);
        Ok(NotificationRepository::new(&docs).count_unread(recipient_uid)?)
    }

    /// Returns `false` when the notification is missing or already read.
    pub fn mark_read(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<bool> {
        let docs = self.store.documents(deadline);
        Ok(NotificationRepository::new(&docs).mark_read(uid, now_epoch_ms())?)
    }
}
