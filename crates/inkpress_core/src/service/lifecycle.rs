//! Shared publish/trash transitions.
//!
//! # Invariants
//! - A transition is one conditional write guarded on the source state, so a
//!   racing caller observes a no-op instead of overwriting the first timestamp.
//! - A no-op returns the current stored document unchanged.
//! - Only `published_at`/`deleted_at` and `updated_at` are written; counters
//!   bumped by other workers meanwhile survive.

use super::{ServiceError, ServiceResult};
use crate::db::{DocumentStore, FieldPath, Filter};
use crate::model::fields::{DELETED_AT, PUBLISHED_AT, UPDATED_AT};
use crate::model::{now_epoch_ms, Lifecycle, Publishable, Uid};
use crate::repo::Repository;
use log::info;

/// Post-transition snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<D> {
    pub document: D,
    /// `false` when the document already was in the target state.
    pub applied: bool,
}

impl<D> Transition<D> {
    fn applied(document: D) -> Self {
        Self {
            document,
            applied: true,
        }
    }

    fn unchanged(document: D) -> Self {
        Self {
            document,
            applied: false,
        }
    }

    pub fn into_document(self) -> D {
        self.document
    }
}

pub(crate) fn set_published<D: Publishable>(
    docs: &DocumentStore<'_>,
    entity: &'static str,
    uid: Uid,
    publish: bool,
) -> ServiceResult<Transition<D>> {
    let now = now_epoch_ms();
    let guard = if publish {
        Filter::is_null(PUBLISHED_AT)
    } else {
        Filter::not_null(PUBLISHED_AT)
    };
    let event = if publish { "publish" } else { "depublish" };
    apply(docs, entity, event, uid, PUBLISHED_AT, guard, |document: &mut D| {
        if document.is_published() == publish {
            return false;
        }
        document.set_published_at(publish.then_some(now));
        document.touch(now);
        true
    })
}

pub(crate) fn set_trashed<D: Lifecycle>(
    docs: &DocumentStore<'_>,
    entity: &'static str,
    uid: Uid,
    trash: bool,
) -> ServiceResult<Transition<D>> {
    let now = now_epoch_ms();
    let guard = if trash {
        Filter::is_null(DELETED_AT)
    } else {
        Filter::not_null(DELETED_AT)
    };
    let event = if trash { "trash" } else { "detrash" };
    apply(docs, entity, event, uid, DELETED_AT, guard, |document: &mut D| {
        if document.is_trashed() == trash {
            return false;
        }
        document.set_deleted_at(trash.then_some(now));
        document.touch(now);
        true
    })
}

fn apply<D: Lifecycle>(
    docs: &DocumentStore<'_>,
    entity: &'static str,
    event: &'static str,
    uid: Uid,
    axis: FieldPath,
    guard: Filter,
    mutate: impl FnOnce(&mut D) -> bool,
) -> ServiceResult<Transition<D>> {
    let repo = Repository::<D>::new(docs);
    let current = repo
        .find(uid)?
        .ok_or_else(|| ServiceError::not_found(entity, uid))?;

    let mut next = current.clone();
    if !mutate(&mut next) {
        info!("event={event} module=service status=noop entity={entity} uid={uid}");
        return Ok(Transition::unchanged(current));
    }

    let applied = docs.update_fields_if(&next, &[axis, UPDATED_AT], &guard)?;
    if applied {
        info!("event={event} module=service status=ok entity={entity} uid={uid}");
    } else {
        // Lost the race; report whatever the winner stored.
        info!("event={event} module=service status=noop entity={entity} uid={uid} reason=raced");
    }

    let latest = repo
        .find(uid)?
        .ok_or_else(|| ServiceError::not_found(entity, uid))?;
    Ok(if applied {
        Transition::applied(latest)
    } else {
        Transition::unchanged(latest)
    })
}
