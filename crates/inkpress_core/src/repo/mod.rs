//! Typed repositories over the document store.
//!
//! # Responsibility
//! - Bind each document type to its collection and common lookups.
//! - Keep query construction out of the lifecycle services.
//!
//! # Invariants
//! - Repositories hold no business rules; every call is one store call.
//! - Repositories work identically on plain and transaction-bound handles.
//! - Absence is `Ok(None)`; callers decide whether it is an error.

use crate::db::document::{Document, DocumentStore};
use crate::db::{Filter, FindOptions, StoreResult};
use crate::model::fields::{DELETED_AT, UID};
use crate::model::Uid;
use std::marker::PhantomData;

pub mod category_repo;
pub mod comment_repo;
pub mod notification_repo;
pub mod page_repo;
pub mod post_repo;
pub mod token_repo;
pub mod user_repo;

/// Generic typed CRUD over the collection of `D`.
pub struct Repository<'a, D> {
    docs: &'a DocumentStore<'a>,
    _document: PhantomData<fn() -> D>,
}

impl<'a, D: Document> Repository<'a, D> {
    pub fn new(docs: &'a DocumentStore<'a>) -> Self {
        Self {
            docs,
            _document: PhantomData,
        }
    }

    pub(crate) fn docs(&self) -> &'a DocumentStore<'a> {
        self.docs
    }

    /// Loads one document by identity, in any lifecycle state.
    pub fn find(&self, uid: Uid) -> StoreResult<Option<D>> {
        self.docs.read_one(&Filter::eq(UID, uid))
    }

    pub fn find_one(&self, filter: &Filter) -> StoreResult<Option<D>> {
        self.docs.read_one(filter)
    }

    pub fn find_many(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<D>> {
        self.docs.read_many(filter, options)
    }

    pub fn count(&self, filter: &Filter) -> StoreResult<i64> {
        self.docs.count::<D>(filter)
    }

    pub fn save(&self, document: &D) -> StoreResult<()> {
        self.docs.save(document)
    }

    pub fn update(&self, document: &D) -> StoreResult<()> {
        self.docs.update(document)
    }

    pub fn update_if(&self, document: &D, guard: &Filter) -> StoreResult<bool> {
        self.docs.update_if(document, guard)
    }

    pub fn delete(&self, document: &D) -> StoreResult<()> {
        self.docs.delete(document)
    }

    pub fn delete_where(&self, filter: &Filter) -> StoreResult<usize> {
        self.docs.delete_many::<D>(filter)
    }
}

/// Matches documents that are not trashed.
pub fn active() -> Filter {
    Filter::is_null(DELETED_AT)
}
