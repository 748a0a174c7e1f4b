//! Comment repository.

use super::{active, Repository};
use crate::db::{Filter, FindOptions, SortDirection, StoreResult};
use crate::model::comment::Comment;
use crate::model::fields::{CREATED_AT, PARENT_COMMENT_UID, POST_UID, REPLY_COUNT};
use crate::model::Uid;

pub type CommentRepository<'a> = Repository<'a, Comment>;

impl Repository<'_, Comment> {
    /// Active top-level comments of one post, oldest first.
    pub fn list_top_level(&self, post_uid: Uid, options: &FindOptions) -> StoreResult<Vec<Comment>> {
        self.find_many(&top_level_filter(post_uid), &oldest_first(options))
    }

    pub fn count_top_level(&self, post_uid: Uid) -> StoreResult<i64> {
        self.count(&top_level_filter(post_uid))
    }

    /// Active replies under one parent, oldest first.
    pub fn list_replies(&self, parent_uid: Uid, options: &FindOptions) -> StoreResult<Vec<Comment>> {
        self.find_many(&replies_filter(parent_uid), &oldest_first(options))
    }

    pub fn count_replies(&self, parent_uid: Uid) -> StoreResult<i64> {
        self.count(&replies_filter(parent_uid))
    }

    /// Adds `delta` to the parent's reply counter; `false` if the parent is gone.
    pub fn adjust_reply_count(&self, parent_uid: Uid, delta: i64) -> StoreResult<bool> {
        self.docs()
            .increment::<Comment>(parent_uid, &REPLY_COUNT, delta)
    }

    /// Removes every reply of `parent_uid`, trashed or not.
    pub fn delete_replies(&self, parent_uid: Uid) -> StoreResult<usize> {
        self.delete_where(&Filter::eq(PARENT_COMMENT_UID, parent_uid))
    }

    /// Removes every comment of `post_uid`, trashed or not.
    pub fn delete_for_post(&self, post_uid: Uid) -> StoreResult<usize> {
        self.delete_where(&Filter::eq(POST_UID, post_uid))
    }
}

fn top_level_filter(post_uid: Uid) -> Filter {
    active()
        .and(Filter::eq(POST_UID, post_uid))
        .and(Filter::is_null(PARENT_COMMENT_UID))
}

fn replies_filter(parent_uid: Uid) -> Filter {
    active().and(Filter::eq(PARENT_COMMENT_UID, parent_uid))
}

fn oldest_first(options: &FindOptions) -> FindOptions {
    if !options.sort.is_empty() {
        return options.clone();
    }
    options
        .clone()
        .sort_by(CREATED_AT, SortDirection::Ascending)
}
