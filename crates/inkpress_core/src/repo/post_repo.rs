//! Post and post content repositories.

use super::{active, Repository};
use crate::db::{Filter, StoreResult};
use crate::model::fields::{COMMENT_COUNT, PUBLISHED_AT, SLUG};
use crate::model::post::{Post, PostContent};
use crate::model::Uid;

pub type PostRepository<'a> = Repository<'a, Post>;
pub type PostContentRepository<'a> = Repository<'a, PostContent>;

impl Repository<'_, Post> {
    pub fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Post>> {
        self.find_one(&active().and(Filter::eq(SLUG, slug)))
    }

    pub fn find_published_by_slug(&self, slug: &str) -> StoreResult<Option<Post>> {
        self.find_one(
            &active()
                .and(Filter::not_null(PUBLISHED_AT))
                .and(Filter::eq(SLUG, slug)),
        )
    }

    /// Adds `delta` to the post's comment counter; `false` if the post is gone.
    pub fn adjust_comment_count(&self, post_uid: Uid, delta: i64) -> StoreResult<bool> {
        self.docs()
            .increment::<Post>(post_uid, &COMMENT_COUNT, delta)
    }
}
