//! Page and page content repositories.

use super::{active, Repository};
use crate::db::{Filter, StoreResult};
use crate::model::fields::{PUBLISHED_AT, SLUG};
use crate::model::page::{Page, PageContent};

pub type PageRepository<'a> = Repository<'a, Page>;
pub type PageContentRepository<'a> = Repository<'a, PageContent>;

impl Repository<'_, Page> {
    pub fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Page>> {
        self.find_one(&active().and(Filter::eq(SLUG, slug)))
    }

    pub fn find_published_by_slug(&self, slug: &str) -> StoreResult<Option<Page>> {
        self.find_one(
            &active()
                .and(Filter::not_null(PUBLISHED_AT))
                .and(Filter::eq(SLUG, slug)),
        )
    }
}
