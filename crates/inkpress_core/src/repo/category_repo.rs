//! Category repository.

use super::{active, Repository};
use crate::db::{Filter, StoreResult};
use crate::model::category::Category;
use crate::model::fields::SLUG;

pub type CategoryRepository<'a> = Repository<'a, Category>;

impl Repository<'_, Category> {
    pub fn find_active_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
        self.find_one(&active().and(Filter::eq(SLUG, slug)))
    }
}
