//! Category use-case service.

use super::lifecycle::{set_trashed, Transition};
use super::{require_text, validate_slug, ServiceError, ServiceResult};
use crate::db::{Deadline, Filter, FindOptions, SortDirection, Store};
use crate::model::category::Category;
use crate::model::fields::NAME;
use crate::model::{now_epoch_ms, Lifecycle, Uid};
use crate::repo::category_repo::CategoryRepository;

const ENTITY: &str = "category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryForm {
    pub slug: String,
    pub name: String,
}

impl CategoryForm {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_slug(&self.slug)?;
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub slug: Option<String>,
    pub name: Option<String>,
}

pub struct CategoryService<'s> {
    store: &'s Store,
}

impl<'s> CategoryService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Creates an active category; an active duplicate slug is a conflict.
    pub fn create(&self, deadline: &Deadline, form: &CategoryForm) -> ServiceResult<Category> {
        form.validate()?;
        let docs = self.store.documents(deadline);
        let category = Category::new(form.slug.trim(), form.name.trim());
        CategoryRepository::new(&docs).save(&category)?;
        Ok(category)
    }

    /// Loads a category in any state.
    pub fn get(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Category> {
        let docs = self.store.documents(deadline);
        CategoryRepository::new(&docs)
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))
    }

    pub fn get_by_slug(&self, deadline: &Deadline, slug: &str) -> ServiceResult<Category> {
        let docs = self.store.documents(deadline);
        CategoryRepository::new(&docs)
            .find_active_by_slug(slug)?
            .ok_or_else(|| ServiceError::not_found_by(ENTITY, slug))
    }

    /// Lists categories matching `filter`, by name unless `options` sorts.
    pub fn list(
        &self,
        deadline: &Deadline,
        filter: &Filter,
        options: &FindOptions,
    ) -> ServiceResult<Vec<Category>> {
        let docs = self.store.documents(deadline);
        let options = if options.sort.is_empty() {
            options.clone().sort_by(NAME, SortDirection::Ascending)
        } else {
            options.clone()
        };
        Ok(CategoryRepository::new(&docs).find_many(filter, &options)?)
    }

    pub fn count(&self, deadline: &Deadline, filter: &Filter) -> ServiceResult<i64> {
        let docs = self.store.documents(deadline);
        Ok(CategoryRepository::new(&docs).count(filter)?)
    }

    pub fn update(
        &self,
        deadline: &Deadline,
        uid: Uid,
        patch: &CategoryPatch,
    ) -> ServiceResult<Category> {
        let docs = self.store.documents(deadline);
        let repo = CategoryRepository::new(&docs);
        let mut category = repo
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;

        if let Some(slug) = &patch.slug {
            validate_slug(slug)?;
            category.slug = slug.trim().to_string();
        }
        if let Some(name) = &patch.name {
            require_text("name", name)?;
            category.name = name.trim().to_string();
        }
        category.touch(now_epoch_ms());
        repo.update(&category)?;
        Ok(category)
    }

    pub fn trash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Category>> {
        set_trashed(&self.store.documents(deadline), ENTITY, uid, true)
    }

    /// Restores a trashed category; fails with a conflict if its slug was reused.
    pub fn detrash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Category>> {
        set_trashed(&self.store.documents(deadline), ENTITY, uid, false)
    }

    /// Removes the category permanently. Post snapshots keep their copy.
    pub fn delete(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<()> {
        let docs = self.store.documents(deadline);
        let repo = CategoryRepository::new(&docs);
        let category = repo
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;
        repo.delete(&category)?;
        Ok(())
    }
}
