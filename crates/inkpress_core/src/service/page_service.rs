//! Page use-case service.
//!
//! # Invariants
//! - `Page` and `PageContent` are created, updated and deleted together in one
//!   unit of work; one never persists without the other.
//! - Publish/trash transitions touch only the `Page` document.

use super::lifecycle::{set_published, set_trashed, Transition};
use super::{require_text, validate_slug, ServiceError, ServiceResult};
use crate::db::{Deadline, DocumentStore, Filter, FindOptions, Store};
use crate::model::page::{Page, PageContent};
use crate::model::snapshot::AuthorSnapshot;
use crate::model::{now_epoch_ms, Lifecycle, Uid};
use crate::repo::page_repo::{PageContentRepository, PageRepository};

const ENTITY: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageForm {
    pub slug: String,
    pub title: String,
    pub content: String,
}

impl PageForm {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_slug(&self.slug)?;
        require_text("title", &self.title)
    }
}

/// Field patch; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Both halves of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWithContent {
    pub page: Page,
    pub content: PageContent,
}

pub struct PageService<'s> {
    store: &'s Store,
}

impl<'s> PageService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Creates an active draft page and its content atomically.
    pub fn create(
        &self,
        deadline: &Deadline,
        author: &AuthorSnapshot,
        form: &PageForm,
    ) -> ServiceResult<PageWithContent> {
        form.validate()?;
        let page = Page::new(form.slug.trim(), form.title.trim(), author.clone());
        let content = page.content(form.content.clone());

        self.store.transact(deadline, |docs| -> ServiceResult<()> {
            PageRepository::new(docs).save(&page)?;
            PageContentRepository::new(docs).save(&content)?;
            Ok(())
        })?;
        Ok(PageWithContent { page, content })
    }

    /// Loads a page in any state.
    pub fn get(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Page> {
        let docs = self.store.documents(deadline);
        PageRepository::new(&docs)
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))
    }

    /// Loads both halves of a page in any state.
    pub fn get_with_content(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<PageWithContent> {
        let docs = self.store.documents(deadline);
        let page = PageRepository::new(&docs)
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;
        with_content(&docs, page)
    }

    /// Loads an active page, draft or published.
    pub fn get_by_slug(&self, deadline: &Deadline, slug: &str) -> ServiceResult<PageWithContent> {
        let docs = self.store.documents(deadline);
        let page = PageRepository::new(&docs)
            .find_by_slug(slug)?
            .ok_or_else(|| ServiceError::not_found_by(ENTITY, slug))?;
        with_content(&docs, page)
    }

    /// Loads an active, published page for public readers.
    pub fn get_published(&self, deadline: &Deadline, slug: &str) -> ServiceResult<PageWithContent> {
        let docs = self.store.documents(deadline);
        let page = PageRepository::new(&docs)
            .find_published_by_slug(slug)?
            .ok_or_else(|| ServiceError::not_found_by(ENTITY, slug))?;
        with_content(&docs, page)
    }

    pub fn list(
        &self,
        deadline: &Deadline,
        filter: &Filter,
        options: &FindOptions,
    ) -> ServiceResult<Vec<Page>> {
        let docs = self.store.documents(deadline);
        Ok(PageRepository::new(&docs).find_many(filter, options)?)
    }

    pub fn count(&self, deadline: &Deadline, filter: &Filter) -> ServiceResult<i64> {
        let docs = self.store.documents(deadline);
        Ok(PageRepository::new(&docs).count(filter)?)
    }

    /// Applies `patch` to both halves atomically.
    ///
    /// Lifecycle timestamps are never changed here.
    pub fn update(
        &self,
        deadline: &Deadline,
        uid: Uid,
        patch: &PagePatch,
    ) -> ServiceResult<PageWithContent> {
        if let Some(slug) = &patch.slug {
            validate_slug(slug)?;
        }
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }

        self.store.transact(deadline, |docs| -> ServiceResult<PageWithContent> {
            let pages = PageRepository::new(docs);
            let mut page = pages
                .find(uid)?
                .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;
            let mut current = with_content(docs, page.clone())?;

            if let Some(slug) = &patch.slug {
                page.slug = slug.trim().to_string();
            }
            if let Some(title) = &patch.title {
                page.title = title.trim().to_string();
            }
            page.touch(now_epoch_ms());
            pages.update(&page)?;

            if let Some(content) = &patch.content {
                current.content.content = content.clone();
                PageContentRepository::new(docs).update(&current.content)?;
            }
            current.page = page;
            Ok(current)
        })
    }

    pub fn publish(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Page>> {
        set_published(&self.store.documents(deadline), ENTITY, uid, true)
    }

    pub fn depublish(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Page>> {
        set_published(&self.store.documents(deadline), ENTITY, uid, false)
    }

    pub fn trash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Page>> {
        set_trashed(&self.store.documents(deadline), ENTITY, uid, true)
    }

    pub fn detrash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Page>> {
        set_trashed(&self.store.documents(deadline), ENTITY, uid, false)
    }

    /// Removes both halves permanently, from any state.
    pub fn delete(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<()> {
        self.store.transact(deadline, |docs| -> ServiceResult<()> {
            let pages = PageRepository::new(docs);
            let page = pages
                .find(uid)?
                .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;
            let contents = PageContentRepository::new(docs);
            if let Some(content) = contents.find(uid)? {
                contents.delete(&content)?;
            }
            pages.delete(&page)?;
            Ok(())
        })
    }
}

fn with_content(docs: &DocumentStore<'_>, page: Page) -> ServiceResult<PageWithContent> {
    let content = PageContentRepository::new(docs)
        .find(page.uid)?
        .ok_or(ServiceError::InconsistentState("page content missing"))?;
    Ok(PageWithContent { page, content })
}
