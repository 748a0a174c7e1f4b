//! Post use-case service.
//!
//! # Responsibility
//! - Create/update/delete posts together with their content.
//! - Resolve category identities into embedded snapshots.
//! - Drive publish/trash transitions of the post metadata.
//!
//! # Invariants
//! - `Post` and `PostContent` move together in one unit of work.
//! - Deleting a post removes its content and every comment on it.
//! - Tags are trimmed, lowercased and deduplicated in first-seen order.

use super::lifecycle::{set_published, set_trashed, Transition};
use super::{require_text, validate_slug, ServiceError, ServiceResult};
use crate::db::{Deadline, DocumentStore, Filter, FindOptions, Store};
use crate::model::snapshot::{AuthorSnapshot, CategorySnapshot};
use crate::model::post::{Post, PostContent};
use crate::model::{now_epoch_ms, Lifecycle, Uid};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::post_repo::{PostContentRepository, PostRepository};
use log::info;

const ENTITY: &str = "post";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_uids: Vec<Uid>,
    pub tags: Vec<String>,
}

impl PostForm {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_slug(&self.slug)?;
        require_text("title", &self.title)?;
        validate_tags(&self.tags)
    }
}

/// Field patch; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category_uids: Option<Vec<Uid>>,
    pub tags: Option<Vec<String>>,
}

impl PostPatch {
    pub fn validate(&self) -> ServiceResult<()> {
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }
}

/// Both halves of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithContent {
    pub post: Post,
    pub content: PostContent,
}

pub struct PostService<'s> {
    store: &'s Store,
}

impl<'s> PostService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Creates an active draft post and its content atomically.
    ///
    /// # Errors
    /// - `NotFound` when a category uid does not name an active category.
    /// - Store `Conflict` when an active post already uses the slug.
    pub fn create(
        &self,
        deadline: &Deadline,
        author: &AuthorSnapshot,
        form: &PostForm,
    ) -> ServiceResult<PostWithContent> {
        form.validate()?;

        self.store
            .transact(deadline, |docs| -> ServiceResult<PostWithContent> {
                let mut post = Post::new(form.slug.trim(), form.title.trim(), author.clone());
                post.description = form.description.trim().to_string();
                post.categories = resolve_categories(docs, &form.category_uids)?;
                post.tags = normalize_tags(&form.tags);
                let content = post.content(form.content.clone());

                PostRepository::new(docs).save(&post)?;
                PostContentRepository::new(docs).save(&content)?;
                Ok(PostWithContent { post, content })
            })
    }

    /// Loads a post in any state.
    pub fn get(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Post> {
        let docs = self.store.documents(deadline);
        PostRepository::new(&docs)
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))
    }

    /// Loads both halves of a post in any state.
    pub fn get_with_content(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<PostWithContent> {
        let docs = self.store.documents(deadline);
        let post = PostRepository::new(&docs)
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;
        with_content(&docs, post)
    }

    /// Loads an active post, draft or published.
    pub fn get_by_slug(&self, deadline: &Deadline, slug: &str) -> ServiceResult<PostWithContent> {
        let docs = self.store.documents(deadline);
        let post = PostRepository::new(&docs)
            .find_by_slug(slug)?
            .ok_or_else(|| ServiceError::not_found_by(ENTITY, slug))?;
        with_content(&docs, post)
    }

    /// Loads an active, published post for public readers.
    pub fn get_published(&self, deadline: &Deadline, slug: &str) -> ServiceResult<PostWithContent> {
        let docs = self.store.documents(deadline);
        let post = PostRepository::new(&docs)
            .find_published_by_slug(slug)?
            .ok_or_else(|| ServiceError::not_found_by(ENTITY, slug))?;
        with_content(&docs, post)
    }

    pub fn list(
        &self,
        deadline: &Deadline,
        filter: &Filter,
        options: &FindOptions,
    ) -> ServiceResult<Vec<Post>> {
        let docs = self.store.documents(deadline);
        Ok(PostRepository::new(&docs).find_many(filter, options)?)
    }

    pub fn count(&self, deadline: &Deadline, filter: &Filter) -> ServiceResult<i64> {
        let docs = self.store.documents(deadline);
        Ok(PostRepository::new(&docs).count(filter)?)
    }

    /// Applies `patch` to both halves atomically.
    ///
    /// Lifecycle timestamps and the comment counter are never changed here.
    pub fn update(
        &self,
        deadline: &Deadline,
        uid: Uid,
        patch: &PostPatch,
    ) -> ServiceResult<PostWithContent> {
        patch.validate()?;

        self.store
            .transact(deadline, |docs| -> ServiceResult<PostWithContent> {
                let posts = PostRepository::new(docs);
                let mut post = posts
                    .find(uid)?
                    .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;
                let mut current = with_content(docs, post.clone())?;

                if let Some(slug) = &patch.slug {
                    post.slug = slug.trim().to_string();
                }
                if let Some(title) = &patch.title {
                    post.title = title.trim().to_string();
                }
                if let Some(description) = &patch.description {
                    post.description = description.trim().to_string();
                }
                if let Some(category_uids) = &patch.category_uids {
                    post.categories = resolve_categories(docs, category_uids)?;
                }
                if let Some(tags) = &patch.tags {
                    post.tags = normalize_tags(tags);
                }
                post.touch(now_epoch_ms());
                posts.update(&post)?;

                if let Some(content) = &patch.content {
                    current.content.content = content.clone();
                    PostContentRepository::new(docs).update(&current.content)?;
                }
                current.post = post;
                Ok(current)
            })
    }

    pub fn publish(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Post>> {
        set_published(&self.store.documents(deadline), ENTITY, uid, true)
    }

    pub fn depublish(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Post>> {
        set_published(&self.store.documents(deadline), ENTITY, uid, false)
    }

    pub fn trash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Post>> {
        set_trashed(&self.store.documents(deadline), ENTITY, uid, true)
    }

    pub fn detrash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Post>> {
        set_trashed(&self.store.documents(deadline), ENTITY, uid, false)
    }

    /// Removes the post, its content and its comments permanently.
    pub fn delete(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<()> {
        self.store.transact(deadline, |docs| -> ServiceResult<()> {
            let posts = PostRepository::new(docs);
            let post = posts
                .find(uid)?
                .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;

            let removed_comments = CommentRepository::new(docs).delete_for_post(uid)?;
            let contents = PostContentRepository::new(docs);
            if let Some(content) = contents.find(uid)? {
                contents.delete(&content)?;
            }
            posts.delete(&post)?;

            info!(
                "event=post_delete module=service status=ok uid={} comments_removed={}",
                uid, removed_comments
            );
            Ok(())
        })
    }
}

fn with_content(docs: &DocumentStore<'_>, post: Post) -> ServiceResult<PostWithContent> {
    let content = PostContentRepository::new(docs)
        .find(post.uid)?
        .ok_or(ServiceError::InconsistentState("post content missing"))?;
    Ok(PostWithContent { post, content })
}

fn resolve_categories(
    docs: &DocumentStore<'_>,
    category_uids: &[Uid],
) -> ServiceResult<Vec<CategorySnapshot>> {
    let categories = CategoryRepository::new(docs);
    let mut snapshots: Vec<CategorySnapshot> = Vec::with_capacity(category_uids.len());
    for uid in category_uids {
        if snapshots.iter().any(|snapshot| snapshot.uid == *uid) {
            continue;
        }
        let category = categories
            .find(*uid)?
            .filter(|category| !category.is_trashed())
            .ok_or_else(|| ServiceError::not_found("category", *uid))?;
        snapshots.push(CategorySnapshot::from(&category));
    }
    Ok(snapshots)
}

fn validate_tags(tags: &[String]) -> ServiceResult<()> {
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(ServiceError::Validation("tags must not be blank".to_string()));
        }
    }
    Ok(())
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}
