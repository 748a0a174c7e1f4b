//! Comment use-case service.
//!
//! # Responsibility
//! - Create top-level comments and replies on visible posts.
//! - Dispatch trash/detrash/delete on threading level and keep counters in
//!   lockstep with the comment write.
//! - Notify the post author about new comments.
//!
//! # Invariants
//! - Threading is exactly two levels; replying to a reply is a conflict.
//! - `Post::comment_count` counts active top-level comments and
//!   `Comment::reply_count` counts active replies; every comment write and its
//!   counter adjustment share one unit of work.
//! - Comments of a trashed or unpublished post are not visible; neither are
//!   replies of a trashed parent.

use super::lifecycle::{set_trashed, Transition};
use super::{require_text, validate_email, ServiceError, ServiceResult};
use crate::db::{Deadline, DocumentStore, FindOptions, Store};
use crate::model::comment::Comment;
use crate::model::notification::Notification;
use crate::model::post::Post;
use crate::model::{Lifecycle, Uid};
use crate::repo::comment_repo::CommentRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::post_repo::PostRepository;
use log::info;

const ENTITY: &str = "comment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
    pub email: String,
    pub name: String,
    pub content: String,
}

impl CommentForm {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_email(self.email.trim())?;
        require_text("name", &self.name)?;
        require_text("content", &self.content)
    }
}

pub struct CommentService<'s> {
    store: &'s Store,
}

impl<'s> CommentService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Creates a top-level comment on a published, active post.
    ///
    /// # Errors
    /// - `NotFound` when the post is missing or trashed.
    /// - `Conflict` when the post is still a draft.
    pub fn create(
        &self,
        deadline: &Deadline,
        post_uid: Uid,
        form: &CommentForm,
    ) -> ServiceResult<Comment> {
        form.validate()?;

        self.store.transact(deadline, |docs| -> ServiceResult<Comment> {
            let post = load_commentable_post(docs, post_uid)?;
            let comment = Comment::top_level(
                &post,
                form.email.trim(),
                form.name.trim(),
                form.content.clone(),
            );

            CommentRepository::new(docs).save(&comment)?;
            PostRepository::new(docs).adjust_comment_count(post.uid, 1)?;
            NotificationRepository::new(docs).push(&Notification::for_comment(&comment))?;

            info!(
                "event=comment_create module=service status=ok uid={} post_uid={}",
                comment.uid, post.uid
            );
            Ok(comment)
        })
    }

    /// Creates a reply under an active top-level comment.
    ///
    /// Post linkage is copied from the parent.
    ///
    /// # Errors
    /// - `NotFound` when the parent or its post is missing or trashed.
    /// - `Conflict` when the parent is itself a reply or the post is a draft.
    pub fn reply(
        &self,
        deadline: &Deadline,
        parent_uid: Uid,
        form: &CommentForm,
    ) -> ServiceResult<Comment> {
        form.validate()?;

        self.store.transact(deadline, |docs| -> ServiceResult<Comment> {
            let comments = CommentRepository::new(docs);
            let parent = comments
                .find(parent_uid)?
                .filter(|parent| !parent.is_trashed())
                .ok_or_else(|| ServiceError::not_found(ENTITY, parent_uid))?;
            if parent.is_reply() {
                return Err(ServiceError::Conflict(format!(
                    "comment {parent_uid} is a reply and cannot be replied to"
                )));
            }
            load_commentable_post(docs, parent.post_uid)?;

            let reply = Comment::reply_to(
                &parent,
                form.email.trim(),
                form.name.trim(),
                form.content.clone(),
            );
            comments.save(&reply)?;
            comments.adjust_reply_count(parent.uid, 1)?;
            NotificationRepository::new(docs).push(&Notification::for_comment(&reply))?;

            info!(
                "event=comment_reply module=service status=ok uid={} parent_uid={}",
                reply.uid, parent.uid
            );
            Ok(reply)
        })
    }

    /// Loads a comment in any state.
    pub fn get(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Comment> {
        let docs = self.store.documents(deadline);
        CommentRepository::new(&docs)
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))
    }

    /// Lists active top-level comments of a visible post, oldest first.
    pub fn list_for_post(
        &self,
        deadline: &Deadline,
        post_uid: Uid,
        options: &FindOptions,
    ) -> ServiceResult<Vec<Comment>> {
        let docs = self.store.documents(deadline);
        load_visible_post(&docs, post_uid)?;
        Ok(CommentRepository::new(&docs).list_top_level(post_uid, options)?)
    }

    /// Lists active replies of an active comment on a visible post.
    pub fn list_replies(
        &self,
        deadline: &Deadline,
        parent_uid: Uid,
        options: &FindOptions,
    ) -> ServiceResult<Vec<Comment>> {
        let docs = self.store.documents(deadline);
        let comments = CommentRepository::new(&docs);
        let parent = comments
            .find(parent_uid)?
            .filter(|parent| !parent.is_trashed())
            .ok_or_else(|| ServiceError::not_found(ENTITY, parent_uid))?;
        load_visible_post(&docs, parent.post_uid)?;
        Ok(comments.list_replies(parent_uid, options)?)
    }

    pub fn trash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Comment>> {
        self.store
            .transact(deadline, |docs| -> ServiceResult<Transition<Comment>> {
                let transition = set_trashed::<Comment>(docs, ENTITY, uid, true)?;
                if transition.applied {
                    adjust_counter(docs, &transition.document, -1)?;
                }
                Ok(transition)
            })
    }

    pub fn detrash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<Comment>> {
        self.store
            .transact(deadline, |docs| -> ServiceResult<Transition<Comment>> {
                let transition = set_trashed::<Comment>(docs, ENTITY, uid, false)?;
                if transition.applied {
                    adjust_counter(docs, &transition.document, 1)?;
                }
                Ok(transition)
            })
    }

    /// Removes a comment permanently.
    ///
    /// Deleting an active comment decrements its counter; deleting a top-level
    /// comment also removes its replies.
    pub fn delete(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<()> {
        self.store.transact(deadline, |docs| -> ServiceResult<()> {
            let comments = CommentRepository::new(docs);
            let comment = comments
                .find(uid)?
                .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;

            comments.delete(&comment)?;
            if !comment.is_trashed() {
                adjust_counter(docs, &comment, -1)?;
            }
            let removed_replies = if comment.is_reply() {
                0
            } else {
                comments.delete_replies(comment.uid)?
            };

            info!(
                "event=comment_delete module=service status=ok uid={} replies_removed={}",
                uid, removed_replies
            );
            Ok(())
        })
    }
}

/// Adjusts the counter owning `comment`: the parent for replies, the post
/// otherwise. A missing owner is tolerated; it may have been deleted.
fn adjust_counter(docs: &DocumentStore<'_>, comment: &Comment, delta: i64) -> ServiceResult<()> {
    match comment.parent_comment_uid {
        Some(parent_uid) => {
            CommentRepository::new(docs).adjust_reply_count(parent_uid, delta)?;
        }
        None => {
            PostRepository::new(docs).adjust_comment_count(comment.post_uid, delta)?;
        }
    }
    Ok(())
}

fn load_commentable_post(docs: &DocumentStore<'_>, post_uid: Uid) -> ServiceResult<Post> {
    let post = PostRepository::new(docs)
        .find(post_uid)?
        .filter(|post| !post.is_trashed())
        .ok_or_else(|| ServiceError::not_found("post", post_uid))?;
    if !post.is_visible() {
        return Err(ServiceError::Conflict(format!(
            "post {post_uid} is not published"
        )));
    }
    Ok(post)
}

fn load_visible_post(docs: &DocumentStore<'_>, post_uid: Uid) -> ServiceResult<Post> {
    PostRepository::new(docs)
        .find(post_uid)?
        .filter(Post::is_visible)
        .ok_or_else(|| ServiceError::not_found("post", post_uid))
}
