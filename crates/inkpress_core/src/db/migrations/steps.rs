//! Declared schema steps, in dependency order.

use super::{index, Migration};
use crate::db::document::{Document, DocumentStore, IndexSpec};
use crate::db::StoreResult;
use crate::model::category::Category;
use crate::model::comment::Comment;
use crate::model::notification::Notification;
use crate::model::page::{Page, PageContent};
use crate::model::post::{Post, PostContent};
use crate::model::token::RevokedToken;
use crate::model::user::User;

/// Creates collections and their indexes; `down` drops them in reverse.
#[derive(Debug, Clone, Copy)]
pub struct CollectionMigration {
    pub name: &'static str,
    pub collections: &'static [&'static str],
    pub indexes: &'static [IndexSpec],
}

impl Migration for CollectionMigration {
    fn name(&self) -> &'static str {
        self.name
    }

    fn up(&self, store: &DocumentStore<'_>) -> StoreResult<()> {
        for collection in self.collections {
            store.create_collection(*collection)?;
        }
        for spec in self.indexes {
            store.create_index(spec)?;
        }
        Ok(())
    }

    fn down(&self, store: &DocumentStore<'_>) -> StoreResult<()> {
        for spec in self.indexes.iter().rev() {
            store.drop_index(spec)?;
        }
        for collection in self.collections.iter().rev() {
            store.drop_collection(*collection)?;
        }
        Ok(())
    }
}

pub const MIGRATIONS: &[CollectionMigration] = &[
    CollectionMigration {
        name: "01_create_categories",
        collections: &[Category::COLLECTION],
        indexes: &[index(
            "categories_slug_active",
            Category::COLLECTION,
            &["slug"],
            true,
            true,
        )],
    },
    CollectionMigration {
        name: "02_create_pages",
        collections: &[Page::COLLECTION, PageContent::COLLECTION],
        indexes: &[index(
            "pages_slug_active",
            Page::COLLECTION,
            &["slug"],
            true,
            true,
        )],
    },
    CollectionMigration {
        name: "03_create_posts",
        collections: &[Post::COLLECTION, PostContent::COLLECTION],
        indexes: &[
            index("posts_slug_active", Post::COLLECTION, &["slug"], true, true),
            index(
                "posts_published_at",
                Post::COLLECTION,
                &["published_at"],
                false,
                false,
            ),
        ],
    },
    CollectionMigration {
        name: "04_create_comments",
        collections: &[Comment::COLLECTION],
        indexes: &[
            index(
                "comments_post_thread",
                Comment::COLLECTION,
                &["post_uid", "parent_comment_uid"],
                false,
                false,
            ),
            index(
                "comments_parent",
                Comment::COLLECTION,
                &["parent_comment_uid"],
                false,
                false,
            ),
        ],
    },
    CollectionMigration {
        name: "05_create_users",
        collections: &[User::COLLECTION],
        indexes: &[
            index(
                "users_username_active",
                User::COLLECTION,
                &["username"],
                true,
                true,
            ),
            index("users_email_active", User::COLLECTION, &["email"], true, true),
        ],
    },
    CollectionMigration {
        name: "06_create_revoked_tokens",
        collections: &[RevokedToken::COLLECTION],
        indexes: &[
            index(
                "revoked_tokens_token_id",
                RevokedToken::COLLECTION,
                &["token_id"],
                true,
                false,
            ),
            index(
                "revoked_tokens_expires_at",
                RevokedToken::COLLECTION,
                &["expires_at"],
                false,
                false,
            ),
        ],
    },
    CollectionMigration {
        name: "07_create_notifications",
        collections: &[Notification::COLLECTION],
        indexes: &[index(
            "notifications_recipient",
            Notification::COLLECTION,
            &["recipient_uid", "read_at"],
            false,
            false,
        )],
    },
];
