//! Denormalized copies embedded into other documents at write time.
//!
//! Snapshots are not kept in sync with later edits of their source.

use super::category::Category;
use super::user::User;
use super::Uid;
use serde::{Deserialize, Serialize};

/// Already-authenticated author identity, trusted as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub uid: Uid,
    pub username: String,
}

impl From<&User> for AuthorSnapshot {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub uid: Uid,
    pub slug: String,
    pub name: String,
}

impl From<&Category> for CategorySnapshot {
    fn from(category: &Category) -> Self {
        Self {
            uid: category.uid,
            slug: category.slug.clone(),
            name: category.name.clone(),
        }
    }
}
