//! User document.

use super::{now_epoch_ms, Lifecycle, Uid};
use crate::db::document::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role grant; interpretation of `level` belongs to the policy layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub level: i32,
    pub name: String,
    /// Grant time in epoch milliseconds.
    pub since: i64,
}

impl Role {
    pub fn new(level: i32, name: impl Into<String>) -> Self {
        Self {
            level,
            name: name.into(),
            since: now_epoch_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: Uid,
    /// Unique among non-deleted users.
    pub username: String,
    /// Unique among non-deleted users.
    pub email: String,
    /// Opaque hash produced by the authentication layer.
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            uid: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            roles: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn uid(&self) -> Uid {
        self.uid
    }
}

impl Lifecycle for User {
    fn deleted_at(&self) -> Option<i64> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, value: Option<i64>) {
        self.deleted_at = value;
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}
