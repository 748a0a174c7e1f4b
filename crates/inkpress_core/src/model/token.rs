//! Revoked authentication token document.

use super::{now_epoch_ms, Uid};
use crate::db::document::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokedToken {
    pub uid: Uid,
    /// Token identifier issued by the auth layer (e.g. a JWT `jti`).
    pub token_id: String,
    pub user_uid: Uid,
    /// Original token expiry; the record is useless afterwards.
    pub expires_at: i64,
    pub revoked_at: i64,
}

impl RevokedToken {
    pub fn new(token_id: impl Into<String>, user_uid: Uid, expires_at: i64) -> Self {
        Self {
            uid: Uuid::new_v4(),
            token_id: token_id.into(),
            user_uid,
            expires_at,
            revoked_at: now_epoch_ms(),
        }
    }
}

impl Document for RevokedToken {
    const COLLECTION: &'static str = "revoked_tokens";

    fn uid(&self) -> Uid {
        self.uid
    }
}
