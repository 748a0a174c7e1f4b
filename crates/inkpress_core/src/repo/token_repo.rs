//! Revoked token repository.

use super::Repository;
use crate::db::{Filter, StoreResult};
use crate::model::fields::{EXPIRES_AT, TOKEN_ID};
use crate::model::token::RevokedToken;

pub type RevokedTokenRepository<'a> = Repository<'a, RevokedToken>;

impl Repository<'_, RevokedToken> {
    /// Records a revocation; revoking the same token twice is a conflict.
    pub fn revoke(&self, token: &RevokedToken) -> StoreResult<()> {
        self.save(token)
    }

    pub fn is_revoked(&self, token_id: &str) -> StoreResult<bool> {
        Ok(self.count(&Filter::eq(TOKEN_ID, token_id))? > 0)
    }

    /// Drops revocations whose token expired before `now`.
    pub fn purge_expired(&self, now: i64) -> StoreResult<usize> {
        self.delete_where(&Filter::lt(EXPIRES_AT, now))
    }
}
