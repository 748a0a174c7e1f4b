//! User use-case service, including token revocation.
//!
//! # Invariants
//! - Username and email are unique among active users; violations surface as
//!   a store `Conflict`.
//! - Password hashes are opaque; this layer never inspects them.

use super::lifecycle::{set_trashed, Transition};
use super::{
    require_text, validate_email, validate_username, ServiceError, ServiceResult,
};
use crate::db::{Deadline, Filter, FindOptions, Store};
use crate::model::token::RevokedToken;
use crate::model::user::{Role, User};
use crate::model::{now_epoch_ms, Lifecycle, Uid};
use crate::repo::token_repo::RevokedTokenRepository;
use crate::repo::user_repo::UserRepository;
use log::info;

const ENTITY: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

impl UserForm {
    pub fn validate(&self) -> ServiceResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        require_text("password_hash", &self.password_hash)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub roles: Option<Vec<Role>>,
}

pub struct UserService<'s> {
    store: &'s Store,
}

impl<'s> UserService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    pub fn create(&self, deadline: &Deadline, form: &UserForm) -> ServiceResult<User> {
        form.validate()?;
        let docs = self.store.documents(deadline);
        let mut user = User::new(&form.username, form.email.trim(), &form.password_hash);
        user.roles = form.roles.clone();
        UserRepository::new(&docs).save(&user)?;
        Ok(user)
    }

    /// Loads a user in any state.
    pub fn get(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<User> {
        let docs = self.store.documents(deadline);
        UserRepository::new(&docs)
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))
    }

    pub fn get_by_username(&self, deadline: &Deadline, username: &str) -> ServiceResult<User> {
        let docs = self.store.documents(deadline);
        UserRepository::new(&docs)
            .find_active_by_username(username)?
            .ok_or_else(|| ServiceError::not_found_by(ENTITY, username))
    }

    pub fn get_by_email(&self, deadline: &Deadline, email: &str) -> ServiceResult<User> {
        let docs = self.store.documents(deadline);
        UserRepository::new(&docs)
            .find_active_by_email(email)?
            .ok_or_else(|| ServiceError::not_found_by(ENTITY, email))
    }

    pub fn list(
        &self,
        deadline: &Deadline,
        filter: &Filter,
        options: &FindOptions,
    ) -> ServiceResult<Vec<User>> {
        let docs = self.store.documents(deadline);
        Ok(UserRepository::new(&docs).find_many(filter, options)?)
    }

    pub fn count(&self, deadline: &Deadline, filter: &Filter) -> ServiceResult<i64> {
        let docs = self.store.documents(deadline);
        Ok(UserRepository::new(&docs).count(filter)?)
    }

    pub fn update(&self, deadline: &Deadline, uid: Uid, patch: &UserPatch) -> ServiceResult<User> {
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }
        if let Some(password_hash) = &patch.password_hash {
            require_text("password_hash", password_hash)?;
        }

        let docs = self.store.documents(deadline);
        let repo = UserRepository::new(&docs);
        let mut user = repo
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;
        if let Some(email) = &patch.email {
            user.email = email.trim().to_string();
        }
        if let Some(password_hash) = &patch.password_hash {
            user.password_hash = password_hash.clone();
        }
        if let Some(roles) = &patch.roles {
            user.roles = roles.clone();
        }
        user.touch(now_epoch_ms());
        repo.update(&user)?;
        Ok(user)
    }

    pub fn trash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<User>> {
        set_trashed(&self.store.documents(deadline), ENTITY, uid, true)
    }

    /// Restores a trashed user; fails with a conflict if the username or email
    /// was taken meanwhile.
    pub fn detrash(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<Transition<User>> {
        set_trashed(&self.store.documents(deadline), ENTITY, uid, false)
    }

    pub fn delete(&self, deadline: &Deadline, uid: Uid) -> ServiceResult<()> {
        let docs = self.store.documents(deadline);
        let repo = UserRepository::new(&docs);
        let user = repo
            .find(uid)?
            .ok_or_else(|| ServiceError::not_found(ENTITY, uid))?;
        repo.delete(&user)?;
        Ok(())
    }

    /// Records that `token_id` of `user_uid` must no longer be accepted.
    ///
    /// Revoking an already revoked token is a no-op.
    pub fn revoke_token(
        &self,
        deadline: &Deadline,
        user_uid: Uid,
        token_id: &str,
        expires_at: i64,
    ) -> ServiceResult<()> {
        require_text("token_id", token_id)?;
        let docs = self.store.documents(deadline);
        let tokens = RevokedTokenRepository::new(&docs);
        if tokens.is_revoked(token_id)? {
            return Ok(());
        }
        tokens.revoke(&RevokedToken::new(token_id, user_uid, expires_at))?;
        info!("event=token_revoke module=service status=ok user_uid={user_uid}");
        Ok(())
    }

    pub fn is_token_revoked(&self, deadline: &Deadline, token_id: &str) -> ServiceResult<bool> {
        let docs = self.store.documents(deadline);
        Ok(RevokedTokenRepository::new(&docs).is_revoked(token_id)?)
    }

    /// Drops revocations of tokens that expired before `now`.
    pub fn purge_expired_tokens(&self, deadline: &Deadline, now: i64) -> ServiceResult<usize> {
        let docs = self.store.documents(deadline);
        let purged = RevokedTokenRepository::new(&docs).purge_expired(now)?;
        info!("event=token_purge module=service status=ok purged={purged}");
        Ok(purged)
    }
}
