//! User repository.

use super::{active, Repository};
use crate::db::{Filter, StoreResult};
use crate::model::fields::{EMAIL, USERNAME};
use crate::model::user::User;

pub type UserRepository<'a> = Repository<'a, User>;

impl Repository<'_, User> {
    pub fn find_active_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_one(&active().and(Filter::eq(USERNAME, username)))
    }

    pub fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_one(&active().and(Filter::eq(EMAIL, email)))
    }
}
