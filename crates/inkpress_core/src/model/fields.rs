//! Field paths of the persisted documents, shared by repositories,
//! services and migration indexes.

use crate::db::FieldPath;

pub(crate) const UID: FieldPath = FieldPath::trusted("uid");
pub(crate) const SLUG: FieldPath = FieldPath::trusted("slug");
pub(crate) const NAME: FieldPath = FieldPath::trusted("name");
pub(crate) const CREATED_AT: FieldPath = FieldPath::trusted("created_at");
pub(crate) const UPDATED_AT: FieldPath = FieldPath::trusted("updated_at");
pub(crate) const DELETED_AT: FieldPath = FieldPath::trusted("deleted_at");
pub(crate) const PUBLISHED_AT: FieldPath = FieldPath::trusted("published_at");
pub(crate) const COMMENT_COUNT: FieldPath = FieldPath::trusted("comment_count");
pub(crate) const POST_UID: FieldPath = FieldPath::trusted("post_uid");
pub(crate) const PARENT_COMMENT_UID: FieldPath = FieldPath::trusted("parent_comment_uid");
pub(crate) const REPLY_COUNT: FieldPath = FieldPath::trusted("reply_count");
pub(crate) const USERNAME: FieldPath = FieldPath::trusted("username");
pub(crate) const EMAIL: FieldPath = FieldPath::trusted("email");
pub(crate) const TOKEN_ID: FieldPath = FieldPath::trusted("token_id");
pub(crate) const EXPIRES_AT: FieldPath = FieldPath::trusted("expires_at");
pub(crate) const RECIPIENT_UID: FieldPath = FieldPath::trusted("recipient_uid");
pub(crate) const READ_AT: FieldPath = FieldPath::trusted("read_at");
