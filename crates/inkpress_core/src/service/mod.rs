//! Lifecycle use-case services.
//!
//! # Responsibility
//! - Enforce the draft/publish and active/trash state machines.
//! - Move split entities (metadata + content) through one unit of work.
//! - Keep comment threading, counters and notifications consistent.
//!
//! # Invariants
//! - Every entry point takes a caller deadline and honors it.
//! - Store errors surface unchanged inside `ServiceError::Store`; no retries.
//! - Services hold no state besides the borrowed `Store`.

use crate::db::StoreError;
use crate::model::Uid;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_service;
pub mod comment_service;
mod lifecycle;
pub mod notification_service;
pub mod page_service;
pub mod post_service;
pub mod user_service;

pub use lifecycle::Transition;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid slug regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{2,64}$").expect("valid username regex"));

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse error class exposed to outer layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    Timeout,
    Cancelled,
    Internal,
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        })
    }
}

/// Service error for lifecycle use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Target entity does not exist or is not visible in the requested state.
    NotFound { entity: &'static str, key: String },
    /// The requested transition is illegal for the current state.
    Conflict(String),
    /// Form or patch input failed the shape check.
    Validation(String),
    /// Split entity found with one half missing.
    InconsistentState(&'static str),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, uid: Uid) -> Self {
        Self::NotFound {
            entity,
            key: uid.to_string(),
        }
    }

    pub(crate) fn not_found_by(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Conflict(_) | Self::Validation(_) => ErrorClass::Conflict,
            Self::InconsistentState(_) => ErrorClass::Internal,
            Self::Store(err) => store_class(err),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}

fn store_class(err: &StoreError) -> ErrorClass {
    match err {
        StoreError::NotFound { .. } => ErrorClass::NotFound,
        StoreError::Conflict { .. } => ErrorClass::Conflict,
        StoreError::Timeout => ErrorClass::Timeout,
        StoreError::Cancelled => ErrorClass::Cancelled,
        StoreError::MigrationFailed { source, .. } => store_class(source),
        _ => ErrorClass::Internal,
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Validation(message) => write!(f, "invalid input: {message}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

/// Checks the slug as it will be stored, i.e. trimmed.
pub(crate) fn validate_slug(value: &str) -> ServiceResult<()> {
    let value = value.trim();
    if !SLUG_RE.is_match(value) {
        return Err(ServiceError::Validation(format!(
            "slug `{value}` must be lowercase words joined by `-`"
        )));
    }
    Ok(())
}

pub(crate) fn validate_email(value: &str) -> ServiceResult<()> {
    if !EMAIL_RE.is_match(value) {
        return Err(ServiceError::Validation(format!(
            "email `{value}` is not a valid address"
        )));
    }
    Ok(())
}

pub(crate) fn validate_username(value: &str) -> ServiceResult<()> {
    if !USERNAME_RE.is_match(value) {
        return Err(ServiceError::Validation(format!(
            "username `{value}` must be 2-64 letters, digits, `_`, `.` or `-`"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        validate_email, validate_slug, validate_username, ErrorClass, ServiceError,
    };
    use crate::db::StoreError;

    #[test]
    fn slug_pattern_accepts_kebab_case_only() {
        assert!(validate_slug("hello-world-2").is_ok());
        assert!(validate_slug("Hello").is_err());
        assert!(validate_slug("hello--world").is_err());
        assert!(validate_slug("-hello").is_err());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("  padded-slug ").is_ok());
        assert!(validate_slug("two words").is_err());
    }

    #[test]
    fn email_and_username_patterns() {
        assert!(validate_email("ada@example.org").is_ok());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("a b@example.org").is_err());
        assert!(validate_username("ada.l").is_ok());
        assert!(validate_username("a").is_err());
        assert!(validate_username("ada lovelace").is_err());
    }

    #[test]
    fn store_errors_keep_their_class() {
        assert_eq!(ServiceError::from(StoreError::Timeout).class(), ErrorClass::Timeout);
        assert_eq!(
            ServiceError::from(StoreError::Cancelled).class(),
            ErrorClass::Cancelled
        );
        assert_eq!(
            ServiceError::from(StoreError::Conflict {
                collection: "posts",
                message: "slug taken".to_string(),
            })
            .class(),
            ErrorClass::Conflict
        );
        assert_eq!(
            ServiceError::Validation("bad".to_string()).class(),
            ErrorClass::Conflict
        );
        assert!(!ServiceError::Conflict("published".to_string()).is_retryable());
    }
}
