//! Shared primitives for all Rust crates in Sealworks.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{Identity, Principal, Role, ServiceIdentity};

/// Result type used across Sealworks crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string, stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
///
/// Handlers match on the variant to pick a stable wire code, so each
/// variant maps to one sentinel condition raised by services.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation is not allowed from the resource's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Resource cannot be removed while other records still reference it.
    #[error("in use: {0}")]
    InUse(String),

    /// A bounded sequence has no values left.
    #[error("exhausted: {0}")]
    Exhausted(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A collaborator is missing or temporarily unreachable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The request deadline elapsed before the operation finished.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The caller went away before the operation finished.
    #[error("canceled: {0}")]
    Canceled(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
