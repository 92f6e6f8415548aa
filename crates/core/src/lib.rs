//! Shared primitives for all Rust crates in Bottled Secrets.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Bottled Secrets crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
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

/// Typed error taxonomy returned by the authorization and custody core.
///
/// Every failure mode here is recoverable and surfaced to the caller; the
/// core never aborts for expected conditions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced identity, folder, or secret does not exist or is inactive.
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// An active folder already holds the requested path.
    #[error("duplicate folder path: {0}")]
    DuplicatePath(String),

    /// Caller lacks the role or permission required for the operation.
    #[error("insufficient permissions: {0}")]
    InsufficientPermissions(String),

    /// An administrator may not grant the Administrator role to themselves.
    #[error("cannot assign the administrator role to yourself")]
    SelfElevationDenied,

    /// An administrator may not remove their own Administrator role.
    #[error("cannot remove the administrator role from yourself")]
    SelfDemotionDenied,

    /// Ciphertext failed authentication: wrong key or corruption.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
