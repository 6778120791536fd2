//! Shared primitives for all Rust crates in the operations hub console.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across operations hub crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    ///
    /// Surrounding whitespace is trimmed before the value is stored.
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

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// The backend could not be reached or returned no usable response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("server error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Server {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Human-readable message from the error payload, when present.
        message: Option<String>,
    },

    /// Invalid input for a create or mutate operation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The current session lacks the capability required for an action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A fetch resolved after a newer fetch superseded it.
    ///
    /// Only used between the list controller and its fetch driver.
    #[error("stale response discarded")]
    StaleResponseDiscarded,

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a single user-facing message.
    ///
    /// Backend messages win over the fallback; network failures keep the
    /// fallback and hint at connectivity.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Network(_) => format!("{fallback} (server unreachable)"),
            Self::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Validation(message) | Self::Forbidden(message) => message.clone(),
            Self::Server { .. } | Self::StaleResponseDiscarded | Self::Internal(_) => {
                fallback.to_owned()
            }
        }
    }

    /// Returns whether the error is the internal stale-response marker.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleResponseDiscarded)
    }
}
