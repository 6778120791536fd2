//! User domain types and validation rules.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use opshub_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::Role;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user identifier from the backend numeric key.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid user id '{value}'")))
    }
}

/// Account status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// User may sign in.
    Active,
    /// User is blocked.
    Disabled,
}

impl UserStatus {
    /// Returns the transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Disabled => "DISABLED",
        }
    }

    /// Returns the status a toggle action moves the user to.
    #[must_use]
    pub fn toggled(&self) -> Self {
        match self {
            Self::Active => Self::Disabled,
            Self::Disabled => Self::Active,
        }
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "DISABLED" => Ok(Self::Disabled),
            _ => Err(AppError::Validation(format!(
                "unknown user status '{value}'"
            ))),
        }
    }
}

/// User record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Account status.
    pub status: UserStatus,
    /// Assigned role, when the backend reports one.
    pub role: Option<Role>,
    /// Creation timestamp, when the backend reports one.
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns "first last" as shown in listings and used for name sorting.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_owned()
    }

    /// Returns whether the account is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Field of the create-user form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    /// Given name input.
    FirstName,
    /// Family name input.
    LastName,
    /// Email input.
    Email,
}

impl UserField {
    /// Returns the form label used in inline messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::Email => "email",
        }
    }
}

/// One failed rule on a create-user form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Offending field.
    pub field: UserField,
    /// Human-readable reason.
    pub message: String,
}

/// Raw create-user form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateUserInput {
    /// Given name as typed.
    pub first_name: String,
    /// Family name as typed.
    pub last_name: String,
    /// Email as typed.
    pub email: String,
}

/// Create-user payload that passed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    first_name: NonEmptyString,
    last_name: NonEmptyString,
    email: EmailAddress,
}

impl NewUser {
    /// Returns the given name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    /// Returns the family name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    /// Returns the normalized email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}

impl CreateUserInput {
    /// Validates every field and reports all violations at once.
    pub fn validate(&self) -> Result<NewUser, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        let first_name = NonEmptyString::new(self.first_name.as_str());
        if first_name.is_err() {
            violations.push(FieldViolation {
                field: UserField::FirstName,
                message: "first name is required".to_owned(),
            });
        }

        let last_name = NonEmptyString::new(self.last_name.as_str());
        if last_name.is_err() {
            violations.push(FieldViolation {
                field: UserField::LastName,
                message: "last name is required".to_owned(),
            });
        }

        let email = EmailAddress::new(self.email.as_str());
        if let Err(AppError::Validation(message)) = &email {
            violations.push(FieldViolation {
                field: UserField::Email,
                message: message.clone(),
            });
        }

        match (first_name, last_name, email) {
            (Ok(first_name), Ok(last_name), Ok(email)) if violations.is_empty() => Ok(NewUser {
                first_name,
                last_name,
                email,
            }),
            _ => Err(violations),
        }
    }
}
