use std::str::FromStr;

use opshub_core::AppError;
use serde::{Deserialize, Serialize};

/// Role assigned to a user by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Team management access.
    Manager,
    /// Regular member.
    User,
}

impl Role {
    /// Returns the transport value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::User => "USER",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "USER" => Ok(Self::User),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// Actions gated by the current session's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Allows enabling and disabling users.
    ManageUsers,
    /// Allows creating tasks.
    CreateTasks,
    /// Allows assigning tasks to users.
    AssignTasks,
}

impl Capability {
    /// Returns a stable value for logs and messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageUsers => "users.manage",
            Self::CreateTasks => "tasks.create",
            Self::AssignTasks => "tasks.assign",
        }
    }
}

/// Returns whether `role` grants `capability`.
///
/// A missing role grants nothing.
#[must_use]
pub fn has_capability(role: Option<Role>, capability: Capability) -> bool {
    match (role, capability) {
        (Some(Role::Admin), _) => true,
        (Some(Role::Manager), Capability::CreateTasks | Capability::AssignTasks) => true,
        _ => false,
    }
}
