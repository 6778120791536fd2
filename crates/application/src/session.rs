use opshub_core::{AppError, AppResult};
use opshub_domain::{Capability, Role, User, UserId, has_capability};
use tracing::info;

use crate::RequestGateway;

/// Read-only view of who is operating the console.
///
/// Resolved once at start-up and passed explicitly to every action that is
/// gated by a capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current_user: Option<User>,
}

impl Session {
    /// Session without an acting user; grants no capability.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session acting as `user`.
    #[must_use]
    pub fn for_user(user: User) -> Self {
        Self {
            current_user: Some(user),
        }
    }

    /// Looks up the acting user through the gateway.
    pub async fn resolve(
        gateway: &dyn RequestGateway,
        user_id: Option<UserId>,
    ) -> AppResult<Self> {
        let Some(user_id) = user_id else {
            return Ok(Self::anonymous());
        };

        let user = gateway
            .list_users(None)
            .await?
            .into_iter()
            .find(|user| user.id == user_id)
            .ok_or_else(|| {
                AppError::Validation(format!("acting user '{user_id}' does not exist"))
            })?;

        info!(
            user_id = %user.id,
            role = user.role.map(|role| role.as_str()).unwrap_or("none"),
            "session resolved"
        );

        Ok(Self::for_user(user))
    }

    /// Returns the acting user.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Returns the acting user's role.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.current_user.as_ref().and_then(|user| user.role)
    }

    /// Returns whether the session grants `capability`.
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        has_capability(self.role(), capability)
    }

    /// Ensures the session grants `capability`.
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.can(capability) {
            return Ok(());
        }

        let who = self
            .current_user
            .as_ref()
            .map(|user| format!("user '{}'", user.id))
            .unwrap_or_else(|| "anonymous session".to_owned());

        Err(AppError::Forbidden(format!(
            "{who} is missing capability '{}'",
            capability.as_str()
        )))
    }
}
