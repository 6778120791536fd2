use std::sync::Arc;

use opshub_core::AppError;
use opshub_domain::{
    Capability, CreateUserInput, FieldViolation, QueryDefaults, QueryStateCodec, User, UserId,
    UserStatus,
};
use tracing::info;

use crate::{
    AuditListSource, ListController, ListControllerConfig, LocationPort, RequestGateway,
    Session, UserListSource,
};

/// Row action of the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRowAction {
    /// Open the audit log scoped to the user.
    OpenAudit(UserId),
    /// Enable a disabled user or disable an active one.
    ToggleStatus(UserId),
}

/// Error returned inline by a user mutation.
///
/// Mutation errors never replace the listing's view state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Client-side validation failed on one or more form fields.
    #[error("invalid input: {}", describe_violations(.0))]
    Fields(Vec<FieldViolation>),
    /// The mutation was refused or failed.
    #[error("{message}")]
    Rejected {
        /// User-facing message.
        message: String,
        /// Underlying failure.
        source: AppError,
    },
}

impl MutationError {
    fn rejected(source: AppError, fallback: &str) -> Self {
        Self::Rejected {
            message: source.user_message(fallback),
            source,
        }
    }
}

fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{}: {}", violation.field.label(), violation.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of handling a [`UserRowAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowActionOutcome {
    /// Query string of the audit listing to navigate to.
    NavigateToAudit(String),
    /// The user's status after the toggle.
    StatusChanged {
        /// Toggled user.
        user_id: UserId,
        /// New status.
        status: UserStatus,
    },
}

/// Users listing plus the administrative actions offered next to it.
pub struct UsersPage {
    controller: ListController<UserListSource>,
    gateway: Arc<dyn RequestGateway>,
    session: Session,
}

impl UsersPage {
    /// Creates the page; call [`ListController::open`] on
    /// [`UsersPage::controller`] to load it.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn RequestGateway>,
        location: Arc<dyn LocationPort>,
        session: Session,
        config: ListControllerConfig,
    ) -> Self {
        let controller = ListController::new(UserListSource::new(gateway.clone()), location, config);

        Self {
            controller,
            gateway,
            session,
        }
    }

    /// Returns the listing controller.
    #[must_use]
    pub fn controller(&self) -> &ListController<UserListSource> {
        &self.controller
    }

    /// Returns the acting session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Validates and creates a user, then refreshes the listing.
    pub async fn create_user(&self, input: &CreateUserInput) -> Result<User, MutationError> {
        let new_user = input.validate().map_err(MutationError::Fields)?;

        let created = self
            .gateway
            .create_user(&new_user)
            .await
            .map_err(|error| MutationError::rejected(error, "Failed to create user"))?;

        info!(user_id = %created.id, email = %created.email, "user created");
        self.controller.refresh().await;

        Ok(created)
    }

    /// Flips a user's status, then refreshes the listing.
    ///
    /// Requires [`Capability::ManageUsers`].
    pub async fn toggle_status(&self, user: &User) -> Result<UserStatus, MutationError> {
        const FAILURE: &str = "Failed to update user status";

        self.session
            .require(Capability::ManageUsers)
            .map_err(|error| MutationError::rejected(error, FAILURE))?;

        let next = user.status.toggled();
        self.gateway
            .set_user_enabled(user.id, next == UserStatus::Active)
            .await
            .map_err(|error| MutationError::rejected(error, FAILURE))?;

        info!(user_id = %user.id, status = next.as_str(), "user status changed");
        self.controller.refresh().await;

        Ok(next)
    }

    /// Handles a row action of the users table.
    pub async fn handle_row_action(
        &self,
        action: UserRowAction,
    ) -> Result<RowActionOutcome, MutationError> {
        match action {
            UserRowAction::OpenAudit(user_id) => {
                let query = AuditListSource::query_for_user(user_id)
                    .map_err(|error| MutationError::rejected(error, "Failed to open audit"))?;
                let encoded = QueryStateCodec::new(QueryDefaults::audit()).encode(&query);

                Ok(RowActionOutcome::NavigateToAudit(encoded))
            }
            UserRowAction::ToggleStatus(user_id) => {
                let user = self.find_user(user_id).await?;
                let status = self.toggle_status(&user).await?;

                Ok(RowActionOutcome::StatusChanged { user_id, status })
            }
        }
    }

    async fn find_user(&self, user_id: UserId) -> Result<User, MutationError> {
        let loaded = self
            .controller
            .table_props()
            .await
            .rows
            .into_iter()
            .find(|user| user.id == user_id);
        if let Some(user) = loaded {
            return Ok(user);
        }

        self.gateway
            .list_users(None)
            .await
            .and_then(|users| {
                users
                    .into_iter()
                    .find(|user| user.id == user_id)
                    .ok_or_else(|| AppError::Validation(format!("user '{user_id}' does not exist")))
            })
            .map_err(|error| MutationError::rejected(error, "Failed to update user status"))
    }
}
