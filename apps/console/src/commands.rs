use std::sync::Arc;

use opshub_application::{
    ApplyPolicy, AuditListSource, HistoryPolicy, ListController, ListControllerConfig, ListSource,
    RequestGateway, RowActionOutcome, Session, TableIntent, UserRowAction, UsersPage,
};
use opshub_core::AppResult;
use opshub_domain::{CreateUserInput, FilterKey, QueryDefaults, QueryStateCodec, SortField, UserId};
use opshub_infrastructure::InMemoryLocation;
use tracing::debug;

use crate::cli::{AuditArgs, ListingArgs, UsersAction, UsersArgs};
use crate::render::{audit_columns, render_table, user_columns};

/// Runs listing commands against one gateway and session.
pub struct Console {
    gateway: Arc<dyn RequestGateway>,
    session: Session,
    history_policy: HistoryPolicy,
}

impl Console {
    pub fn new(
        gateway: Arc<dyn RequestGateway>,
        session: Session,
        history_policy: HistoryPolicy,
    ) -> Self {
        Self {
            gateway,
            session,
            history_policy,
        }
    }

    pub async fn users(&self, args: UsersArgs) -> AppResult<String> {
        let location = Arc::new(InMemoryLocation::new(
            args.listing.query.clone().unwrap_or_default(),
        ));
        let page = UsersPage::new(
            self.gateway.clone(),
            location,
            self.session.clone(),
            ListControllerConfig::users().with_history_policy(self.history_policy),
        );
        let controller = page.controller();

        controller.open().await;
        if let Some(status) = args.status.as_deref() {
            controller.set_filter(FilterKey::Status, status).await?;
        }
        apply_listing(controller, &args.listing).await?;

        let mut output = Vec::new();
        match args.action {
            Some(UsersAction::Create {
                first_name,
                last_name,
                email,
            }) => {
                let input = CreateUserInput {
                    first_name,
                    last_name,
                    email,
                };
                output.push(match page.create_user(&input).await {
                    Ok(user) => format!("Created user {} <{}>", user.id, user.email),
                    Err(error) => format!("Error: {error}"),
                });
            }
            Some(UsersAction::Toggle { user_id }) => {
                let action = UserRowAction::ToggleStatus(UserId::new(user_id));
                output.push(self.row_action(&page, action).await);
            }
            Some(UsersAction::History { user_id }) => {
                let action = UserRowAction::OpenAudit(UserId::new(user_id));
                match page.handle_row_action(action).await {
                    Ok(RowActionOutcome::NavigateToAudit(query)) => {
                        controller.teardown().await;
                        return self.audit_listing(query, &AuditArgs::default()).await;
                    }
                    Ok(outcome) => output.push(format!("{outcome:?}")),
                    Err(error) => output.push(format!("Error: {error}")),
                }
            }
            None => {}
        }

        output.push(render_table(&controller.table_props().await, &user_columns()));
        output.push(format!("query: {}", controller.query_string().await));
        controller.teardown().await;

        Ok(output.join("\n\n"))
    }

    pub async fn audit(&self, args: AuditArgs) -> AppResult<String> {
        let query = match args.user_id {
            Some(user_id) => {
                let state = AuditListSource::query_for_user(UserId::new(user_id))?;
                QueryStateCodec::new(QueryDefaults::audit()).encode(&state)
            }
            None => args.listing.query.clone().unwrap_or_default(),
        };

        self.audit_listing(query, &args).await
    }

    async fn audit_listing(&self, query: String, args: &AuditArgs) -> AppResult<String> {
        let controller = ListController::new(
            AuditListSource::new(self.gateway.clone()),
            Arc::new(InMemoryLocation::new(query)),
            ListControllerConfig::audit()
                .with_apply_policy(ApplyPolicy::Deferred)
                .with_history_policy(self.history_policy),
        );

        controller.open().await;

        let edits = [
            (FilterKey::EntityType, args.entity_type.as_deref()),
            (FilterKey::EntityId, args.entity_id.as_deref()),
            (FilterKey::Action, args.action.as_deref()),
            (FilterKey::ActorUserId, args.actor_user_id.as_deref()),
            (FilterKey::From, args.from.as_deref()),
            (FilterKey::To, args.to.as_deref()),
        ];
        let mut edited = false;
        for (key, raw) in edits {
            if let Some(raw) = raw {
                controller.set_filter(key, raw).await?;
                edited = true;
            }
        }
        if edited {
            controller.apply().await?;
        }
        apply_listing(&controller, &args.listing).await?;

        let output = [
            render_table(&controller.table_props().await, &audit_columns()),
            format!("query: {}", controller.query_string().await),
        ];
        controller.teardown().await;

        Ok(output.join("\n\n"))
    }

    async fn row_action(&self, page: &UsersPage, action: UserRowAction) -> String {
        match page.handle_row_action(action).await {
            Ok(RowActionOutcome::StatusChanged { user_id, status }) => {
                format!("User {user_id} is now {}", status.as_str())
            }
            Ok(outcome) => format!("{outcome:?}"),
            Err(error) => format!("Error: {error}"),
        }
    }
}

async fn apply_listing<S: ListSource>(
    controller: &ListController<S>,
    listing: &ListingArgs,
) -> AppResult<()> {
    for raw in &listing.sort {
        let field = raw.parse::<SortField>()?;
        controller.dispatch::<()>(TableIntent::Sort(field)).await?;
    }

    if let Some(size) = listing.size {
        controller.dispatch::<()>(TableIntent::PageSizeChange(size)).await?;
    }

    if let Some(page) = listing.page {
        controller
            .dispatch::<()>(TableIntent::PageChange(page.saturating_sub(1)))
            .await?;
    }

    debug!(listing = controller.config().listing, "listing controls applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use opshub_application::{HistoryPolicy, RequestGateway, Session};
    use opshub_domain::UserId;
    use opshub_infrastructure::InMemoryRequestGateway;

    use super::Console;
    use crate::cli::{AuditArgs, ListingArgs, UsersAction, UsersArgs};

    async fn console() -> Console {
        let gateway: Arc<dyn RequestGateway> = Arc::new(
            InMemoryRequestGateway::with_demo_data().acting_as(Some(UserId::new(1))),
        );
        let session = Session::resolve(gateway.as_ref(), Some(UserId::new(1)))
            .await
            .unwrap_or_else(|_| panic!("test"));
        Console::new(gateway, session, HistoryPolicy::Replace)
    }

    fn users_args(status: Option<&str>, action: Option<UsersAction>) -> UsersArgs {
        UsersArgs {
            listing: ListingArgs::default(),
            status: status.map(str::to_owned),
            action,
        }
    }

    #[tokio::test]
    async fn disabled_users_are_listed_by_name() {
        let output = console()
            .await
            .users(users_args(Some("DISABLED"), None))
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert!(output.contains("Edsger Dijkstra"));
        assert!(output.contains("Margaret Hamilton"));
        assert!(!output.contains("Ada Lovelace"));
        assert!(output.ends_with("query: page=0&size=20&status=DISABLED&sort=name&order=asc"));
    }

    #[tokio::test]
    async fn toggle_reports_new_status_and_shows_it() {
        let output = console()
            .await
            .users(users_args(None, Some(UsersAction::Toggle { user_id: 4 })))
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert!(output.starts_with("User 4 is now ACTIVE"));
    }

    #[tokio::test]
    async fn invalid_create_input_is_reported_inline() {
        let output = console()
            .await
            .users(users_args(
                None,
                Some(UsersAction::Create {
                    first_name: String::new(),
                    last_name: "Doe".to_owned(),
                    email: "not-an-email".to_owned(),
                }),
            ))
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert!(output.starts_with("Error: invalid input"));
    }

    #[tokio::test]
    async fn user_history_opens_audit_listing() {
        let output = console()
            .await
            .users(users_args(None, Some(UsersAction::History { user_id: 7 })))
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert!(output.contains("USER_DISABLED"));
        assert!(output.ends_with(
            "query: entityType=USER&entityId=7&page=0&size=20&sort=occurredAt&order=desc"
        ));
    }

    #[tokio::test]
    async fn audit_filters_are_applied_together() {
        let args = AuditArgs {
            action: Some("USER_DISABLED".to_owned()),
            ..AuditArgs::default()
        };

        let output = console()
            .await
            .audit(args)
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert!(output.contains("USER_DISABLED"));
        assert!(!output.contains("USER_CREATED"));
    }

    #[tokio::test]
    async fn unknown_sort_field_is_rejected() {
        let mut args = users_args(None, None);
        args.listing.sort = vec!["role".to_owned()];

        let result = console().await.users(args).await;

        assert!(result.is_err());
    }
}
