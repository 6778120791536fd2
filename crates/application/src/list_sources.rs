use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use opshub_core::AppResult;
use opshub_domain::{
    AuditEvent, FilterKey, QueryDefaults, QueryState, ResultPage, SortDirection, SortField,
    SortSpec, USER_ENTITY_TYPE, User, UserId, UserStatus,
};

use crate::{AuditEventQuery, RequestGateway};

/// Fetches one page of a listing for a query state.
#[async_trait]
pub trait ListSource: Send + Sync {
    /// Row type of the listing.
    type Item: Clone + Send + Sync + 'static;

    /// Fetches the page described by `query`.
    async fn fetch(&self, query: &QueryState) -> AppResult<ResultPage<Self::Item>>;
}

/// Users listing backed by [`RequestGateway::list_users`].
///
/// The backend returns the whole collection and may ignore the status
/// parameter, so status filtering, ordering and pagination happen here.
#[derive(Clone)]
pub struct UserListSource {
    gateway: Arc<dyn RequestGateway>,
}

impl UserListSource {
    /// Creates a users listing source.
    #[must_use]
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self { gateway }
    }

    /// Returns the status constraint encoded in `query`.
    ///
    /// Any value other than a known status (for instance `ALL`) means "every status".
    #[must_use]
    pub fn status_filter(query: &QueryState) -> Option<UserStatus> {
        query
            .filters
            .text(FilterKey::Status)
            .and_then(|value| UserStatus::from_str(value).ok())
    }
}

#[async_trait]
impl ListSource for UserListSource {
    type Item = User;

    async fn fetch(&self, query: &QueryState) -> AppResult<ResultPage<User>> {
        let status = Self::status_filter(query);
        let mut users = self.gateway.list_users(status).await?;
        users.retain(|user| status.is_none_or(|status| user.status == status));
        sort_users(&mut users, query.sort);

        Ok(ResultPage::from_slice(users, query.page))
    }
}

fn sort_users(users: &mut [User], sort: SortSpec) {
    users.sort_by(|left, right| {
        let ordering = match sort.field {
            SortField::Name => left
                .display_name()
                .to_lowercase()
                .cmp(&right.display_name().to_lowercase()),
            SortField::Email => left.email.to_lowercase().cmp(&right.email.to_lowercase()),
            SortField::CreatedAt => left.created_at.cmp(&right.created_at),
            SortField::OccurredAt => Ordering::Equal,
        }
        .then_with(|| left.id.cmp(&right.id));

        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Audit log listing backed by [`RequestGateway::list_audit_events`].
#[derive(Clone)]
pub struct AuditListSource {
    gateway: Arc<dyn RequestGateway>,
}

impl AuditListSource {
    /// Creates an audit listing source.
    #[must_use]
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self { gateway }
    }

    /// Returns the audit view scoped to one user's history.
    pub fn query_for_user(user_id: UserId) -> AppResult<QueryState> {
        let mut state = QueryDefaults::audit().initial_state();
        state.filters.set(FilterKey::EntityType, USER_ENTITY_TYPE)?;
        state
            .filters
            .set(FilterKey::EntityId, user_id.to_string().as_str())?;
        Ok(state)
    }
}

#[async_trait]
impl ListSource for AuditListSource {
    type Item = AuditEvent;

    async fn fetch(&self, query: &QueryState) -> AppResult<ResultPage<AuditEvent>> {
        self.gateway
            .list_audit_events(&AuditEventQuery::from_state(query))
            .await
    }
}
