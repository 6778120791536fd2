use async_trait::async_trait;
use opshub_core::AppResult;
use opshub_domain::{
    AuditEvent, FilterKey, NewUser, PageSpec, QueryState, ResultPage, User, UserId, UserStatus,
};

/// Audit log search parameters derived from a listing's [`QueryState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEventQuery {
    /// Optional entity type filter.
    pub entity_type: Option<String>,
    /// Optional entity identifier filter.
    pub entity_id: Option<String>,
    /// Optional action filter.
    pub action: Option<String>,
    /// Optional acting user filter.
    pub actor_user_id: Option<UserId>,
    /// Optional lower time bound, passed through verbatim.
    pub from: Option<String>,
    /// Optional upper time bound, passed through verbatim.
    pub to: Option<String>,
    /// Requested page.
    pub page: PageSpec,
}

impl AuditEventQuery {
    /// Derives search parameters 1:1 from a query state.
    #[must_use]
    pub fn from_state(state: &QueryState) -> Self {
        let text = |key: FilterKey| state.filters.text(key).map(str::to_owned);

        Self {
            entity_type: text(FilterKey::EntityType),
            entity_id: text(FilterKey::EntityId),
            action: text(FilterKey::Action),
            actor_user_id: state.filters.number(FilterKey::ActorUserId).map(UserId::new),
            from: text(FilterKey::From),
            to: text(FilterKey::To),
            page: state.page,
        }
    }
}

/// Port for the operations hub REST backend.
#[async_trait]
pub trait RequestGateway: Send + Sync {
    /// Lists users, optionally restricted to one status.
    async fn list_users(&self, status: Option<UserStatus>) -> AppResult<Vec<User>>;

    /// Creates a user from a validated payload.
    async fn create_user(&self, user: &NewUser) -> AppResult<User>;

    /// Enables or disables a user.
    async fn set_user_enabled(&self, user_id: UserId, enabled: bool) -> AppResult<()>;

    /// Lists one page of audit events, newest first.
    async fn list_audit_events(
        &self,
        query: &AuditEventQuery,
    ) -> AppResult<ResultPage<AuditEvent>>;
}

/// Port for the address that mirrors a listing's query state.
///
/// Implementations hold the query string only, without the leading `?`.
pub trait LocationPort: Send + Sync {
    /// Returns the current query string.
    fn current_query(&self) -> String;

    /// Replaces the current history entry.
    fn replace_query(&self, query: &str);

    /// Pushes a new history entry.
    fn push_query(&self, query: &str);
}
