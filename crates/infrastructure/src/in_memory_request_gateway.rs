use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use opshub_application::{AuditEventQuery, RequestGateway};
use opshub_core::{AppError, AppResult};
use opshub_domain::{
    AuditEvent, AuditEventId, NewUser, ResultPage, Role, USER_ENTITY_TYPE, User, UserId,
    UserStatus,
};
use serde_json::json;
use tokio::sync::RwLock;

mod seed;

/// In-memory implementation of [`RequestGateway`] mirroring the backend's rules.
///
/// Every mutation appends an audit event the way the backend does, so the
/// audit listing reflects what happened in the users listing.
#[derive(Debug, Default)]
pub struct InMemoryRequestGateway {
    users: RwLock<Vec<User>>,
    audit_events: RwLock<Vec<AuditEvent>>,
    acting_user_id: Option<UserId>,
}

impl InMemoryRequestGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway populated with sample users and their audit history.
    #[must_use]
    pub fn with_demo_data() -> Self {
        Self {
            users: RwLock::new(seed::demo_users()),
            audit_events: RwLock::new(seed::demo_audit_events()),
            acting_user_id: None,
        }
    }

    /// Returns the gateway with audit events attributed to `user_id`.
    #[must_use]
    pub fn acting_as(mut self, user_id: Option<UserId>) -> Self {
        self.acting_user_id = user_id;
        self
    }

    async fn record_audit(&self, action: &str, user: &User, summary: String) {
        let mut events = self.audit_events.write().await;
        let id = events
            .iter()
            .map(|event| event.id.as_i64())
            .max()
            .unwrap_or(0)
            .saturating_add(1);

        events.push(AuditEvent {
            id: AuditEventId::new(id),
            occurred_at: Utc::now(),
            actor_user_id: self.acting_user_id,
            action: action.to_owned(),
            entity_type: USER_ENTITY_TYPE.to_owned(),
            entity_id: user.id.to_string(),
            summary,
            metadata: json!({ "email": user.email }),
        });
    }
}

#[async_trait]
impl RequestGateway for InMemoryRequestGateway {
    async fn list_users(&self, status: Option<UserStatus>) -> AppResult<Vec<User>> {
        let users = self.users.read().await;

        Ok(users
            .iter()
            .filter(|user| status.is_none_or(|status| user.status == status))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        let created = {
            let mut users = self.users.write().await;
            if users.iter().any(|existing| existing.email == user.email()) {
                return Err(AppError::Validation(format!(
                    "User with email already exists: {}",
                    user.email()
                )));
            }

            let id = users
                .iter()
                .map(|existing| existing.id.as_i64())
                .max()
                .unwrap_or(0)
                .saturating_add(1);
            let created = User {
                id: UserId::new(id),
                email: user.email().to_owned(),
                first_name: user.first_name().to_owned(),
                last_name: user.last_name().to_owned(),
                status: UserStatus::Active,
                role: Some(Role::User),
                created_at: Some(Utc::now()),
            };
            users.push(created.clone());
            created
        };

        self.record_audit(
            "USER_CREATED",
            &created,
            format!("User created: {}", created.email),
        )
        .await;

        Ok(created)
    }

    async fn set_user_enabled(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        let updated = {
            let mut users = self.users.write().await;
            let user = users
                .iter_mut()
                .find(|user| user.id == user_id)
                .ok_or_else(|| AppError::Server {
                    status: 404,
                    message: Some(format!("User not found: id={user_id}")),
                })?;
            user.status = if enabled {
                UserStatus::Active
            } else {
                UserStatus::Disabled
            };
            user.clone()
        };

        let (action, verb) = if enabled {
            ("USER_ENABLED", "enabled")
        } else {
            ("USER_DISABLED", "disabled")
        };
        self.record_audit(action, &updated, format!("User {verb}: {}", updated.email))
            .await;

        Ok(())
    }

    async fn list_audit_events(
        &self,
        query: &AuditEventQuery,
    ) -> AppResult<ResultPage<AuditEvent>> {
        let from = query.from.as_deref().and_then(parse_time_bound);
        let to = query.to.as_deref().and_then(parse_time_bound);

        let mut matching: Vec<AuditEvent> = self
            .audit_events
            .read()
            .await
            .iter()
            .filter(|event| {
                query
                    .entity_type
                    .as_deref()
                    .is_none_or(|value| event.entity_type == value)
                    && query
                        .entity_id
                        .as_deref()
                        .is_none_or(|value| event.entity_id == value)
                    && query
                        .action
                        .as_deref()
                        .is_none_or(|value| event.action == value)
                    && query
                        .actor_user_id
                        .is_none_or(|value| event.actor_user_id == Some(value))
                    && from.is_none_or(|bound| event.occurred_at >= bound)
                    && to.is_none_or(|bound| event.occurred_at <= bound)
            })
            .cloned()
            .collect();

        matching.sort_by(|left, right| {
            right
                .occurred_at
                .cmp(&left.occurred_at)
                .then_with(|| right.id.cmp(&left.id))
        });

        Ok(ResultPage::from_slice(matching, query.page))
    }
}

/// Accepts RFC 3339 timestamps and the `YYYY-MM-DDTHH:MM` form of date-time inputs.
fn parse_time_bound(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|value| Utc.from_utc_datetime(&value))
}

#[cfg(test)]
mod tests;
