use chrono::{DateTime, Utc};
use opshub_domain::{
    AuditEvent, AuditEventId, NewUser, ResultPage, Role, User, UserId, UserStatus,
    metadata_from_raw,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserResponse {
    id: i64,
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    status: UserStatus,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<UserResponse> for User {
    fn from(value: UserResponse) -> Self {
        Self {
            id: UserId::new(value.id),
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            status: value.status,
            role: value.role,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateUserRequest<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
}

impl<'a> From<&'a NewUser> for CreateUserRequest<'a> {
    fn from(value: &'a NewUser) -> Self {
        Self {
            first_name: value.first_name(),
            last_name: value.last_name(),
            email: value.email(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuditEventResponse {
    id: i64,
    occurred_at: DateTime<Utc>,
    #[serde(default)]
    actor_user_id: Option<i64>,
    action: String,
    entity_type: String,
    entity_id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    metadata: Value,
}

impl From<AuditEventResponse> for AuditEvent {
    fn from(value: AuditEventResponse) -> Self {
        // The backend stores metadata as a JSON document inside a string column.
        let metadata = match value.metadata {
            Value::String(raw) => metadata_from_raw(Some(raw.as_str())),
            other => other,
        };

        Self {
            id: AuditEventId::new(value.id),
            occurred_at: value.occurred_at,
            actor_user_id: value.actor_user_id.map(UserId::new),
            action: value.action,
            entity_type: value.entity_type,
            entity_id: value.entity_id,
            summary: value.summary.unwrap_or_default(),
            metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PageResponse<T> {
    content: Vec<T>,
    total_elements: usize,
    number: usize,
    size: usize,
}

impl<T> PageResponse<T> {
    pub(super) fn into_result_page<U>(self) -> ResultPage<U>
    where
        U: From<T>,
    {
        ResultPage {
            items: self.content,
            total_count: self.total_elements,
            page_index: self.number,
            page_size: self.size,
        }
        .map(U::from)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorResponse {
    #[serde(default)]
    pub(super) message: Option<String>,
}
