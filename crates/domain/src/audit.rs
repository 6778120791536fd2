//! Audit event projections read from the backend audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::UserId;

/// Entity types the backend records audit events for.
pub const KNOWN_ENTITY_TYPES: &[&str] = &["USER", "TASK", "TEAM"];

/// Audit actions the backend emits.
pub const KNOWN_AUDIT_ACTIONS: &[&str] = &[
    "USER_CREATED",
    "USER_ENABLED",
    "USER_DISABLED",
    "TASK_CREATED",
    "TASK_ASSIGNED",
    "TASK_DONE",
];

/// Entity type label for user audit events.
pub const USER_ENTITY_TYPE: &str = "USER";

/// Unique identifier for an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditEventId(i64);

impl AuditEventId {
    /// Creates an audit event identifier from the backend numeric key.
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

impl std::fmt::Display for AuditEventId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// One immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Stable event identifier.
    pub id: AuditEventId,
    /// When the action happened.
    pub occurred_at: DateTime<Utc>,
    /// Acting user, absent for system actions.
    pub actor_user_id: Option<UserId>,
    /// Stable action identifier, e.g. `USER_DISABLED`.
    pub action: String,
    /// Type of the affected entity, e.g. `USER`.
    pub entity_type: String,
    /// Identifier of the affected entity.
    pub entity_id: String,
    /// Human-readable summary.
    pub summary: String,
    /// Opaque structured payload.
    pub metadata: Value,
}

impl AuditEvent {
    /// Returns the compact metadata text, or `None` when there is nothing to show.
    #[must_use]
    pub fn metadata_text(&self) -> Option<String> {
        match &self.metadata {
            Value::Null => None,
            Value::Object(map) if map.is_empty() => None,
            Value::String(raw) if raw.trim().is_empty() => None,
            Value::String(raw) => Some(raw.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Parses the metadata string shipped by the backend.
///
/// Text that is not valid JSON is kept verbatim as a JSON string.
#[must_use]
pub fn metadata_from_raw(raw: Option<&str>) -> Value {
    match raw.map(str::trim) {
        None | Some("") => Value::Null,
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::{AuditEvent, AuditEventId, metadata_from_raw};

    fn event_with(metadata: serde_json::Value) -> AuditEvent {
        AuditEvent {
            id: AuditEventId::new(1),
            occurred_at: Utc::now(),
            actor_user_id: None,
            action: "USER_CREATED".to_owned(),
            entity_type: "USER".to_owned(),
            entity_id: "4".to_owned(),
            summary: "User created: a@b.io".to_owned(),
            metadata,
        }
    }

    #[test]
    fn empty_object_metadata_has_no_text() {
        assert_eq!(event_with(json!({})).metadata_text(), None);
        assert_eq!(
            event_with(json!({ "email": "a@b.io" })).metadata_text(),
            Some("{\"email\":\"a@b.io\"}".to_owned())
        );
    }

    #[test]
    fn metadata_json_is_parsed() {
        let value = metadata_from_raw(Some("{\"email\":\"a@b.io\"}"));
        assert_eq!(value, json!({ "email": "a@b.io" }));
    }

    #[test]
    fn metadata_garbage_is_kept_as_text() {
        let value = metadata_from_raw(Some("not json"));
        assert_eq!(value, json!("not json"));
    }

    #[test]
    fn blank_metadata_is_null() {
        assert!(metadata_from_raw(Some("  ")).is_null());
        assert!(metadata_from_raw(None).is_null());
    }
}
