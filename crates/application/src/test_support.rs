use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::{Mutex, oneshot};

use opshub_core::{AppError, AppResult};
use opshub_domain::{
    AuditEvent, AuditEventId, NewUser, ResultPage, Role, User, UserId, UserStatus,
};

use crate::{AuditEventQuery, LocationPort, RequestGateway};

pub(crate) fn user(id: i64, first_name: &str, last_name: &str, status: UserStatus) -> User {
    User {
        id: UserId::new(id),
        email: format!("{}.{}@opshub.test", first_name, last_name).to_lowercase(),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        status,
        role: Some(Role::User),
        created_at: Utc.timestamp_opt(1_700_000_000 + id * 60, 0).single(),
    }
}

pub(crate) fn admin(id: i64) -> User {
    User {
        role: Some(Role::Admin),
        ..user(id, "Ada", "Admin", UserStatus::Active)
    }
}

pub(crate) fn audit_event(id: i64, action: &str, entity_id: &str) -> AuditEvent {
    AuditEvent {
        id: AuditEventId::new(id),
        occurred_at: Utc
            .timestamp_opt(1_700_000_000 + id * 60, 0)
            .single()
            .unwrap_or_else(|| panic!("test")),
        actor_user_id: Some(UserId::new(1)),
        action: action.to_owned(),
        entity_type: "USER".to_owned(),
        entity_id: entity_id.to_owned(),
        summary: format!("{action} on {entity_id}"),
        metadata: serde_json::Value::Null,
    }
}

/// Gateway double that records calls and can hold responses until released.
#[derive(Default)]
pub(crate) struct FakeGateway {
    pub users: Mutex<Vec<User>>,
    pub audit_page: Mutex<Option<ResultPage<AuditEvent>>>,
    pub list_users_calls: Mutex<Vec<Option<UserStatus>>>,
    pub audit_queries: Mutex<Vec<AuditEventQuery>>,
    pub created: Mutex<Vec<NewUser>>,
    pub toggles: Mutex<Vec<(UserId, bool)>>,
    pub fail_next: Mutex<Option<AppError>>,
    pub gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    /// Returns every user whatever status is asked for, like the real backend.
    pub ignores_status: bool,
}

impl FakeGateway {
    pub(crate) fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    /// Queues a gate; the next list call blocks until the returned sender fires.
    pub(crate) async fn hold_next(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.gates.lock().await.push_back(receiver);
        sender
    }

    pub(crate) async fn fail_next_with(&self, error: AppError) {
        *self.fail_next.lock().await = Some(error);
    }

    pub(crate) async fn list_calls(&self) -> usize {
        self.list_users_calls.lock().await.len() + self.audit_queries.lock().await.len()
    }

    async fn wait_gate_and_failure(&self) -> AppResult<()> {
        let gate = self.gates.lock().await.pop_front();
        let failure = self.fail_next.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RequestGateway for FakeGateway {
    async fn list_users(&self, status: Option<UserStatus>) -> AppResult<Vec<User>> {
        self.list_users_calls.lock().await.push(status);
        let snapshot = self.users.lock().await.clone();
        self.wait_gate_and_failure().await?;

        Ok(snapshot
            .into_iter()
            .filter(|user| {
                self.ignores_status || status.is_none_or(|status| user.status == status)
            })
            .collect())
    }

    async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        if let Some(error) = self.fail_next.lock().await.take() {
            return Err(error);
        }

        let mut users = self.users.lock().await;
        let id = users.iter().map(|user| user.id.as_i64()).max().unwrap_or(0) + 1;
        let created = User {
            id: UserId::new(id),
            email: user.email().to_owned(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            status: UserStatus::Active,
            role: Some(Role::User),
            created_at: None,
        };
        users.push(created.clone());
        self.created.lock().await.push(user.clone());

        Ok(created)
    }

    async fn set_user_enabled(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        if let Some(error) = self.fail_next.lock().await.take() {
            return Err(error);
        }

        self.toggles.lock().await.push((user_id, enabled));
        let mut users = self.users.lock().await;
        let user = users
            .iter_mut()
            .find(|user| user.id == user_id)
            .ok_or_else(|| AppError::Server {
                status: 404,
                message: Some(format!("User not found: {user_id}")),
            })?;
        user.status = if enabled {
            UserStatus::Active
        } else {
            UserStatus::Disabled
        };

        Ok(())
    }

    async fn list_audit_events(
        &self,
        query: &AuditEventQuery,
    ) -> AppResult<ResultPage<AuditEvent>> {
        self.audit_queries.lock().await.push(query.clone());
        let page = self.audit_page.lock().await.clone();
        self.wait_gate_and_failure().await?;

        Ok(page.unwrap_or_else(|| ResultPage::empty(query.page)))
    }
}

/// Location double keeping every write in order.
#[derive(Default)]
pub(crate) struct FakeLocation {
    pub current: StdMutex<String>,
    pub writes: StdMutex<Vec<(&'static str, String)>>,
}

impl FakeLocation {
    pub(crate) fn at(query: &str) -> Self {
        Self {
            current: StdMutex::new(query.to_owned()),
            writes: StdMutex::new(Vec::new()),
        }
    }

    pub(crate) fn writes(&self) -> Vec<(&'static str, String)> {
        self.writes
            .lock()
            .unwrap_or_else(|_| panic!("test"))
            .clone()
    }
}

impl LocationPort for FakeLocation {
    fn current_query(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(|_| panic!("test"))
            .clone()
    }

    fn replace_query(&self, query: &str) {
        *self.current.lock().unwrap_or_else(|_| panic!("test")) = query.to_owned();
        self.writes
            .lock()
            .unwrap_or_else(|_| panic!("test"))
            .push(("replace", query.to_owned()));
    }

    fn push_query(&self, query: &str) {
        *self.current.lock().unwrap_or_else(|_| panic!("test")) = query.to_owned();
        self.writes
            .lock()
            .unwrap_or_else(|_| panic!("test"))
            .push(("push", query.to_owned()));
    }
}
