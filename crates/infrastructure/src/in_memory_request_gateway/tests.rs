use opshub_application::{AuditEventQuery, RequestGateway};
use opshub_core::AppError;
use opshub_domain::{CreateUserInput, PageSpec, UserId, UserStatus};

use super::{InMemoryRequestGateway, parse_time_bound};

fn audit_query() -> AuditEventQuery {
    AuditEventQuery {
        entity_type: None,
        entity_id: None,
        action: None,
        actor_user_id: None,
        from: None,
        to: None,
        page: PageSpec::first(),
    }
}

fn new_user(email: &str) -> opshub_domain::NewUser {
    CreateUserInput {
        first_name: "Dana".to_owned(),
        last_name: "Scully".to_owned(),
        email: email.to_owned(),
    }
    .validate()
    .unwrap_or_else(|_| panic!("test"))
}

#[tokio::test]
async fn status_filter_narrows_demo_users() {
    let gateway = InMemoryRequestGateway::with_demo_data();

    let all = gateway.list_users(None).await.unwrap_or_default();
    let disabled = gateway
        .list_users(Some(UserStatus::Disabled))
        .await
        .unwrap_or_default();

    assert_eq!(all.len(), 8);
    assert_eq!(disabled.len(), 2);
    assert!(disabled.iter().all(|user| !user.is_active()));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let gateway = InMemoryRequestGateway::new();
    let first = gateway.create_user(&new_user("dana@opshub.dev")).await;
    assert!(first.is_ok());

    let second = gateway.create_user(&new_user("dana@opshub.dev")).await;

    assert_eq!(
        second,
        Err(AppError::Validation(
            "User with email already exists: dana@opshub.dev".to_owned()
        ))
    );
}

#[tokio::test]
async fn mutations_are_audited_newest_first() {
    let gateway = InMemoryRequestGateway::new().acting_as(Some(UserId::new(1)));
    let created = gateway
        .create_user(&new_user("dana@opshub.dev"))
        .await
        .unwrap_or_else(|_| panic!("test"));
    gateway
        .set_user_enabled(created.id, false)
        .await
        .unwrap_or_else(|_| panic!("test"));

    let page = gateway
        .list_audit_events(&audit_query())
        .await
        .unwrap_or_else(|_| panic!("test"));

    let actions: Vec<_> = page.items.iter().map(|event| event.action.as_str()).collect();
    assert_eq!(actions, vec!["USER_DISABLED", "USER_CREATED"]);
    assert!(
        page.items
            .iter()
            .all(|event| event.actor_user_id == Some(UserId::new(1)))
    );
    assert_eq!(
        page.items[0].metadata_text(),
        Some("{\"email\":\"dana@opshub.dev\"}".to_owned())
    );
}

#[tokio::test]
async fn toggling_unknown_user_is_not_found() {
    let gateway = InMemoryRequestGateway::new();

    let result = gateway.set_user_enabled(UserId::new(42), true).await;

    assert!(matches!(result, Err(AppError::Server { status: 404, .. })));
}

#[tokio::test]
async fn audit_filters_and_pagination_apply() {
    let gateway = InMemoryRequestGateway::with_demo_data();

    let mut by_user = audit_query();
    by_user.entity_type = Some("USER".to_owned());
    by_user.entity_id = Some("4".to_owned());
    let history = gateway
        .list_audit_events(&by_user)
        .await
        .unwrap_or_else(|_| panic!("test"));
    let actions: Vec<_> = history.items.iter().map(|event| event.action.as_str()).collect();
    assert_eq!(actions, vec!["USER_DISABLED", "USER_CREATED"]);

    let mut paged = audit_query();
    paged.page = PageSpec::new(1, 10).unwrap_or_else(|_| panic!("test"));
    let second_page = gateway
        .list_audit_events(&paged)
        .await
        .unwrap_or_else(|_| panic!("test"));
    assert_eq!(second_page.total_count, 10);
    assert!(second_page.is_empty());

    let mut ranged = audit_query();
    ranged.from = Some("2025-01-13T00:00".to_owned());
    let recent = gateway
        .list_audit_events(&ranged)
        .await
        .unwrap_or_else(|_| panic!("test"));
    let entity_ids: Vec<_> = recent.items.iter().map(|event| event.entity_id.as_str()).collect();
    assert_eq!(entity_ids, vec!["8", "7", "7"]);
}

#[test]
fn time_bounds_accept_rfc3339_and_local_inputs() {
    assert!(parse_time_bound("2025-01-13T00:00:00Z").is_some());
    assert!(parse_time_bound("2025-01-13T00:00").is_some());
    assert!(parse_time_bound("yesterday").is_none());
}
