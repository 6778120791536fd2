use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use opshub_application::{AuditEventQuery, RequestGateway};
use opshub_core::AppError;
use opshub_domain::{CreateUserInput, PageSpec, Role, UserId, UserStatus};

use super::{ACTING_USER_HEADER, HttpRequestGateway};

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: Method,
    path: String,
    query: Option<String>,
    acting_user: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct StubBackend {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubBackend {
    async fn record(&self, method: Method, uri: &Uri, headers: &HeaderMap, body: Option<Value>) {
        self.requests.lock().await.push(RecordedRequest {
            method,
            path: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
            acting_user: headers
                .get(ACTING_USER_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            body,
        });
    }

    async fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .await
            .last()
            .cloned()
            .unwrap_or_else(|| panic!("test"))
    }
}

fn error_body(message: &str, status: StatusCode) -> Response {
    (
        status,
        Json(json!({
            "message": message,
            "status": status.as_u16(),
            "timestamp": "2025-03-01T10:00:00Z",
        })),
    )
        .into_response()
}

async fn list_users(
    State(backend): State<StubBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    backend.record(method, &uri, &headers, None).await;
    Json(json!([
        {
            "id": 1,
            "email": "ada@opshub.test",
            "firstName": "Ada",
            "lastName": "Admin",
            "status": "ACTIVE",
            "role": "ADMIN"
        },
        {
            "id": 2,
            "email": "bob@opshub.test",
            "firstName": "Bob",
            "lastName": "Xu",
            "status": "DISABLED",
            "role": null
        }
    ]))
}

async fn create_user(
    State(backend): State<StubBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend
        .record(method, &uri, &headers, Some(body.clone()))
        .await;

    let email = body["email"].as_str().unwrap_or_default().to_owned();
    if email == "taken@opshub.test" {
        return error_body(
            "User with email already exists: taken@opshub.test",
            StatusCode::BAD_REQUEST,
        );
    }

    Json(json!({
        "id": 7,
        "email": email,
        "firstName": body["firstName"],
        "lastName": body["lastName"],
        "status": "ACTIVE",
        "role": "USER"
    }))
    .into_response()
}

async fn enable_user(
    State(backend): State<StubBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> StatusCode {
    backend.record(method, &uri, &headers, None).await;
    StatusCode::OK
}

async fn disable_user(
    State(backend): State<StubBackend>,
    Path(id): Path<i64>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    backend.record(method, &uri, &headers, None).await;
    if id == 404 {
        return error_body("User not found: id=404", StatusCode::NOT_FOUND);
    }

    StatusCode::OK.into_response()
}

async fn list_audit(
    State(backend): State<StubBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    backend.record(method, &uri, &headers, None).await;
    Json(json!({
        "content": [
            {
                "id": 31,
                "occurredAt": "2025-03-01T09:30:00Z",
                "actorUserId": 1,
                "action": "USER_DISABLED",
                "entityType": "USER",
                "entityId": "2",
                "summary": "User disabled: bob@opshub.test",
                "metadata": "{\"email\":\"bob@opshub.test\"}"
            },
            {
                "id": 30,
                "occurredAt": "2025-03-01T09:00:00Z",
                "actorUserId": null,
                "action": "USER_CREATED",
                "entityType": "USER",
                "entityId": "2",
                "summary": "User created: bob@opshub.test",
                "metadata": "{}"
            }
        ],
        "totalElements": 12,
        "number": 1,
        "size": 10,
        "totalPages": 2
    }))
}

async fn failing_users() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

async fn spawn_backend(router: Router<StubBackend>) -> (String, StubBackend) {
    let backend = StubBackend::default();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| panic!("test"));
    let address = listener.local_addr().unwrap_or_else(|_| panic!("test"));
    let app = Router::new()
        .nest("/api", router)
        .with_state(backend.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{address}/api"), backend)
}

fn stub_routes() -> Router<StubBackend> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}/enable", patch(enable_user))
        .route("/users/{id}", delete(disable_user))
        .route("/audit", get(list_audit))
}

fn gateway(base_url: &str, acting_user_id: Option<UserId>) -> HttpRequestGateway {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|_| panic!("test"));
    HttpRequestGateway::new(client, base_url, acting_user_id).unwrap_or_else(|_| panic!("test"))
}

#[tokio::test]
async fn list_users_sends_status_and_acting_user() {
    let (base_url, backend) = spawn_backend(stub_routes()).await;
    let gateway = gateway(base_url.as_str(), Some(UserId::new(1)));

    let users = gateway
        .list_users(Some(UserStatus::Active))
        .await
        .unwrap_or_else(|_| panic!("test"));

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].role, Some(Role::Admin));
    assert_eq!(users[1].status, UserStatus::Disabled);
    assert_eq!(users[1].created_at, None);

    let request = backend.last_request().await;
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "/users");
    assert_eq!(request.query.as_deref(), Some("status=ACTIVE"));
    assert_eq!(request.acting_user.as_deref(), Some("1"));
}

#[tokio::test]
async fn create_user_posts_camel_case_payload() {
    let (base_url, backend) = spawn_backend(stub_routes()).await;
    let gateway = gateway(base_url.as_str(), None);
    let new_user = CreateUserInput {
        first_name: "Dana".to_owned(),
        last_name: "Scully".to_owned(),
        email: "dana@opshub.test".to_owned(),
    }
    .validate()
    .unwrap_or_else(|_| panic!("test"));

    let created = gateway
        .create_user(&new_user)
        .await
        .unwrap_or_else(|_| panic!("test"));

    assert_eq!(created.id, UserId::new(7));
    assert_eq!(created.display_name(), "Dana Scully");

    let request = backend.last_request().await;
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.acting_user, None);
    assert_eq!(
        request.body,
        Some(json!({
            "firstName": "Dana",
            "lastName": "Scully",
            "email": "dana@opshub.test"
        }))
    );
}

#[tokio::test]
async fn bad_request_maps_to_validation_with_backend_message() {
    let (base_url, _backend) = spawn_backend(stub_routes()).await;
    let gateway = gateway(base_url.as_str(), None);
    let new_user = CreateUserInput {
        first_name: "Tess".to_owned(),
        last_name: "Taken".to_owned(),
        email: "taken@opshub.test".to_owned(),
    }
    .validate()
    .unwrap_or_else(|_| panic!("test"));

    let result = gateway.create_user(&new_user).await;

    assert_eq!(
        result,
        Err(AppError::Validation(
            "User with email already exists: taken@opshub.test".to_owned()
        ))
    );
}

#[tokio::test]
async fn enable_and_disable_use_distinct_endpoints() {
    let (base_url, backend) = spawn_backend(stub_routes()).await;
    let gateway = gateway(base_url.as_str(), Some(UserId::new(1)));

    gateway
        .set_user_enabled(UserId::new(2), true)
        .await
        .unwrap_or_else(|_| panic!("test"));
    gateway
        .set_user_enabled(UserId::new(3), false)
        .await
        .unwrap_or_else(|_| panic!("test"));

    let requests = backend.requests.lock().await.clone();
    let calls: Vec<_> = requests
        .iter()
        .map(|request| (request.method.clone(), request.path.clone()))
        .collect();
    assert_eq!(
        calls,
        vec![
            (Method::PATCH, "/users/2/enable".to_owned()),
            (Method::DELETE, "/users/3".to_owned()),
        ]
    );
}

#[tokio::test]
async fn not_found_maps_to_server_error_with_message() {
    let (base_url, _backend) = spawn_backend(stub_routes()).await;
    let gateway = gateway(base_url.as_str(), None);

    let result = gateway.set_user_enabled(UserId::new(404), false).await;

    assert_eq!(
        result,
        Err(AppError::Server {
            status: 404,
            message: Some("User not found: id=404".to_owned()),
        })
    );
}

#[tokio::test]
async fn non_json_error_body_keeps_status_only() {
    let (base_url, _backend) =
        spawn_backend(Router::new().route("/users", get(failing_users))).await;
    let gateway = gateway(base_url.as_str(), None);

    let result = gateway.list_users(None).await;

    assert_eq!(
        result,
        Err(AppError::Server {
            status: 500,
            message: None,
        })
    );
}

#[tokio::test]
async fn audit_query_is_passed_through_and_page_decoded() {
    let (base_url, backend) = spawn_backend(stub_routes()).await;
    let gateway = gateway(base_url.as_str(), None);
    let query = AuditEventQuery {
        entity_type: Some("USER".to_owned()),
        entity_id: Some("2".to_owned()),
        action: None,
        actor_user_id: Some(UserId::new(1)),
        from: Some("2025-03-01T00:00".to_owned()),
        to: None,
        page: PageSpec::new(1, 10).unwrap_or_else(|_| panic!("test")),
    };

    let page = gateway
        .list_audit_events(&query)
        .await
        .unwrap_or_else(|_| panic!("test"));

    assert_eq!(page.total_count, 12);
    assert_eq!(page.page_index, 1);
    assert_eq!(page.page_size, 10);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].metadata, json!({ "email": "bob@opshub.test" }));
    assert_eq!(page.items[1].actor_user_id, None);
    assert_eq!(page.items[1].metadata_text(), None);

    let request = backend.last_request().await;
    assert_eq!(
        request.query.as_deref(),
        Some("entityType=USER&entityId=2&actorUserId=1&from=2025-03-01T00%3A00&page=1&size=10")
    );
}

#[tokio::test]
async fn unreachable_backend_maps_to_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| panic!("test"));
    let address = listener.local_addr().unwrap_or_else(|_| panic!("test"));
    drop(listener);
    let gateway = gateway(format!("http://{address}/api").as_str(), None);

    let result = gateway.list_users(None).await;

    assert!(matches!(result, Err(AppError::Network(_))));
}

#[tokio::test]
async fn base_url_gains_trailing_slash() {
    let gateway = gateway("http://localhost:8081/api", None);
    assert_eq!(gateway.base_url().as_str(), "http://localhost:8081/api/");
}
