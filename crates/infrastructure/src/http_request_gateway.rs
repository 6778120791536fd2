use async_trait::async_trait;
use opshub_application::{AuditEventQuery, RequestGateway};
use opshub_core::{AppError, AppResult};
use opshub_domain::{AuditEvent, NewUser, ResultPage, User, UserId, UserStatus};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

mod dto;

use dto::{AuditEventResponse, CreateUserRequest, ErrorResponse, PageResponse, UserResponse};

/// Header carrying the acting user for the backend's development authentication.
pub const ACTING_USER_HEADER: &str = "X-User-Id";

/// Base URL the backend listens on in local development.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8081/api";

/// REST implementation of [`RequestGateway`].
#[derive(Clone)]
pub struct HttpRequestGateway {
    http_client: reqwest::Client,
    base_url: Url,
    acting_user_id: Option<UserId>,
}

impl HttpRequestGateway {
    /// Creates a gateway rooted at `base_url`, e.g. `http://localhost:8081/api`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        acting_user_id: Option<UserId>,
    ) -> AppResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(format!("{trimmed}/").as_str()).map_err(|error| {
            AppError::Internal(format!("invalid API base URL '{base_url}': {error}"))
        })?;

        Ok(Self {
            http_client,
            base_url,
            acting_user_id,
        })
    }

    /// Returns the base URL every path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("invalid endpoint path '{path}': {error}"))
        })
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&CreateUserRequest<'_>>,
    ) -> AppResult<reqwest::Response> {
        debug!(%method, %url, "sending request");

        let mut builder = self.http_client.request(method.clone(), url.clone());
        if let Some(user_id) = self.acting_user_id {
            builder = builder.header(ACTING_USER_HEADER, user_id.to_string());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            warn!(%method, %url, error = %error, "request failed without a response");
            AppError::Network(format!("{method} {url} failed: {error}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(body.as_str())
            .ok()
            .and_then(|error| error.message)
            .filter(|message| !message.trim().is_empty());

        warn!(
            %method,
            %url,
            status = status.as_u16(),
            message = message.as_deref().unwrap_or(""),
            "backend returned an error"
        );

        Err(match (status, message) {
            (StatusCode::BAD_REQUEST, Some(message)) => AppError::Validation(message),
            (status, message) => AppError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let url = response.url().clone();
        response.json::<T>().await.map_err(|error| {
            AppError::Network(format!("invalid response body from {url}: {error}"))
        })
    }
}

#[async_trait]
impl RequestGateway for HttpRequestGateway {
    async fn list_users(&self, status: Option<UserStatus>) -> AppResult<Vec<User>> {
        let mut url = self.endpoint("users")?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status.as_str());
        }

        let response = self.send(Method::GET, url, None).await?;
        let users: Vec<UserResponse> = Self::read_json(response).await?;

        Ok(users.into_iter().map(User::from).collect())
    }

    async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        let url = self.endpoint("users")?;
        let request = CreateUserRequest::from(user);

        let response = self.send(Method::POST, url, Some(&request)).await?;
        let created: UserResponse = Self::read_json(response).await?;

        Ok(User::from(created))
    }

    async fn set_user_enabled(&self, user_id: UserId, enabled: bool) -> AppResult<()> {
        let (method, path) = if enabled {
            (Method::PATCH, format!("users/{user_id}/enable"))
        } else {
            (Method::DELETE, format!("users/{user_id}"))
        };
        let url = self.endpoint(path.as_str())?;

        self.send(method, url, None).await?;
        Ok(())
    }

    async fn list_audit_events(
        &self,
        query: &AuditEventQuery,
    ) -> AppResult<ResultPage<AuditEvent>> {
        let mut url = self.endpoint("audit")?;
        if query.from.is_some() || query.to.is_some() {
            debug!(
                from = query.from.as_deref(),
                to = query.to.as_deref(),
                "audit time bounds forwarded; backends without from/to support ignore them"
            );
        }
        {
            let mut pairs = url.query_pairs_mut();
            let optional = [
                ("entityType", query.entity_type.clone()),
                ("entityId", query.entity_id.clone()),
                ("action", query.action.clone()),
                ("actorUserId", query.actor_user_id.map(|id| id.to_string())),
                ("from", query.from.clone()),
                ("to", query.to.clone()),
            ];
            for (key, value) in optional {
                let Some(value) = value else {
                    continue;
                };
                pairs.append_pair(key, value.as_str());
            }
            pairs.append_pair("page", query.page.index().to_string().as_str());
            pairs.append_pair("size", query.page.size().to_string().as_str());
        }

        let response = self.send(Method::GET, url, None).await?;
        let page: PageResponse<AuditEventResponse> = Self::read_json(response).await?;

        Ok(page.into_result_page())
    }
}

#[cfg(test)]
mod tests;
