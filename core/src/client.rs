//! Async HTTP client for the task-manager API.
//!
//! # Design
//! `ApiClient` owns one `reqwest::Client` (cookie store enabled, JSON
//! accepted by default) plus the base URL and the current bearer token.
//! Every operation is a thin wrapper over a small set of verb helpers
//! that mirror the service's uniform contract: serialize the request,
//! await the round-trip, classify non-2xx statuses, deserialize the
//! body. No retries, no timeouts beyond transport defaults, no
//! cancellation hooks.
//!
//! The token field is the only shared mutable state. It is read (not
//! mutated) while requests are in flight; callers that need a
//! deterministic credential per request must serialize `set_token` /
//! `clear_token` against their own in-flight calls.

use std::sync::RwLock;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::types::{
    Comment, CommentCreate, Priority, Project, ProjectCreate, Status, TaskCreate, TaskItem,
    TaskWithDetails, TokenResponse, User, UserRegister,
};

/// Optional filters and paging for `ApiClient::list_tasks`.
///
/// Filters left as `None` are omitted from the query string entirely,
/// never sent as empty values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
    pub status_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            project_id: None,
            status_id: None,
            priority_id: None,
            skip: 0,
            limit: 100,
        }
    }
}

impl TaskFilter {
    /// Query pairs in the order the service documents them: paging
    /// first, then whichever filters are set.
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(project_id) = self.project_id {
            pairs.push(("project_id", project_id.to_string()));
        }
        if let Some(status_id) = self.status_id {
            pairs.push(("status_id", status_id.to_string()));
        }
        if let Some(priority_id) = self.priority_id {
            pairs.push(("priority_id", priority_id.to_string()));
        }
        pairs
    }
}

/// Asynchronous client for the task-manager API.
///
/// One instance per session; cheap to share behind an `Arc`. All
/// operations return `Result` and surface every failure to the caller
/// without local recovery.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Build a client for the service at `base_url`.
    ///
    /// The underlying transport keeps cookies across requests (the
    /// service uses them for session affinity) and always advertises
    /// `Accept: application/json`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Store `token`; every subsequent request carries it as
    /// `Authorization: Bearer <token>` until cleared.
    pub fn set_token(&self, token: &str) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.to_string());
    }

    /// Drop the stored token; subsequent authenticated calls will be
    /// rejected server-side with 401.
    pub fn clear_token(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{method} {url}");
        let builder = self.http.request(method, url);
        // A poisoned lock still holds a usable token value.
        let guard = self.token.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Await the round-trip and classify the response status. Non-2xx
    /// responses consume the body into the error.
    async fn execute(builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await?;
        log::warn!("request failed with HTTP {status}: {body}");
        Err(ApiError::from_status(status.as_u16(), body))
    }

    /// Read the body as text first so malformed JSON surfaces as
    /// `ApiError::Decode` rather than a transport error.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = Self::execute(self.request(Method::GET, path).query(query)).await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = Self::execute(self.request(Method::POST, path).json(body)).await?;
        Self::decode(response).await
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = Self::execute(self.request(Method::PUT, path).json(body)).await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        Self::execute(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// Create a new account. Does not require a token.
    pub async fn register(&self, input: &UserRegister) -> Result<User, ApiError> {
        self.post_json("/auth/register", input).await
    }

    /// OAuth2 password grant. The one operation that sends a
    /// form-encoded body instead of JSON.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let form = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ];
        let response = Self::execute(self.request(Method::POST, "/auth/login").form(&form)).await?;
        Self::decode(response).await
    }

    /// The account behind the current bearer token.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get_json("/auth/me", &[]).await
    }

    pub async fn list_projects(&self, skip: u32, limit: u32) -> Result<Vec<Project>, ApiError> {
        let query = [("skip", skip.to_string()), ("limit", limit.to_string())];
        self.get_json("/projects/", &query).await
    }

    pub async fn create_project(&self, input: &ProjectCreate) -> Result<Project, ApiError> {
        self.post_json("/projects/", input).await
    }

    pub async fn update_project(
        &self,
        project_id: i64,
        input: &ProjectCreate,
    ) -> Result<Project, ApiError> {
        self.put_json(&format!("/projects/{project_id}"), input).await
    }

    pub async fn delete_project(&self, project_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/projects/{project_id}")).await
    }

    /// Tasks with their priority/status/project expanded server-side,
    /// filtered and paged per `filter`.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskWithDetails>, ApiError> {
        self.get_json("/tasks/", &filter.query_pairs()).await
    }

    pub async fn create_task(&self, input: &TaskCreate) -> Result<TaskItem, ApiError> {
        self.post_json("/tasks/", input).await
    }

    pub async fn get_task(&self, task_id: i64) -> Result<TaskWithDetails, ApiError> {
        self.get_json(&format!("/tasks/{task_id}"), &[]).await
    }

    pub async fn update_task(
        &self,
        task_id: i64,
        input: &TaskCreate,
    ) -> Result<TaskItem, ApiError> {
        self.put_json(&format!("/tasks/{task_id}"), input).await
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/tasks/{task_id}")).await
    }

    pub async fn list_priorities(&self) -> Result<Vec<Priority>, ApiError> {
        self.get_json("/priorities/", &[]).await
    }

    pub async fn list_statuses(&self) -> Result<Vec<Status>, ApiError> {
        self.get_json("/statuses/", &[]).await
    }

    pub async fn list_task_comments(&self, task_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.get_json(&format!("/comments/task/{task_id}"), &[]).await
    }

    pub async fn create_comment(&self, input: &CommentCreate) -> Result<Comment, ApiError> {
        self.post_json("/comments/", input).await
    }
}
