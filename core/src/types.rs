//! Domain DTOs for the task-manager API.
//!
//! # Design
//! These types mirror the remote service's schema but are defined
//! independently from the mock-server crate; integration tests catch
//! schema drift. The server emits snake_case property names, but some
//! deployments front it with a camelCase-rewriting gateway, so inbound
//! entities carry `serde(alias)` for the camelCase spellings of every
//! multi-word field. Outbound payload types serialize with the exact
//! wire names the service expects and omit unset optionals entirely
//! (the service treats a present `null` differently from an absent
//! field on partial updates).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_role() -> String {
    "user".to_string()
}

fn default_color() -> String {
    "#6B7280".to_string()
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// An account as returned by `/auth/register` and `/auth/me`.
///
/// `role` is an open string in the observed schema, not a closed enum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, alias = "isActive")]
    pub is_active: bool,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Request payload for `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegister {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Bearer-token pair returned by the password grant at `/auth/login`.
///
/// `refresh_token` is carried but never exchanged; token refresh is out
/// of scope for this client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

/// A project grouping tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(alias = "createdById")]
    pub created_by_id: Option<i64>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating or replacing a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A priority level from the server's reference data.
///
/// `level` is the externally assigned ordering key; array position in a
/// list response carries no meaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Priority {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default = "default_color")]
    pub color: String,
}

/// A task status from the server's reference data.
///
/// `is_final` is the sole "task completed" signal; `order_num` is the
/// externally assigned ordering key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "orderNum")]
    pub order_num: i64,
    #[serde(default, alias = "isFinal")]
    pub is_final: bool,
}

/// A task as returned by create/update operations (no expansions).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskItem {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(default, alias = "projectId")]
    pub project_id: i64,
    #[serde(alias = "priorityId")]
    pub priority_id: Option<i64>,
    #[serde(alias = "statusId")]
    pub status_id: Option<i64>,
    #[serde(alias = "createdById")]
    pub created_by_id: Option<i64>,
    #[serde(alias = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A task with its priority, status and project expanded server-side.
///
/// The client never computes this join; `/tasks/` list and `/tasks/{id}`
/// return it ready-made.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskWithDetails {
    #[serde(flatten)]
    pub task: TaskItem,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub project: Option<Project>,
}

impl TaskWithDetails {
    /// A task is completed when its status is flagged terminal. A task
    /// with no status at all counts as active by convention.
    pub fn is_completed(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.is_final)
    }
}

/// Request payload for creating or replacing a task. Sent with the
/// service's snake_case wire names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<i64>>,
}

/// A comment attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    #[serde(default)]
    pub id: i64,
    pub content: String,
    #[serde(default, alias = "taskId")]
    pub task_id: i64,
    #[serde(alias = "userId")]
    pub user_id: Option<i64>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Request payload for `/comments/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreate {
    pub content: String,
    pub task_id: i64,
}

/// One entry of a FastAPI-style 422 body. `loc` segments may be strings
/// or array indices, so they stay as raw JSON values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The structured body the service sends with HTTP 422.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpValidationError {
    #[serde(default)]
    pub detail: Vec<ValidationError>,
}
