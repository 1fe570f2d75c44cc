//! In-memory mock of the task-manager REST service.
//!
//! Implements the slice of the remote contract the client exercises:
//! registration, the OAuth2 password-grant login, bearer-token
//! enforcement on every other route, project/task/comment CRUD with
//! skip/limit paging, server-side joined task detail responses, and
//! FastAPI-style 422 validation bodies. Priorities and statuses are
//! seeded reference data. State lives in one `RwLock`ed store keyed by
//! id, so list responses come back in stable id order.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Priority {
    pub id: i64,
    pub name: String,
    pub level: i64,
    pub color: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    pub name: String,
    pub order_num: i64,
    pub is_final: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub priority_id: Option<i64>,
    pub status_id: Option<i64>,
    pub created_by_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task joined with its priority, status and project, as the service
/// returns from `/tasks/` and `/tasks/{id}`.
#[derive(Clone, Debug, Serialize)]
pub struct TaskWithDetails {
    #[serde(flatten)]
    pub task: Task,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub project: Option<Project>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub task_id: i64,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub grant_type: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ProjectInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: i64,
    #[serde(default)]
    pub priority_id: Option<i64>,
    #[serde(default)]
    pub status_id: Option<i64>,
    #[serde(default)]
    pub assignee_ids: Option<Vec<i64>>,
}

#[derive(Deserialize)]
pub struct CommentInput {
    pub content: String,
    #[serde(alias = "taskId")]
    pub task_id: i64,
}

fn default_limit() -> u32 {
    100
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Deserialize)]
pub struct TaskListQuery {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub status_id: Option<i64>,
    #[serde(default)]
    pub priority_id: Option<i64>,
}

struct UserRecord {
    user: User,
    password: String,
}

/// All server state. Entity maps are `BTreeMap` so paged list
/// responses come back in stable id order.
pub struct Store {
    next_id: i64,
    users: BTreeMap<i64, UserRecord>,
    tokens: HashMap<String, i64>,
    projects: BTreeMap<i64, Project>,
    tasks: BTreeMap<i64, Task>,
    comments: BTreeMap<i64, Comment>,
    priorities: Vec<Priority>,
    statuses: Vec<Status>,
}

impl Store {
    /// Empty store with the reference data every deployment ships.
    pub fn seeded() -> Self {
        let priorities = vec![
            Priority { id: 1, name: "Low".to_string(), level: 1, color: "#10B981".to_string() },
            Priority { id: 2, name: "Medium".to_string(), level: 2, color: "#F59E0B".to_string() },
            Priority { id: 3, name: "High".to_string(), level: 3, color: "#EF4444".to_string() },
        ];
        let statuses = vec![
            Status { id: 1, name: "To Do".to_string(), order_num: 1, is_final: false },
            Status { id: 2, name: "In Progress".to_string(), order_num: 2, is_final: false },
            Status { id: 3, name: "Done".to_string(), order_num: 3, is_final: true },
        ];
        Self {
            next_id: 0,
            users: BTreeMap::new(),
            tokens: HashMap::new(),
            projects: BTreeMap::new(),
            tasks: BTreeMap::new(),
            comments: BTreeMap::new(),
            priorities,
            statuses,
        }
    }

    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn with_details(&self, task: &Task) -> TaskWithDetails {
        TaskWithDetails {
            task: task.clone(),
            priority: task
                .priority_id
                .and_then(|id| self.priorities.iter().find(|p| p.id == id).cloned()),
            status: task
                .status_id
                .and_then(|id| self.statuses.iter().find(|s| s.id == id).cloned()),
            project: self.projects.get(&task.project_id).cloned(),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

type ErrorResponse = (StatusCode, Json<Value>);

fn unauthorized() -> ErrorResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Not authenticated"})),
    )
}

fn not_found(what: &str) -> ErrorResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"detail": format!("{what} not found")})),
    )
}

/// FastAPI-style 422 body with a single detail entry.
fn validation_error(field: &str, msg: &str, kind: &str) -> ErrorResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [{"loc": ["body", field], "msg": msg, "type": kind}]
        })),
    )
}

/// Resolve the bearer token in `headers` to a user id.
fn authenticate(store: &Store, headers: &HeaderMap) -> Result<i64, ErrorResponse> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    store.tokens.get(token).copied().ok_or_else(unauthorized)
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/projects/", get(list_projects).post(create_project))
        .route("/projects/{id}", put(update_project).delete(delete_project))
        .route("/tasks/", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/priorities/", get(list_priorities))
        .route("/statuses/", get(list_statuses))
        .route("/comments/task/{task_id}", get(list_task_comments))
        .route("/comments/", post(create_comment))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<User>), ErrorResponse> {
    let mut store = db.write().await;
    if store.users.values().any(|r| r.user.username == input.username) {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({"detail": "Username already registered"})),
        ));
    }
    let user = User {
        id: store.alloc_id(),
        username: input.username,
        email: input.email,
        full_name: input.full_name,
        role: "user".to_string(),
        is_active: true,
        created_at: Utc::now(),
    };
    store.users.insert(
        user.id,
        UserRecord {
            user: user.clone(),
            password: input.password,
        },
    );
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(db): State<Db>,
    Form(input): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ErrorResponse> {
    if input.grant_type != "password" {
        return Err(validation_error(
            "grant_type",
            "Input should be 'password'",
            "literal_error",
        ));
    }
    let mut store = db.write().await;
    let user_id = store
        .users
        .values()
        .find(|r| r.user.username == input.username && r.password == input.password)
        .map(|r| r.user.id)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Incorrect username or password"})),
            )
        })?;
    let access_token = Uuid::new_v4().to_string();
    store.tokens.insert(access_token.clone(), user_id);
    // The refresh token is minted but never redeemable; the real
    // service's refresh flow is outside the mocked contract.
    Ok(Json(TokenResponse {
        access_token,
        refresh_token: Uuid::new_v4().to_string(),
        token_type: "bearer".to_string(),
    }))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, ErrorResponse> {
    let store = db.read().await;
    let user_id = authenticate(&store, &headers)?;
    let record = store.users.get(&user_id).ok_or_else(unauthorized)?;
    Ok(Json(record.user.clone()))
}

async fn list_projects(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Project>>, ErrorResponse> {
    let store = db.read().await;
    authenticate(&store, &headers)?;
    let projects = store
        .projects
        .values()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .cloned()
        .collect();
    Ok(Json(projects))
}

async fn create_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<Project>), ErrorResponse> {
    let mut store = db.write().await;
    let user_id = authenticate(&store, &headers)?;
    if input.name.trim().is_empty() {
        return Err(validation_error(
            "name",
            "String should have at least 1 character",
            "string_too_short",
        ));
    }
    let now = Utc::now();
    let project = Project {
        id: store.alloc_id(),
        name: input.name,
        description: input.description,
        created_by_id: Some(user_id),
        created_at: now,
        updated_at: now,
    };
    store.projects.insert(project.id, project.clone());
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Project>, ErrorResponse> {
    let mut store = db.write().await;
    authenticate(&store, &headers)?;
    if input.name.trim().is_empty() {
        return Err(validation_error(
            "name",
            "String should have at least 1 character",
            "string_too_short",
        ));
    }
    let project = store.projects.get_mut(&id).ok_or_else(|| not_found("Project"))?;
    project.name = input.name;
    project.description = input.description;
    project.updated_at = Utc::now();
    Ok(Json(project.clone()))
}

async fn delete_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ErrorResponse> {
    let mut store = db.write().await;
    authenticate(&store, &headers)?;
    store
        .projects
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("Project"))
}

async fn list_tasks(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<TaskWithDetails>>, ErrorResponse> {
    let store = db.read().await;
    authenticate(&store, &headers)?;
    let tasks = store
        .tasks
        .values()
        .filter(|t| query.project_id.is_none_or(|id| t.project_id == id))
        .filter(|t| query.status_id.is_none_or(|id| t.status_id == Some(id)))
        .filter(|t| query.priority_id.is_none_or(|id| t.priority_id == Some(id)))
        .skip(query.skip as usize)
        .take(query.limit as usize)
        .map(|t| store.with_details(t))
        .collect();
    Ok(Json(tasks))
}

async fn create_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<TaskInput>,
) -> Result<(StatusCode, Json<Task>), ErrorResponse> {
    let mut store = db.write().await;
    let user_id = authenticate(&store, &headers)?;
    if input.title.trim().is_empty() {
        return Err(validation_error(
            "title",
            "String should have at least 1 character",
            "string_too_short",
        ));
    }
    if !store.projects.contains_key(&input.project_id) {
        return Err(not_found("Project"));
    }
    let now = Utc::now();
    let task = Task {
        id: store.alloc_id(),
        title: input.title,
        description: input.description,
        project_id: input.project_id,
        priority_id: input.priority_id,
        status_id: input.status_id,
        created_by_id: Some(user_id),
        due_date: input.due_date,
        created_at: now,
        updated_at: now,
    };
    store.tasks.insert(task.id, task.clone());
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<TaskWithDetails>, ErrorResponse> {
    let store = db.read().await;
    authenticate(&store, &headers)?;
    let task = store.tasks.get(&id).ok_or_else(|| not_found("Task"))?;
    Ok(Json(store.with_details(task)))
}

async fn update_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Task>, ErrorResponse> {
    let mut store = db.write().await;
    authenticate(&store, &headers)?;
    if input.title.trim().is_empty() {
        return Err(validation_error(
            "title",
            "String should have at least 1 character",
            "string_too_short",
        ));
    }
    if !store.projects.contains_key(&input.project_id) {
        return Err(not_found("Project"));
    }
    let task = store.tasks.get_mut(&id).ok_or_else(|| not_found("Task"))?;
    task.title = input.title;
    task.description = input.description;
    task.due_date = input.due_date;
    task.project_id = input.project_id;
    task.priority_id = input.priority_id;
    task.status_id = input.status_id;
    task.updated_at = Utc::now();
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ErrorResponse> {
    let mut store = db.write().await;
    authenticate(&store, &headers)?;
    store
        .tasks
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("Task"))
}

async fn list_priorities(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Priority>>, ErrorResponse> {
    let store = db.read().await;
    authenticate(&store, &headers)?;
    Ok(Json(store.priorities.clone()))
}

async fn list_statuses(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Status>>, ErrorResponse> {
    let store = db.read().await;
    authenticate(&store, &headers)?;
    Ok(Json(store.statuses.clone()))
}

async fn list_task_comments(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ErrorResponse> {
    let store = db.read().await;
    authenticate(&store, &headers)?;
    let comments = store
        .comments
        .values()
        .filter(|c| c.task_id == task_id)
        .cloned()
        .collect();
    Ok(Json(comments))
}

async fn create_comment(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CommentInput>,
) -> Result<(StatusCode, Json<Comment>), ErrorResponse> {
    let mut store = db.write().await;
    let user_id = authenticate(&store, &headers)?;
    if !store.tasks.contains_key(&input.task_id) {
        return Err(not_found("Task"));
    }
    let now = Utc::now();
    let comment = Comment {
        id: store.alloc_id(),
        content: input.content,
        task_id: input.task_id,
        user_id: Some(user_id),
        created_at: now,
        updated_at: now,
    };
    store.comments.insert(comment.id, comment.clone());
    Ok((StatusCode::CREATED, Json(comment)))
}
