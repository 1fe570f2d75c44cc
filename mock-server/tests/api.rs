use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

fn login_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body.to_string())
        .unwrap()
}

/// Register "alice" and log her in, returning a usable bearer token.
async fn register_and_login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            r#"{"username":"alice","email":"alice@example.com","password":"secret"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(login_request(
            "grant_type=password&username=alice&password=secret",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token: Value = body_json(resp).await;
    token["access_token"].as_str().unwrap().to_string()
}

async fn create_project(app: &Router, token: &str, name: &str) -> i64 {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/projects/",
            Some(token),
            &format!(r#"{{"name":"{name}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["id"].as_i64().unwrap()
}

// --- auth ---

#[tokio::test]
async fn register_returns_created_user() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            r#"{"username":"bob","email":"bob@example.com","password":"pw","fullName":"Bob B"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = body_json(resp).await;
    assert_eq!(user["username"], "bob");
    assert_eq!(user["full_name"], "Bob B");
    assert_eq!(user["role"], "user");
    assert_eq!(user["is_active"], true);
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let app = app();
    let payload = r#"{"username":"bob","email":"bob@example.com","password":"pw"}"#;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", None, payload))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .oneshot(json_request("POST", "/auth/register", None, payload))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_wrong_password_returns_401() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            r#"{"username":"eve","email":"eve@example.com","password":"right"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .oneshot(login_request(
            "grant_type=password&username=eve&password=wrong",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_non_password_grant() {
    let app = app();
    let resp = app
        .oneshot(login_request(
            "grant_type=client_credentials&username=a&password=b",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["detail"][0]["loc"][1], "grant_type");
}

#[tokio::test]
async fn login_rejects_json_body() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            r#"{"grant_type":"password","username":"a","password":"b"}"#,
        ))
        .await
        .unwrap();
    assert!(!resp.status().is_success());
}

#[tokio::test]
async fn me_without_token_returns_401() {
    let app = app();
    let resp = app.oneshot(get_request("/auth/me", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_logged_in_user() {
    let app = app();
    let token = register_and_login(&app).await;
    let resp = app
        .oneshot(get_request("/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user = body_json(resp).await;
    assert_eq!(user["username"], "alice");
}

// --- projects ---

#[tokio::test]
async fn project_routes_require_auth() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(get_request("/projects/", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(get_request("/projects/", Some("bogus-token")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn project_empty_name_returns_validation_detail() {
    let app = app();
    let token = register_and_login(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/projects/",
            Some(&token),
            r#"{"name":""}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["detail"][0]["loc"][0], "body");
    assert_eq!(body["detail"][0]["loc"][1], "name");
    assert_eq!(body["detail"][0]["type"], "string_too_short");
}

#[tokio::test]
async fn project_crud_lifecycle() {
    let app = app();
    let token = register_and_login(&app).await;
    let id = create_project(&app, &token, "Roadmap").await;

    let resp = app
        .clone()
        .oneshot(get_request("/projects/?skip=0&limit=100", Some(&token)))
        .await
        .unwrap();
    let projects = body_json(resp).await;
    assert_eq!(projects.as_array().unwrap().len(), 1);
    assert_eq!(projects[0]["name"], "Roadmap");

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/projects/{id}"),
            Some(&token),
            r#"{"name":"Renamed","description":"new plan"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let project = body_json(resp).await;
    assert_eq!(project["name"], "Renamed");
    assert_eq!(project["description"], "new plan");

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/projects/{id}"))
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(get_request("/projects/", Some(&token)))
        .await
        .unwrap();
    let projects = body_json(resp).await;
    assert!(projects.as_array().unwrap().is_empty());
}

// --- tasks ---

#[tokio::test]
async fn task_list_filters_by_project_and_status() {
    let app = app();
    let token = register_and_login(&app).await;
    let first = create_project(&app, &token, "First").await;
    let second = create_project(&app, &token, "Second").await;

    for (project_id, status_id) in [(first, 1), (first, 3), (second, 1)] {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/tasks/",
                Some(&token),
                &format!(r#"{{"title":"t","project_id":{project_id},"status_id":{status_id}}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app
        .clone()
        .oneshot(get_request(
            &format!("/tasks/?project_id={first}"),
            Some(&token),
        ))
        .await
        .unwrap();
    let tasks = body_json(resp).await;
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    let resp = app
        .oneshot(get_request(
            &format!("/tasks/?project_id={first}&status_id=3"),
            Some(&token),
        ))
        .await
        .unwrap();
    let tasks = body_json(resp).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["status"]["is_final"], true);
}

#[tokio::test]
async fn task_detail_joins_reference_data() {
    let app = app();
    let token = register_and_login(&app).await;
    let project_id = create_project(&app, &token, "Joined").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tasks/",
            Some(&token),
            &format!(r#"{{"title":"joinme","project_id":{project_id},"priority_id":3,"status_id":2}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let task_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = app
        .oneshot(get_request(&format!("/tasks/{task_id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let task = body_json(resp).await;
    assert_eq!(task["title"], "joinme");
    assert_eq!(task["priority"]["name"], "High");
    assert_eq!(task["status"]["name"], "In Progress");
    assert_eq!(task["project"]["name"], "Joined");
}

#[tokio::test]
async fn task_create_unknown_project_returns_404() {
    let app = app();
    let token = register_and_login(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/tasks/",
            Some(&token),
            r#"{"title":"orphan","project_id":999}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- reference data ---

#[tokio::test]
async fn priorities_and_statuses_are_seeded() {
    let app = app();
    let token = register_and_login(&app).await;

    let resp = app
        .clone()
        .oneshot(get_request("/priorities/", Some(&token)))
        .await
        .unwrap();
    let priorities = body_json(resp).await;
    assert_eq!(priorities.as_array().unwrap().len(), 3);
    assert_eq!(priorities[2]["level"], 3);

    let resp = app
        .oneshot(get_request("/statuses/", Some(&token)))
        .await
        .unwrap();
    let statuses = body_json(resp).await;
    assert_eq!(statuses.as_array().unwrap().len(), 3);
    assert_eq!(statuses[2]["is_final"], true);
}

// --- comments ---

#[tokio::test]
async fn comment_create_and_list_by_task() {
    let app = app();
    let token = register_and_login(&app).await;
    let project_id = create_project(&app, &token, "Talky").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tasks/",
            Some(&token),
            &format!(r#"{{"title":"discuss","project_id":{project_id}}}"#),
        ))
        .await
        .unwrap();
    let task_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/comments/",
            Some(&token),
            &format!(r#"{{"content":"first!","taskId":{task_id}}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .oneshot(get_request(
            &format!("/comments/task/{task_id}"),
            Some(&token),
        ))
        .await
        .unwrap();
    let comments = body_json(resp).await;
    assert_eq!(comments.as_array().unwrap().len(), 1);
    assert_eq!(comments[0]["content"], "first!");
    assert_eq!(comments[0]["task_id"], task_id);
}

#[tokio::test]
async fn comment_on_unknown_task_returns_404() {
    let app = app();
    let token = register_and_login(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/comments/",
            Some(&token),
            r#"{"content":"ghost","taskId":404}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
