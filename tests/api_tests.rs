//! End-to-end tests of the gateway, resource clients and task board against
//! an in-process mock of the studio backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use studio::api::TaskFilter;
use studio::notify::NotificationPoller;
use studio::session::SessionData;
use studio::{
    ApiClient, ApiError, BoardError, BoardOptions, MemorySessionStore, Session, SessionEvent,
    TaskBoard, TransitionOutcome,
};
use studio_common::{BoardScope, TaskStatus};
use tokio::sync::oneshot;

// =============================================================================
// Mock backend
// =============================================================================

#[derive(Clone, Copy, PartialEq)]
enum Shape {
    Bare,
    Results,
    Data,
    Keyed,
}

struct BackendState {
    valid_access: String,
    /// Access token handed out by the refresh endpoint; `None` rejects.
    refresh_grants: Option<String>,
    refresh_calls: usize,
    shape: Shape,
    tasks: Vec<Value>,
    action_calls: Vec<(i64, String, String)>,
    reject: Option<(i64, String)>,
    notifications: Value,
    /// `None` makes `projects/dashboard_stats/` answer 404.
    project_stats: Option<Value>,
    projects: Vec<Value>,
    stats_calls: usize,
}

#[derive(Clone)]
struct Backend(Arc<Mutex<BackendState>>);

impl Backend {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(BackendState {
            valid_access: "access-1".to_string(),
            refresh_grants: Some("access-2".to_string()),
            refresh_calls: 0,
            shape: Shape::Results,
            tasks: vec![
                json!({"id": 1, "title": "Logo", "status": "created", "assigned_to": 5}),
                json!({"id": 7, "title": "Banner", "status": "on_review",
                       "assigned_to": {"id": 5, "username": "anna"}}),
                json!({"id": 42, "title": "Slogan", "status": "in_work", "priority": "high"}),
            ],
            action_calls: Vec::new(),
            reject: None,
            notifications: json!({
                "n1": {"id": 1, "title": "Task assigned", "is_read": false},
                "n2": {"id": 2, "title": "Deadline", "is_read": true},
                "unread": 1
            }),
            project_stats: Some(json!({
                "total_projects": 5, "active_projects": 3, "planned_projects": 1,
                "on_approval_projects": 0, "completed_projects": 1, "paused_projects": 0
            })),
            projects: vec![
                json!({"id": 1, "title": "Autumn campaign", "status": "in_work"}),
                json!({"id": 2, "title": "Catalogue", "status": "paused"}),
            ],
            stats_calls: 0,
        })))
    }

    fn with<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.with(|s| s.valid_access.clone()));
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some(expected.as_str())
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({"detail": "Given token not valid for any token type"})),
    )
        .into_response()
}

async fn token(axum::Json(body): axum::Json<Value>) -> Response {
    if body["username"] == "anna" && body["password"] == "secret" {
        axum::Json(json!({
            "access": "access-1",
            "refresh": "refresh-1",
            "user": {"id": 5, "username": "anna", "first_name": "Anna",
                     "last_name": "Petrova", "role": "designer"}
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response()
    }
}

async fn refresh(State(backend): State<Backend>, axum::Json(body): axum::Json<Value>) -> Response {
    let granted = backend.with(|s| {
        s.refresh_calls += 1;
        if body["refresh"] != "refresh-1" {
            return None;
        }
        let granted = s.refresh_grants.clone()?;
        if granted != "bogus" {
            s.valid_access = granted.clone();
        }
        Some(granted)
    });
    match granted {
        Some(access) => axum::Json(json!({"access": access})).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})),
        )
            .into_response(),
    }
}

async fn me(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    axum::Json(json!({"id": 5, "username": "anna", "role": "designer"})).into_response()
}

async fn list_tasks(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    let (shape, tasks) = backend.with(|s| (s.shape, s.tasks.clone()));
    let body = match shape {
        Shape::Bare => Value::Array(tasks),
        Shape::Results => json!({"count": tasks.len(), "next": null, "results": tasks}),
        Shape::Data => json!({"data": tasks}),
        Shape::Keyed => {
            let map: serde_json::Map<String, Value> = tasks
                .into_iter()
                .enumerate()
                .map(|(i, t)| (format!("task_{:03}", i), t))
                .collect();
            Value::Object(map)
        }
    };
    axum::Json(body).into_response()
}

async fn task_action(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path((id, action)): Path<(i64, String)>,
    body: String,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    backend.with(|s| {
        s.action_calls.push((id, action.clone(), body));
        if let Some((reject_id, message)) = &s.reject {
            if *reject_id == id {
                return (StatusCode::BAD_REQUEST, axum::Json(json!({"error": message})))
                    .into_response();
            }
        }
        let status = match action.as_str() {
            "take_to_work" | "return_for_revision" => "in_work",
            "send_to_review" => "on_review",
            "complete" => "completed",
            _ => return StatusCode::NOT_FOUND.into_response(),
        };
        match s.tasks.iter_mut().find(|t| t["id"] == id) {
            Some(task) => {
                task["status"] = json!(status);
                axum::Json(json!({"status": format!("Task moved to {}", status)})).into_response()
            }
            None => (StatusCode::NOT_FOUND, axum::Json(json!({"detail": "Not found."})))
                .into_response(),
        }
    })
}

async fn update_progress(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({"progress": ["Progress cannot decrease on a completed task"]})),
    )
        .into_response()
}

async fn project_stats(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    match backend.with(|s| {
        s.stats_calls += 1;
        s.project_stats.clone()
    }) {
        Some(stats) => axum::Json(stats).into_response(),
        None => (StatusCode::NOT_FOUND, axum::Json(json!({"detail": "Not found."}))).into_response(),
    }
}

async fn list_projects(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    axum::Json(json!({"results": backend.with(|s| s.projects.clone())})).into_response()
}

async fn notifications(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    axum::Json(backend.with(|s| s.notifications.clone())).into_response()
}

async fn download(State(backend): State<Backend>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    (
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"brief-{}.txt\"", id),
        )],
        "moodboard notes",
    )
        .into_response()
}

fn router(backend: Backend) -> Router {
    Router::new()
        .route("/api/auth/token/", post(token))
        .route("/api/auth/token/refresh/", post(refresh))
        .route("/api/auth/me/", get(me))
        .route("/api/projects/", get(list_projects))
        .route("/api/projects/dashboard_stats/", get(project_stats))
        .route("/api/projects/project-tasks/", get(list_tasks))
        .route("/api/projects/project-tasks/my_tasks/", get(list_tasks))
        .route(
            "/api/projects/project-tasks/{id}/update_progress/",
            post(update_progress),
        )
        .route("/api/projects/project-tasks/{id}/{action}/", post(task_action))
        .route("/api/notifications/", get(notifications))
        .route("/api/files/{id}/download/", get(download))
        .with_state(backend)
}

async fn spawn_backend(backend: Backend) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(backend);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

/// A backend that can be taken down mid-test. Awaiting the returned
/// handle after firing the sender guarantees the port is closed.
async fn spawn_stoppable_backend(
    backend: Backend,
) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(backend);
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stopped.await;
            })
            .await
            .unwrap();
    });
    (format!("http://{}/api", addr), stop, handle)
}

fn client(base_url: &str, access: Option<&str>, refresh: Option<&str>) -> ApiClient {
    let store = MemorySessionStore::with_data(SessionData {
        access: access.map(str::to_string),
        refresh: refresh.map(str::to_string),
        user: None,
    });
    let session = Arc::new(Session::restore(store).unwrap());
    ApiClient::new(base_url, Duration::from_secs(5), session).unwrap()
}

// =============================================================================
// Authentication and refresh
// =============================================================================

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_login_stores_tokens_and_user() {
        let url = spawn_backend(Backend::new()).await;
        let api = client(&url, None, None);

        let user = api.auth().login("anna", "secret").await.unwrap();

        assert_eq!(user.username, "anna");
        assert_eq!(user.display_name(), "Petrova Anna");
        assert_eq!(api.session().access_token().as_deref(), Some("access-1"));
        assert_eq!(api.session().refresh_token().as_deref(), Some("refresh-1"));
        assert_eq!(api.session().user().unwrap().id, 5);
    }

    #[tokio::test]
    async fn test_bad_credentials_surface_server_message() {
        let backend = Backend::new();
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, None, None);

        let err = api.auth().login("anna", "wrong").await.unwrap_err();

        assert_eq!(
            err.user_message(),
            "No active account found with the given credentials"
        );
        assert!(!api.session().is_authenticated());
        assert_eq!(backend.with(|s| s.refresh_calls), 0);
    }

    #[tokio::test]
    async fn test_stale_token_is_refreshed_once_and_request_replayed() {
        let backend = Backend::new();
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("stale"), Some("refresh-1"));
        let mut events = api.session().subscribe();

        let tasks = api.tasks().list(&TaskFilter::default()).await.unwrap();

        assert_eq!(tasks.len(), 3);
        assert_eq!(backend.with(|s| s.refresh_calls), 1);
        assert_eq!(api.session().access_token().as_deref(), Some("access-2"));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
    }

    #[tokio::test]
    async fn test_rejected_refresh_expires_session() {
        let backend = Backend::new();
        backend.with(|s| s.refresh_grants = None);
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("stale"), Some("refresh-1"));
        let mut events = api.session().subscribe();

        let err = api.tasks().mine().await.unwrap_err();

        assert!(matches!(err, ApiError::SessionExpired));
        assert!(!api.session().is_authenticated());
        assert!(api.session().refresh_token().is_none());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
        assert_eq!(backend.with(|s| s.refresh_calls), 1);
    }

    #[tokio::test]
    async fn test_second_401_is_not_retried_again() {
        let backend = Backend::new();
        backend.with(|s| s.refresh_grants = Some("bogus".to_string()));
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("stale"), Some("refresh-1"));

        let err = api.auth().profile().await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(backend.with(|s| s.refresh_calls), 1);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_is_plain_unauthorized() {
        let backend = Backend::new();
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("stale"), None);

        let err = api.auth().profile().await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(backend.with(|s| s.refresh_calls), 0);
        assert!(api.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let backend = Backend::new();
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("stale"), Some("refresh-1"));

        let auth = api.auth();
        let tasks = api.tasks();
        let (a, b, c) = tokio::join!(auth.profile(), tasks.mine(), auth.profile());

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(backend.with(|s| s.refresh_calls), 1);
    }

    #[tokio::test]
    async fn test_check_drops_rejected_session() {
        let backend = Backend::new();
        backend.with(|s| s.refresh_grants = None);
        let url = spawn_backend(backend).await;
        let api = client(&url, Some("stale"), Some("refresh-1"));

        assert!(api.auth().check().await.unwrap().is_none());
        assert!(!api.session().is_authenticated());
    }
}

// =============================================================================
// Resource clients
// =============================================================================

mod resources {
    use super::*;

    #[tokio::test]
    async fn test_every_list_shape_yields_the_same_tasks() {
        let backend = Backend::new();
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        let mut seen = Vec::new();
        for shape in [Shape::Bare, Shape::Results, Shape::Data, Shape::Keyed] {
            backend.with(|s| s.shape = shape);
            let tasks = api.tasks().list(&TaskFilter::default()).await.unwrap();
            seen.push(tasks.iter().map(|t| (t.id, t.status)).collect::<Vec<_>>());
        }

        assert_eq!(
            seen[0],
            vec![
                (1, TaskStatus::Created),
                (7, TaskStatus::OnReview),
                (42, TaskStatus::InWork)
            ]
        );
        assert!(seen.iter().all(|s| *s == seen[0]));
    }

    #[tokio::test]
    async fn test_assignee_accepts_id_or_embedded_user() {
        let url = spawn_backend(Backend::new()).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        let tasks = api.tasks().list(&TaskFilter::default()).await.unwrap();
        assert_eq!(tasks[0].assignee_id(), Some(5));
        assert_eq!(tasks[1].assignee_id(), Some(5));
        assert_eq!(tasks[2].assignee_id(), None);
    }

    #[tokio::test]
    async fn test_action_posts_without_body() {
        let backend = Backend::new();
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        api.tasks().take_to_work(1).await.unwrap();

        let calls = backend.with(|s| s.action_calls.clone());
        assert_eq!(calls, vec![(1, "take_to_work".to_string(), String::new())]);
    }

    #[tokio::test]
    async fn test_field_validation_message_is_surfaced() {
        let url = spawn_backend(Backend::new()).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        let err = api.tasks().update_progress(42, 30).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "progress: Progress cannot decrease on a completed task"
        );
        assert_eq!(err.status(), Some(reqwest::StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_progress_out_of_range_is_rejected_locally() {
        let backend = Backend::new();
        let url = spawn_backend(backend).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        let err = api.tasks().update_progress(42, 120).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_keyed_notifications_and_download() {
        let url = spawn_backend(Backend::new()).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        let items = api.notifications().list().await.unwrap();
        assert_eq!(items.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2]);

        let dir = tempfile::tempdir().unwrap();
        let written = api.files().download(3, dir.path()).await.unwrap();
        assert_eq!(written, dir.path().join("brief-3.txt"));
        assert_eq!(std::fs::read_to_string(written).unwrap(), "moodboard notes");
    }

    #[tokio::test]
    async fn test_poller_reports_unread_from_server() {
        let url = spawn_backend(Backend::new()).await;
        let api = Arc::new(client(&url, Some("access-1"), Some("refresh-1")));

        let poller = NotificationPoller::spawn(api, Duration::from_millis(20));
        let mut rx = poller.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(poller.unread(), 1);
    }
}

// =============================================================================
// Task board over HTTP
// =============================================================================

mod board {
    use super::*;

    async fn board(backend: &Backend) -> TaskBoard<Arc<ApiClient>> {
        let url = spawn_backend(backend.clone()).await;
        let api = Arc::new(client(&url, Some("access-1"), Some("refresh-1")));
        let board = TaskBoard::new(api, BoardScope::All, BoardOptions::default());
        board.load().await.unwrap();
        board
    }

    #[tokio::test]
    async fn test_send_to_review_moves_one_task() {
        let backend = Backend::new();
        let board = board(&backend).await;

        let outcome = board
            .initiate_transition(42, TaskStatus::OnReview)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::Moved {
                from: TaskStatus::InWork,
                to: TaskStatus::OnReview
            }
        );
        assert_eq!(board.column_of(42), Some(TaskStatus::OnReview));
        assert_eq!(board.column_of(1), Some(TaskStatus::Created));
        assert_eq!(board.column_of(7), Some(TaskStatus::OnReview));
        assert_eq!(
            backend.with(|s| s.action_calls.clone()),
            vec![(42, "send_to_review".to_string(), String::new())]
        );
    }

    #[tokio::test]
    async fn test_rejected_complete_keeps_task_on_review() {
        let backend = Backend::new();
        backend.with(|s| s.reject = Some((7, "Task is not ready to be completed".to_string())));
        let board = board(&backend).await;

        let err = board.complete(7).await.unwrap_err();

        match err {
            BoardError::Api(ApiError::Http { status, message }) => {
                assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
                assert_eq!(message, "Task is not ready to be completed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(board.column_of(7), Some(TaskStatus::OnReview));
        assert_eq!(
            board.last_error().as_deref(),
            Some("Task is not ready to be completed")
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_keeps_task_in_place() {
        let backend = Backend::new();
        let (url, stop, server) = spawn_stoppable_backend(backend.clone()).await;
        let api = Arc::new(client(&url, Some("access-1"), Some("refresh-1")));
        let board = TaskBoard::new(api, BoardScope::All, BoardOptions::default());
        board.load().await.unwrap();

        stop.send(()).unwrap();
        server.await.unwrap();

        let err = board
            .initiate_transition(42, TaskStatus::OnReview)
            .await
            .unwrap_err();

        assert!(
            matches!(err, BoardError::Api(ApiError::Transport(_))),
            "unexpected error: {err:?}"
        );
        assert_eq!(board.column_of(42), Some(TaskStatus::InWork));
        assert!(!board.is_busy(42));
        assert!(board.last_error().is_some());
        assert!(backend.with(|s| s.action_calls.is_empty()));
    }

    #[tokio::test]
    async fn test_illegal_target_makes_no_request() {
        let backend = Backend::new();
        let board = board(&backend).await;

        let err = board
            .initiate_transition(42, TaskStatus::Created)
            .await
            .unwrap_err();

        assert!(matches!(err, BoardError::NoTransition { .. }));
        assert!(backend.with(|s| s.action_calls.is_empty()));
        assert_eq!(board.column_of(42), Some(TaskStatus::InWork));
    }
}

// =============================================================================
// Dashboard
// =============================================================================

mod dashboard {
    use super::*;
    use studio::dashboard;

    fn with_deadlines(backend: &Backend) {
        backend.with(|s| {
            s.tasks[0]["deadline"] = json!("2020-01-10");
            s.tasks.push(json!({"id": 50, "title": "Flyer", "status": "completed",
                                "deadline": "2020-01-10"}));
        });
    }

    #[tokio::test]
    async fn test_management_summary_uses_stats_endpoint() {
        let backend = Backend::new();
        with_deadlines(&backend);
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        let summary = dashboard::load(&api, BoardScope::All, true).await.unwrap();

        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.count(TaskStatus::Created), 1);
        assert_eq!(summary.count(TaskStatus::OnReview), 1);
        assert_eq!(summary.count(TaskStatus::InWork), 1);
        assert_eq!(summary.count(TaskStatus::Completed), 1);
        // The completed task is past its deadline too, but closed.
        assert_eq!(summary.overdue, 1);
        let projects = summary.projects.unwrap();
        assert_eq!(projects.total_projects, 5);
        assert_eq!(projects.active_projects, 3);
        assert_eq!(backend.with(|s| s.stats_calls), 1);
    }

    #[tokio::test]
    async fn test_missing_stats_endpoint_falls_back_to_project_list() {
        let backend = Backend::new();
        backend.with(|s| s.project_stats = None);
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        let summary = dashboard::load(&api, BoardScope::All, true).await.unwrap();

        let projects = summary.projects.unwrap();
        assert_eq!(projects.total_projects, 2);
        assert_eq!(projects.active_projects, 1);
        assert_eq!(projects.paused_projects, 1);
        assert_eq!(backend.with(|s| s.stats_calls), 1);
    }

    #[tokio::test]
    async fn test_executor_summary_skips_projects() {
        let backend = Backend::new();
        let url = spawn_backend(backend.clone()).await;
        let api = client(&url, Some("access-1"), Some("refresh-1"));

        let summary = dashboard::load(&api, BoardScope::Mine, false).await.unwrap();

        assert_eq!(summary.scope, BoardScope::Mine);
        assert_eq!(summary.total_tasks, 3);
        assert!(summary.projects.is_none());
        assert_eq!(backend.with(|s| s.stats_calls), 0);
    }
}
