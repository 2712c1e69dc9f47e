#![allow(dead_code)]

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::NaiveDate;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tooltrack_api::{
    config::AppConfig,
    db,
    entities::{employee, tool, work_center},
    events::{self, EventSender},
    services::{employees::CreateEmployee, tools::CreateTool, work_centers::CreateWorkCenter},
    AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up the full router over a fresh SQLite
/// database in a temporary directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_pool_size(1).await
    }

    /// Same as [`TestApp::new`] but with `connections` pooled connections, so
    /// concurrent requests really run on separate database connections.
    pub async fn with_pool_size(connections: u32) -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("tooltrack_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(std::sync::Arc::new(pool), cfg, event_sender);
        let router = tooltrack_api::app_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        send(self.router.clone(), method, uri, body).await
    }

    /// A handle on the router for requests issued from spawned tasks.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn seed_work_center(&self, name: &str) -> work_center::Model {
        self.state
            .services
            .work_centers
            .create(CreateWorkCenter {
                name: name.to_string(),
                location: format!("{} bay", name),
                supervisor: "Dana Reyes".to_string(),
                description: None,
                is_active: true,
            })
            .await
            .expect("seed work center for tests")
    }

    pub async fn seed_employee(&self, number: &str) -> employee::Model {
        self.state
            .services
            .employees
            .create(CreateEmployee {
                first_name: "Sam".to_string(),
                last_name: format!("Operator {}", number),
                employee_number: number.to_string(),
                department: "Assembly".to_string(),
                email: None,
                phone: None,
                hire_date: NaiveDate::from_ymd_opt(2020, 3, 1),
                is_active: true,
                primary_work_center_id: None,
            })
            .await
            .expect("seed employee for tests")
    }

    pub async fn seed_tool(&self, serial: &str, location: Option<Uuid>) -> tool::Model {
        self.state
            .services
            .tools
            .create(CreateTool {
                name: format!("Caliper {}", serial),
                serial_number: serial.to_string(),
                calibrated: true,
                description: None,
                current_location_id: location,
                status: None,
            })
            .await
            .expect("seed tool for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub async fn response_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 response")
}

/// Send a request through `router` with an optional JSON body.
pub async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);

    let body = if let Some(json) = body {
        builder = builder.header("content-type", "application/json");
        Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
    } else {
        Body::empty()
    };

    let request = builder.body(body).expect("failed to build request");
    router
        .oneshot(request)
        .await
        .expect("router error during test request")
}
