//! In-process HTTP backend used by the integration tests.
#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use regpanel::core::Controller;

/// What the fake backend answers and what it has seen.
pub struct BackendState {
    pub ports: Mutex<Vec<String>>,
    pub read_body: Mutex<Value>,
    pub read_status: Mutex<u16>,
    pub reads: Mutex<Vec<String>>,
    pub submits: Mutex<Vec<(String, Value)>>,
    /// Raw text answered to submits instead of the echoed body.
    pub submit_reply: Mutex<Option<String>>,
}

impl BackendState {
    pub fn new(ports: &[&str], registers: &[u16]) -> Self {
        Self {
            ports: Mutex::new(ports.iter().map(|p| p.to_string()).collect()),
            read_body: Mutex::new(json!({ "registers": registers })),
            read_status: Mutex::new(200),
            reads: Mutex::new(Vec::new()),
            submits: Mutex::new(Vec::new()),
            submit_reply: Mutex::new(None),
        }
    }
}

pub struct MockBackend {
    pub state: Arc<BackendState>,
    pub base_url: String,
    _runtime: tokio::runtime::Runtime,
}

async fn list(State(state): State<Arc<BackendState>>) -> Json<Value> {
    let ports = state.ports.lock().unwrap().clone();
    Json(json!({ "ports": ports }))
}

async fn read(
    State(state): State<Arc<BackendState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let port = query.get("port").cloned().unwrap_or_default();
    state.reads.lock().unwrap().push(port);

    let status = *state.read_status.lock().unwrap();
    if status != 200 {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (code, "modbus read failed").into_response();
    }
    let body = state.read_body.lock().unwrap().clone();
    Json(body).into_response()
}

async fn submit(
    State(state): State<Arc<BackendState>>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let port = query.get("port").cloned().unwrap_or_default();
    state.submits.lock().unwrap().push((port, body.clone()));
    match state.submit_reply.lock().unwrap().clone() {
        Some(text) => (StatusCode::OK, text).into_response(),
        None => Json(json!({ "data": body })).into_response(),
    }
}

impl MockBackend {
    pub fn start(state: BackendState) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("Failed to build tokio runtime");

        let state = Arc::new(state);
        let app = Router::new()
            .route("/api/list", get(list))
            .route("/api/read", get(read))
            .route("/api/submit", post(submit))
            .with_state(state.clone());

        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        runtime.spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock backend stopped");
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
            _runtime: runtime,
        }
    }
}

/// A base URL nothing is listening on.
pub fn dead_backend_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("http://{addr}")
}

/// Apply outcomes until `done` holds, failing the test after five seconds.
pub fn pump_until(controller: &mut Controller, done: impl Fn(&Controller) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(controller) {
        assert!(Instant::now() < deadline, "timed out waiting for the core worker");
        controller
            .pump_blocking(Duration::from_millis(50))
            .expect("core worker stopped");
    }
}
