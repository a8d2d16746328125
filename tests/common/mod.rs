//! Shared helpers for the integration tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use snappy::{
    config::Config,
    db,
    error::{ChatError, ChatResult},
    relay::TransportSession,
    AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

/// App state over a fresh in-memory database, with cheap password hashing.
#[allow(dead_code)]
pub async fn state() -> AppState {
    let config = Config {
        bcrypt_cost: 4,
        ..Config::default()
    };
    AppState::new(db::memory().await.unwrap(), config)
}

/// Records every push, or refuses them all once hung up.
pub struct RecordingSession {
    id: Uuid,
    pushes: Mutex<Vec<(String, String)>>,
    hung_up: AtomicBool,
}

#[allow(dead_code)]
impl RecordingSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::now_v7(),
            pushes: Mutex::new(Vec::new()),
            hung_up: AtomicBool::new(false),
        })
    }

    pub fn hang_up(&self) {
        self.hung_up.store(true, Ordering::SeqCst);
    }

    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.lock().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.pushes().into_iter().map(|(_, body)| body).collect()
    }
}

#[async_trait]
impl TransportSession for RecordingSession {
    fn id(&self) -> Uuid {
        self.id
    }

    async fn push(&self, event: &str, payload: &str) -> ChatResult<()> {
        if self.hung_up.load(Ordering::SeqCst) {
            return Err(ChatError::TransportClosed);
        }
        self.pushes.lock().push((event.to_owned(), payload.to_owned()));
        Ok(())
    }

    async fn closed(&self) {}
}

/// Sends one request through the router and returns status and JSON body
/// (`Value::Null` when the body is empty).
#[allow(dead_code)]
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}
