//! Backend for a two-party chat: user directory, message history and a live
//! relay that pushes each new message to the recipient's open websocket.

pub mod appresult;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod relay;
pub mod session;
pub mod users;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult};
use config::Config;
use relay::{Relay, SqliteMessageStore};
use users::Directory;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub relay: Relay,
    pub directory: Directory,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        let store = SqliteMessageStore::new(db_pool.clone());

        Self {
            relay: Relay::new(Arc::new(store), config.push_timeout),
            directory: Directory::new(db_pool),
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(state.config.session_inactivity));

    let cors = CorsLayer::new()
        .allow_origin(match &state.config.cors_origin {
            Some(origin) => AllowOrigin::exact(origin.clone()),
            None => AllowOrigin::any(),
        })
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .nest("/api/auth", auth::router().merge(users::router()))
        .nest("/api/messages", chat::router())
        .route("/ws", get(chat::socket))
        .with_state(state)
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
