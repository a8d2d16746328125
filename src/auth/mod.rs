use axum::{routing::{get, post}, Router};
use serde::Serialize;
use tokio::task::spawn_blocking;

use crate::{users::User, AppState};

mod login;
mod logout;
mod register;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register))
        .route("/login", post(login::login))
        .route("/logout/{id}", get(logout::logout))
}

/// Reply shared by register and login. Rejections are ordinary 200 replies
/// with `status: false`, the way the client expects them.
#[derive(Debug, Serialize)]
pub(crate) struct AuthReply {
    status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

impl AuthReply {
    pub(crate) fn accepted(user: User) -> Self {
        Self { status: true, msg: None, user: Some(user) }
    }

    pub(crate) fn rejected(msg: impl Into<String>) -> Self {
        Self { status: false, msg: Some(msg.into()), user: None }
    }
}

pub(crate) async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    Ok(spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

pub(crate) async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    Ok(spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}
