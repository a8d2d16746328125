use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{session::USER_ID, users::Directory, AppResult};

use super::{verify_password, AuthReply};

const INCORRECT: &str = "Incorrect Username or Password";

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    State(directory): State<Directory>,
    session: Session,
    Json(LoginRequest { username, password }): Json<LoginRequest>,
) -> AppResult<Json<AuthReply>> {
    let Some((user, password_hash)) = directory.credentials(&username).await? else {
        return Ok(Json(AuthReply::rejected(INCORRECT)));
    };

    if !verify_password(password, password_hash).await? {
        return Ok(Json(AuthReply::rejected(INCORRECT)));
    }

    session.insert(USER_ID, &user.id).await?;
    info!("welcome @{username} (u/{})", user.id);

    Ok(Json(AuthReply::accepted(user)))
}
