use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{
    config::Config,
    error::{ChatError, ChatResult},
    session::USER_ID,
    users::{Directory, User},
    AppResult,
};

use super::{hash_password, AuthReply};

#[derive(Deserialize)]
pub(crate) struct RegisterRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl RegisterRequest {
    fn problem(&self) -> Option<&'static str> {
        if self.username.chars().count() < 3 {
            Some("Username should be greater than 3 characters.")
        } else if self.password.chars().count() < 8 {
            Some("Password should be equal or greater than 8 characters.")
        } else if self.email.is_empty() {
            Some("Email is required.")
        } else {
            None
        }
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    State(directory): State<Directory>,
    State(config): State<Arc<Config>>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<AuthReply>> {
    if let Some(problem) = request.problem() {
        return Ok(Json(AuthReply::rejected(problem)));
    }
    if directory.username_taken(&request.username).await? {
        return Ok(Json(AuthReply::rejected("Username already used")));
    }
    if directory.email_taken(&request.email).await? {
        return Ok(Json(AuthReply::rejected("Email already used")));
    }

    let RegisterRequest { username, email, password } = request;
    let password_hash = hash_password(password, config.bcrypt_cost).await?;
    let user = match create_account(&directory, &username, &email, &password_hash).await? {
        Ok(user) => user,
        Err(taken) => return Ok(Json(AuthReply::rejected(taken))),
    };

    session.insert(USER_ID, &user.id).await?;
    info!("registered @{username} as u/{}", user.id);

    Ok(Json(AuthReply::accepted(user)))
}

/// Inserts the user, turning a unique-key clash into the same rejection the
/// up-front checks give. A concurrent registration can take the name or email
/// between those checks and the insert.
async fn create_account(
    directory: &Directory,
    username: &str,
    email: &str,
    password_hash: &str,
) -> ChatResult<Result<User, &'static str>> {
    match directory.create_user(username, email, password_hash).await {
        Ok(user) => Ok(Ok(user)),
        Err(ChatError::InvalidArgument(_)) if directory.username_taken(username).await? => {
            Ok(Err("Username already used"))
        }
        Err(ChatError::InvalidArgument(_)) => Ok(Err("Email already used")),
        Err(e) => Err(e),
    }
}
