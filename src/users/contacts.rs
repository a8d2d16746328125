use axum::{debug_handler, extract::{Path, State}, Json};

use crate::AppResult;

use super::{Contact, Directory, UserDirectory};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn all_users(
    Path(id): Path<String>,
    State(directory): State<Directory>,
) -> AppResult<Json<Vec<Contact>>> {
    Ok(Json(directory.contacts(&id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn user(
    Path(id): Path<String>,
    State(directory): State<Directory>,
) -> AppResult<Json<Contact>> {
    Ok(Json(directory.get_user(&id).await?.into()))
}
