mod avatar;
mod contacts;
mod directory;

use axum::{routing::{get, post}, Router};

pub use directory::{Contact, Directory, User, UserDirectory};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/setavatar/{id}", post(avatar::set_avatar))
        .route("/avatars", get(avatar::avatar_candidates))
        .route("/allusers/{id}", get(contacts::all_users))
        .route("/user/{id}", get(contacts::user))
}
