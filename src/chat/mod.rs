mod history;
mod msg;
mod ws;

use axum::{routing::post, Router};

pub use ws::{socket, SocketSession};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addmsg", post(msg::add_msg))
        .route("/getmsg", post(history::get_msg))
}
