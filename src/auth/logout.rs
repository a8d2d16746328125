use axum::{debug_handler, extract::{Path, State}, http::StatusCode};
use tower_sessions::Session;

use crate::{relay::Relay, AppResult};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn logout(
    Path(id): Path<String>,
    State(relay): State<Relay>,
    session: Session,
) -> AppResult<StatusCode> {
    relay.disconnect(&id);
    session.clear().await;
    Ok(StatusCode::OK)
}
