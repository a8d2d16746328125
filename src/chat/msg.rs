use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{relay::Relay, AppResult};

#[derive(Deserialize)]
pub(crate) struct AddMessageRequest {
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
pub(crate) struct AddMessageReply {
    msg: &'static str,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn add_msg(
    State(relay): State<Relay>,
    Json(AddMessageRequest { from, to, message }): Json<AddMessageRequest>,
) -> AppResult<Json<AddMessageReply>> {
    // durable append only, the live push travels on the socket's send-msg
    relay.store(&from, &to, &message).await?;

    Ok(Json(AddMessageReply {
        msg: "Message added successfully.",
    }))
}
