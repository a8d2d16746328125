use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{relay::{Message, Relay}, AppResult};

#[derive(Deserialize)]
pub(crate) struct HistoryRequest {
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
}

/// One bubble of the conversation as `viewer` sees it.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryEntry {
    from_self: bool,
    message: String,
}

impl HistoryEntry {
    fn seen_by(viewer: &str, message: Message) -> Self {
        Self {
            from_self: message.from_self(viewer),
            message: message.body,
        }
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn get_msg(
    State(relay): State<Relay>,
    Json(HistoryRequest { from, to }): Json<HistoryRequest>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    let entries = relay
        .fetch_history(&from, &to)
        .await?
        .into_iter()
        .map(|message| HistoryEntry::seen_by(&from, message))
        .collect();

    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn direction_is_relative_to_the_viewer() {
        let message = Message {
            id: Uuid::now_v7(),
            from: "u1".into(),
            to: "u2".into(),
            body: "hello".into(),
            sent_at: 0,
        };

        let mine = HistoryEntry::seen_by("u1", message.clone());
        let theirs = HistoryEntry::seen_by("u2", message);

        assert!(mine.from_self);
        assert!(!theirs.from_self);
        assert_eq!(
            serde_json::to_value(&theirs).unwrap(),
            serde_json::json!({ "fromSelf": false, "message": "hello" })
        );
    }
}
