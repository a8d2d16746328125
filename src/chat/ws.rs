use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    debug_handler,
    extract::{ws::{Message, WebSocket}, State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{ChatError, ChatResult},
    relay::{ConnectionGuard, Relay, TransportSession},
};

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub(crate) enum ClientEvent {
    AddUser(String),
    SendMsg(SendMsg),
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct SendMsg {
    #[serde(default)]
    to: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    msg: String,
}

/// Outbound half of one websocket, as the relay sees it.
pub struct SocketSession {
    id: Uuid,
    outbound: mpsc::Sender<String>,
}

impl SocketSession {
    pub fn new(outbound: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            outbound,
        }
    }
}

#[async_trait]
impl TransportSession for SocketSession {
    fn id(&self) -> Uuid {
        self.id
    }

    async fn push(&self, event: &str, payload: &str) -> ChatResult<()> {
        let frame = json!({ "event": event, "data": payload }).to_string();
        self.outbound
            .send(frame)
            .await
            .map_err(|_| ChatError::TransportClosed)
    }

    async fn closed(&self) {
        self.outbound.closed().await
    }
}

#[debug_handler(state = crate::AppState)]
pub async fn socket(
    State(relay): State<Relay>,
    State(config): State<Arc<Config>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let buffer = config.socket_buffer;
    ws.on_upgrade(move |stream| serve(stream, relay, buffer))
}

async fn serve(stream: WebSocket, relay: Relay, buffer: usize) {
    let (mut sender, mut receiver) = stream.split();
    let (outbound, mut queued) = mpsc::channel::<String>(buffer);
    let session = Arc::new(SocketSession::new(outbound));

    let writer = tokio::spawn(async move {
        while let Some(frame) = queued.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut connection: Option<ConnectionGuard> = None;

    loop {
        let frame = tokio::select! {
            frame = receiver.next() => frame,
            // the writer dropped its end of the queue: the peer is gone
            _ = session.closed() => break,
        };

        let event = match frame {
            Some(Ok(Message::Text(text))) => serde_json::from_str::<ClientEvent>(text.as_str()),
            Some(Ok(Message::Binary(data))) => serde_json::from_slice::<ClientEvent>(&data),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
        };

        match event {
            Ok(ClientEvent::AddUser(user_id)) if !user_id.is_empty() => {
                // release the old binding before taking the new one, it may be the same user
                connection.take();
                connection = Some(relay.register_connection(&user_id, session.clone()));
                info!("u/{user_id} connected on session {}", session.id());
            }
            Ok(ClientEvent::AddUser(_)) => warn!("add-user without a user id"),
            // live forward only, the client appends through /api/messages/addmsg
            Ok(ClientEvent::SendMsg(SendMsg { to, from, msg })) => {
                if let Err(e) = relay.push_live(&from, &to, &msg).await {
                    warn!("send-msg from u/{from} to u/{to} failed: {e}");
                }
            }
            Err(e) => warn!("skipping socket frame: {e}"),
        }
    }

    if let Some(connection) = connection.take() {
        info!("u/{} disconnected", connection.user_id());
    }
    writer.abort();
}
