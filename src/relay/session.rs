use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ChatResult;

/// Event the recipient's session receives for every relayed message.
pub const MSG_RECEIVE: &str = "msg-recieve";

/// A live, bidirectional channel to one connected client.
///
/// The relay only ever pushes; inbound traffic is handled by whatever owns the
/// transport (see `chat::ws`).
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// Stable for the lifetime of the session. Two sessions never share an id.
    fn id(&self) -> Uuid;

    /// Queues `payload` under `event`. Fails with `ChatError::TransportClosed`
    /// once the client has gone away.
    async fn push(&self, event: &str, payload: &str) -> ChatResult<()>;

    /// Resolves when the transport is closed.
    async fn closed(&self);
}
