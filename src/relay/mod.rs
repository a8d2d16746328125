//! Point-to-point message relay.
//!
//! Every send is written to the [`MessageStore`] first. Once that succeeds the
//! message is also pushed to the recipient's live session, if the
//! [`ConnectionRegistry`] has one. The push is best effort: it is bounded by a
//! timeout, never retried, and its failure never reaches the sender, since the
//! recipient will see the message on its next history fetch anyway.
//!
//! The two halves are also reachable on their own: [`Relay::store`] for a
//! client that appends over REST, and [`Relay::push_live`] for the socket
//! event that only forwards to the live recipient.

mod registry;
mod session;
mod store;

use std::{sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::{debug, warn};

pub use registry::{ConnectionGuard, ConnectionRegistry};
pub use session::{TransportSession, MSG_RECEIVE};
pub use store::{ConversationKey, Message, MessageStore, NewMessage, SqliteMessageStore};

use crate::error::{ChatError, ChatResult};

#[derive(Clone)]
pub struct Relay {
    store: Arc<dyn MessageStore>,
    registry: ConnectionRegistry,
    push_timeout: Duration,
}

impl Relay {
    pub fn new(store: Arc<dyn MessageStore>, push_timeout: Duration) -> Self {
        Self {
            store,
            registry: ConnectionRegistry::new(),
            push_timeout,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Makes `session` the live connection of `user_id` until the guard drops.
    pub fn register_connection(
        &self,
        user_id: &str,
        session: Arc<dyn TransportSession>,
    ) -> ConnectionGuard {
        debug!("u/{user_id} live on session {}", session.id());
        self.registry.subscribe(user_id, session)
    }

    pub fn disconnect(&self, user_id: &str) {
        if self.registry.disconnect(user_id) {
            debug!("u/{user_id} disconnected");
        }
    }

    /// Stores the message, then pushes it if the recipient is live.
    pub async fn send(&self, from: &str, to: &str, body: &str) -> ChatResult<Message> {
        let message = self.store(from, to, body).await?;
        if let Some(session) = self.registry.get(&message.to) {
            self.push(&message.to, session, &message.body).await;
        }

        Ok(message)
    }

    /// The durable half of [`Relay::send`]: nothing is pushed.
    pub async fn store(&self, from: &str, to: &str, body: &str) -> ChatResult<Message> {
        validate(from, to, body)?;

        let new_message = NewMessage {
            from: from.to_owned(),
            to: to.to_owned(),
            body: body.to_owned(),
            sent_at: now_millis(),
        };
        let id = self
            .store
            .append_message(&ConversationKey::new(from, to), &new_message)
            .await?;

        let NewMessage { from, to, body, sent_at } = new_message;
        Ok(Message { id, from, to, body, sent_at })
    }

    /// The live half of [`Relay::send`]: best-effort push, nothing is stored.
    /// Returns whether the recipient had a session to push to.
    pub async fn push_live(&self, from: &str, to: &str, body: &str) -> ChatResult<bool> {
        validate(from, to, body)?;

        match self.registry.get(to) {
            Some(session) => {
                self.push(to, session, body).await;
                Ok(true)
            }
            None => {
                debug!("u/{to} is offline, nothing pushed");
                Ok(false)
            }
        }
    }

    async fn push(&self, to: &str, session: Arc<dyn TransportSession>, body: &str) {
        match timeout(self.push_timeout, session.push(MSG_RECEIVE, body)).await {
            Ok(Ok(())) => debug!("pushed to u/{to}"),
            Ok(Err(ChatError::TransportClosed)) => {
                warn!("u/{to} session {} is closed, unbinding", session.id());
                self.registry.disconnect_session(to, session.id());
            }
            Ok(Err(e)) => warn!("push to u/{to} failed: {e}"),
            Err(_) => warn!("push to u/{to} timed out after {:?}", self.push_timeout),
        }
    }

    pub async fn fetch_history(&self, a: &str, b: &str) -> ChatResult<Vec<Message>> {
        if a.is_empty() || b.is_empty() {
            return Err(ChatError::invalid("both user ids are required"));
        }

        self.store.list_messages(&ConversationKey::new(a, b)).await
    }
}

fn validate(from: &str, to: &str, body: &str) -> ChatResult<()> {
    if from.is_empty() {
        return Err(ChatError::invalid("sender id is required"));
    }
    if to.is_empty() {
        return Err(ChatError::invalid("recipient id is required"));
    }
    if body.is_empty() {
        return Err(ChatError::invalid("message body is empty"));
    }
    Ok(())
}

fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
