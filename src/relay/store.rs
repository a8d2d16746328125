use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{ChatError, ChatResult};

/// Unordered pair of user ids naming a two-party conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    low: String,
    high: String,
}

impl ConversationKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_owned(),
            high: high.to_owned(),
        }
    }

    pub fn members(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: String,
    pub to: String,
    pub body: String,
    pub sent_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub body: String,
    /// Unix milliseconds.
    pub sent_at: i64,
}

impl Message {
    pub fn from_self(&self, viewer: &str) -> bool {
        self.from == viewer
    }
}

/// Durable message history, one ordered log per conversation.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append_message(&self, key: &ConversationKey, message: &NewMessage) -> ChatResult<Uuid>;

    /// Every message of the conversation in the order it was appended.
    async fn list_messages(&self, key: &ConversationKey) -> ChatResult<Vec<Message>>;
}

#[derive(Clone)]
pub struct SqliteMessageStore {
    db_pool: SqlitePool,
}

impl SqliteMessageStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append_message(&self, key: &ConversationKey, message: &NewMessage) -> ChatResult<Uuid> {
        let id = Uuid::now_v7();
        let (low, high) = key.members();

        sqlx::query("INSERT INTO messages (id,user_low,user_high,sender,recipient,body,sent_at) VALUES (?,?,?,?,?,?,?)")
            .bind(id.to_string())
            .bind(low)
            .bind(high)
            .bind(&message.from)
            .bind(&message.to)
            .bind(&message.body)
            .bind(message.sent_at)
            .execute(&self.db_pool)
            .await?;

        Ok(id)
    }

    async fn list_messages(&self, key: &ConversationKey) -> ChatResult<Vec<Message>> {
        let (low, high) = key.members();

        let rows: Vec<(String, String, String, String, i64)> =
            sqlx::query_as("SELECT id,sender,recipient,body,sent_at FROM messages WHERE user_low=? AND user_high=? ORDER BY seq")
                .bind(low)
                .bind(high)
                .fetch_all(&self.db_pool)
                .await?;

        rows.into_iter()
            .map(|(id, from, to, body, sent_at)| {
                Ok(Message {
                    id: Uuid::parse_str(&id).map_err(|e| ChatError::StorageUnavailable(e.into()))?,
                    from,
                    to,
                    body,
                    sent_at,
                })
            })
            .collect()
    }
}
