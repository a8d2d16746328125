use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::session::TransportSession;

const SHARDS: usize = 16;

type Shard = RwLock<HashMap<String, Arc<dyn TransportSession>>>;

/// Maps user ids to their single live session.
///
/// Users are hashed over a fixed set of shards, each behind its own lock.
/// Two users only wait on each other when they land in the same shard, and
/// then only for a map insert or lookup: no lock is held while a session is
/// used.
#[derive(Clone)]
pub struct ConnectionRegistry {
    shards: Arc<[Shard]>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, user_id: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }

    /// Binds `session` to `user_id`, returning whatever it replaced.
    pub fn register(
        &self,
        user_id: &str,
        session: Arc<dyn TransportSession>,
    ) -> Option<Arc<dyn TransportSession>> {
        let replaced = self.shard(user_id).write().insert(user_id.to_owned(), session);
        if let Some(old) = &replaced {
            debug!("u/{user_id} rebound, dropping session {}", old.id());
        }
        replaced
    }

    /// Like [`register`](Self::register), but the binding lives as long as the
    /// returned guard.
    pub fn subscribe(&self, user_id: &str, session: Arc<dyn TransportSession>) -> ConnectionGuard {
        let session_id = session.id();
        self.register(user_id, session);

        ConnectionGuard {
            registry: self.clone(),
            user_id: user_id.to_owned(),
            session_id,
        }
    }

    pub fn get(&self, user_id: &str) -> Option<Arc<dyn TransportSession>> {
        self.shard(user_id).read().get(user_id).cloned()
    }

    pub fn is_live(&self, user_id: &str) -> bool {
        self.shard(user_id).read().contains_key(user_id)
    }

    /// Unbinds whatever session `user_id` has. Returns false if there was none.
    pub fn disconnect(&self, user_id: &str) -> bool {
        self.shard(user_id).write().remove(user_id).is_some()
    }

    /// Unbinds `user_id` only while it is still bound to `session_id`.
    pub fn disconnect_session(&self, user_id: &str, session_id: Uuid) -> bool {
        let mut shard = self.shard(user_id).write();
        match shard.get(user_id) {
            Some(current) if current.id() == session_id => {
                shard.remove(user_id);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a user bound to one session. Dropping it releases the binding unless
/// a newer session has taken over in the meantime.
#[must_use = "the connection is released as soon as the guard is dropped"]
pub struct ConnectionGuard {
    registry: ConnectionRegistry,
    user_id: String,
    session_id: Uuid,
}

impl ConnectionGuard {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.registry.disconnect_session(&self.user_id, self.session_id) {
            debug!("u/{} released session {}", self.user_id, self.session_id);
        }
    }
}
