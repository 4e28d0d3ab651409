//! Provides an abstracted interface to the underlying session store. Only the
//! session middleware talks to the store: one load when a request comes in and
//! one save on the way out.
use crate::constants::redis as constants;
use async_trait::async_trait;
use parking_lot::Mutex;
use redis::{aio::MultiplexedConnection, AsyncCommands as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use time::OffsetDateTime;

/// Everything persisted for one session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionRecord {
    /// The moment the session stops being valid, fixed when it is created.
    #[serde(with = "time::serde::timestamp")]
    pub deadline: OffsetDateTime,
    /// The session's data, keyed by name.
    pub values: HashMap<String, Value>,
}

impl SessionRecord {
    /// An empty record valid for `lifetime` from now.
    pub fn new(lifetime: time::Duration) -> Self {
        Self {
            deadline: OffsetDateTime::now_utc() + lifetime,
            values: HashMap::new(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.deadline <= OffsetDateTime::now_utc()
    }

    /// Whole seconds left before the deadline, if any remain.
    pub fn remaining_seconds(&self) -> Option<u64> {
        let remaining = (self.deadline - OffsetDateTime::now_utc()).whole_seconds();
        u64::try_from(remaining).ok().filter(|secs| *secs > 0)
    }
}

/// A durable key-value store for session data keyed by an opaque token.
/// Implementations must be safe to use from many requests at once; the last
/// write to a token wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the record stored under `token`. Missing and expired records are
    /// both reported as `None`.
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, errors::SessionStorageError>;
    /// Store `record` under `token` until its deadline.
    async fn save(&self, token: &str, record: &SessionRecord)
        -> Result<(), errors::SessionStorageError>;
    /// Remove the record stored under `token`, if any.
    async fn destroy(&self, token: &str) -> Result<(), errors::SessionStorageError>;
}

#[derive(Clone)]
/// A connection to the Redis session store. Guaranteed to be safe to clone and
/// share between threads.
pub struct Connection(MultiplexedConnection);

impl Connection {
    /// Initiate a new (multiplexed) connection to the session store.
    pub async fn connect() -> Result<Self, errors::SessionStorageError> {
        Ok(Self(
            redis::Client::open(constants::REDIS_URL.as_str())?
                .get_multiplexed_async_connection()
                .await?,
        ))
    }
}

fn key_for(token: &str) -> String {
    format!("{}{token}", constants::SESSION_KEY_PREFIX)
}

#[async_trait]
impl SessionStore for Connection {
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, errors::SessionStorageError> {
        let raw: Option<String> = self.0.clone().get(key_for(token)).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let record: SessionRecord = serde_json::from_str(&raw)?;
        Ok((!record.is_expired()).then_some(record))
    }

    async fn save(
        &self,
        token: &str,
        record: &SessionRecord,
    ) -> Result<(), errors::SessionStorageError> {
        let mut conn = self.0.clone();
        let Some(ttl) = record.remaining_seconds() else {
            let _: () = conn.del(key_for(token)).await?;
            return Ok(());
        };
        let raw = serde_json::to_string(record)?;
        let _: () = conn.set_ex(key_for(token), raw, ttl).await?;
        Ok(())
    }

    async fn destroy(&self, token: &str) -> Result<(), errors::SessionStorageError> {
        let _: () = self.0.clone().del(key_for(token)).await?;
        Ok(())
    }
}

/// An in-process session store. Used by tests, and handy for running the
/// server without Redis during development.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records currently held.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .values()
            .filter(|record| !record.is_expired())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Peek at a record without going through the request pipeline.
    pub fn get(&self, token: &str) -> Option<SessionRecord> {
        self.records
            .lock()
            .get(token)
            .filter(|record| !record.is_expired())
            .cloned()
    }

    /// Plant a record directly, e.g. to simulate a session created elsewhere.
    pub fn insert(&self, token: &str, record: SessionRecord) {
        self.records.lock().insert(token.to_owned(), record);
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, errors::SessionStorageError> {
        let mut records = self.records.lock();
        if records.get(token).is_some_and(SessionRecord::is_expired) {
            records.remove(token);
        }
        Ok(records.get(token).cloned())
    }

    async fn save(
        &self,
        token: &str,
        record: &SessionRecord,
    ) -> Result<(), errors::SessionStorageError> {
        let mut records = self.records.lock();
        if record.is_expired() {
            records.remove(token);
        } else {
            records.insert(token.to_owned(), record.clone());
        }
        Ok(())
    }

    async fn destroy(&self, token: &str) -> Result<(), errors::SessionStorageError> {
        self.records.lock().remove(token);
        Ok(())
    }
}

/// Errors returned by functions in this module.
pub mod errors {
    use redis::RedisError;
    use thiserror::Error;

    /// An error returned by the underlying storage layer.
    #[derive(Error, Debug)]
    pub enum SessionStorageError {
        /// The Redis backend failed or could not be reached.
        #[error(transparent)]
        Redis(#[from] RedisError),
        /// A stored record could not be encoded or decoded.
        #[error("malformed session record: {0}")]
        Serialization(#[from] serde_json::Error),
        /// The store cannot serve requests right now.
        #[error("session store unavailable: {0}")]
        Unavailable(String),
    }
}
