//! Key-value store access and the smoke test run by `kv-demo`.

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";

#[derive(Debug, Error)]
pub enum KvError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
    #[error("value at `{0}` is not an integer")]
    NotAnInteger(String),
    #[error("value at `{0}` holds the wrong kind of value")]
    WrongType(String),
}

pub type KvResult<T> = Result<T, KvError>;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> KvResult<()>;
    async fn get(&self, key: &str) -> KvResult<Option<String>>;
    /// Increment by one, treating a missing key as zero. Returns the new value.
    async fn incr(&self, key: &str) -> KvResult<i64>;
    /// Add `member` to the set at `key`; true if it was not already present.
    async fn sadd(&self, key: &str, member: &str) -> KvResult<bool>;
    async fn smembers(&self, key: &str) -> KvResult<Vec<String>>;
}

/// `KeyValueStore` over a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> KvResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        debug!(url, "connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, 1).await?)
    }

    async fn sadd(&self, key: &str, member: &str) -> KvResult<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.sadd(key, member).await?;
        Ok(added > 0)
    }

    async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.smembers(key).await?)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Text(String),
    Set(BTreeSet<String>),
}

/// Process-local store with the same semantics as the Redis commands used
/// here. Data lives only as long as the value.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), Entry::Text(value.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        match self.entries.lock().await.get(key) {
            None => Ok(None),
            Some(Entry::Text(value)) => Ok(Some(value.clone())),
            Some(Entry::Set(_)) => Err(KvError::WrongType(key.to_string())),
        }
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        let mut entries = self.entries.lock().await;
        let current = match entries.get(key) {
            None => 0,
            Some(Entry::Text(value)) => value
                .parse::<i64>()
                .map_err(|_| KvError::NotAnInteger(key.to_string()))?,
            Some(Entry::Set(_)) => return Err(KvError::WrongType(key.to_string())),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| KvError::NotAnInteger(key.to_string()))?;
        entries.insert(key.to_string(), Entry::Text(next.to_string()));
        Ok(next)
    }

    async fn sadd(&self, key: &str, member: &str) -> KvResult<bool> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()));
        match entry {
            Entry::Set(members) => Ok(members.insert(member.to_string())),
            Entry::Text(_) => Err(KvError::WrongType(key.to_string())),
        }
    }

    async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        match self.entries.lock().await.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(Entry::Text(_)) => Err(KvError::WrongType(key.to_string())),
        }
    }
}

/// Everything the smoke test observed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SmokeReport {
    pub value: Option<String>,
    pub counter: i64,
    pub connections: Vec<String>,
}

/// set/get, incr, then sadd/smembers against `store`.
pub async fn run_smoke_test<S>(store: &S) -> KvResult<SmokeReport>
where
    S: KeyValueStore + ?Sized,
{
    store.set("key", "val").await?;
    let value = store.get("key").await?;

    let counter = store.incr("counter").await?;

    store.sadd("connections", "john").await?;
    store.sadd("connections", "mary").await?;
    let mut connections = store.smembers("connections").await?;
    connections.sort();

    Ok(SmokeReport {
        value,
        counter,
        connections,
    })
}
