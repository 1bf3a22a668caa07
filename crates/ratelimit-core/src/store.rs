//! The shared KV store client contract and its Redis-backed
//! implementation.
//!
//! Modeled on the pooled-connection-manager pattern the teacher uses for
//! Postgres in `storage::simple::SimpleRelationalStore`, and on the
//! Redis-backed token bucket in the `snok-self-limiters` reference
//! implementation — but without that implementation's Lua script, since
//! this store's contract calls for a plain load-then-pipelined-write
//! cycle rather than a compare-and-set.

use crate::error::{LimiterError, Result};
use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// The raw hash fields as read from the store: field types on the wire
/// are plain strings.
pub type RawBucketFields = HashMap<String, String>;

/// Primitive operations the bucket store needs from the shared KV store.
/// Kept small and trait-based so tests can supply a fake rather than a
/// live store.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// True iff the last known connection state is ready and no fatal
    /// error has been observed since.
    async fn available(&self) -> bool;

    /// Hash multi-get. Returns `None` if the key is absent.
    async fn hash_get_all(&self, key: &str) -> Result<Option<RawBucketFields>>;

    /// Atomic pipeline: write the given hash fields and refresh the
    /// key's TTL in one round trip.
    async fn write_bucket_fields(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl_seconds: u64,
    ) -> Result<()>;
}

/// Configuration for the Redis-backed [`SharedStore`].
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    pub url: String,
    pub pool_size: u32,
    pub connect_timeout: Duration,
    pub op_timeout: Duration,
    /// Bounded reconnect attempt count: after exhaustion, `available()`
    /// latches to false until a successful ping.
    pub max_reconnect_attempts: u32,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1/".to_string(),
            pool_size: 16,
            connect_timeout: Duration::from_secs(30),
            op_timeout: Duration::from_secs(5),
            max_reconnect_attempts: 3,
        }
    }
}

/// Process-wide client to the shared KV store. Shared by every request
/// and every background worker; never torn down or re-opened by a
/// caller.
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
    available: Arc<AtomicBool>,
    max_reconnect_attempts: u32,
    op_timeout: Duration,
}

impl RedisStore {
    pub async fn connect(config: RedisStoreConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|e| LimiterError::StoreUnavailable(e.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connect_timeout)
            .build(manager)
            .await
            .map_err(|e| LimiterError::StoreUnavailable(e.to_string()))?;

        Ok(Self {
            pool,
            available: Arc::new(AtomicBool::new(true)),
            max_reconnect_attempts: config.max_reconnect_attempts,
            op_timeout: config.op_timeout,
        })
    }

    /// Attempt to re-establish readiness with a bounded number of
    /// pings, latching `available` to false on exhaustion.
    async fn reconnect(&self) {
        for attempt in 0..self.max_reconnect_attempts {
            if let Ok(mut conn) = self.pool.get().await {
                let pong: redis::RedisResult<String> = redis::cmd("PING")
                    .query_async(&mut *conn)
                    .await;
                if pong.is_ok() {
                    self.available.store(true, Ordering::SeqCst);
                    return;
                }
            }
            warn!(attempt, "shared store reconnect attempt failed");
        }
        self.available.store(false, Ordering::SeqCst);
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = redis::RedisResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                self.available.store(false, Ordering::SeqCst);
                Err(LimiterError::StoreTransient(e.to_string()))
            }
            Err(_) => {
                self.available.store(false, Ordering::SeqCst);
                Err(LimiterError::StoreTransient("operation timed out".into()))
            }
        }
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn available(&self) -> bool {
        if self.available.load(Ordering::SeqCst) {
            return true;
        }
        self.reconnect().await;
        self.available.load(Ordering::SeqCst)
    }

    async fn hash_get_all(&self, key: &str) -> Result<Option<RawBucketFields>> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| LimiterError::StoreUnavailable(e.to_string()))?;

        let fields: RawBucketFields = self
            .with_timeout(conn.hgetall(key))
            .await?;

        if fields.is_empty() {
            Ok(None)
        } else {
            Ok(Some(fields))
        }
    }

    async fn write_bucket_fields(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl_seconds: u64,
    ) -> Result<()> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| LimiterError::StoreUnavailable(e.to_string()))?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (field, value) in fields {
            pipe.hset(key, *field, value);
        }
        pipe.expire(key, ttl_seconds as i64);

        self.with_timeout(pipe.query_async::<()>(&mut *conn)).await
    }
}

/// An in-memory fake of [`SharedStore`], public so both this crate's
/// unit tests and downstream integration tests can exercise the bucket
/// store and admission middleware without a live Redis.
pub mod testing {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct FakeStore {
        pub data: Mutex<HashMap<String, RawBucketFields>>,
        pub available: AtomicBool,
        /// When set, the next `hash_get_all`/`write_bucket_fields` call
        /// fails with `StoreTransient` instead of touching `data`.
        pub fail_next_op: AtomicBool,
    }

    impl FakeStore {
        pub fn new() -> Self {
            Self {
                data: Mutex::new(HashMap::new()),
                available: AtomicBool::new(true),
                fail_next_op: AtomicBool::new(false),
            }
        }

        pub fn unavailable() -> Self {
            let store = Self::new();
            store.available.store(false, Ordering::SeqCst);
            store
        }
    }

    #[async_trait]
    impl SharedStore for FakeStore {
        async fn available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }

        async fn hash_get_all(&self, key: &str) -> Result<Option<RawBucketFields>> {
            if self.fail_next_op.swap(false, Ordering::SeqCst) {
                return Err(LimiterError::StoreTransient("fake failure".into()));
            }
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn write_bucket_fields(
            &self,
            key: &str,
            fields: &[(&str, String)],
            _ttl_seconds: u64,
        ) -> Result<()> {
            if self.fail_next_op.swap(false, Ordering::SeqCst) {
                return Err(LimiterError::StoreTransient("fake failure".into()));
            }
            let mut data = self.data.lock().await;
            let entry = data.entry(key.to_string()).or_default();
            for (field, value) in fields {
                entry.insert((*field).to_string(), value.clone());
            }
            Ok(())
        }
    }
}
