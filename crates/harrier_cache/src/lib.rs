//! Two-tier cache for asset resolution.
//!
//! A fast process-local tier (LRU with per-entry TTL) sits in front of a
//! shared Redis tier. Reads fall through process → shared and backfill the
//! process tier on a shared hit; writes populate the process tier
//! synchronously and the shared tier on a detached task, so the request path
//! never blocks on Redis latency.
//!
//! The shared tier is an optimization, not a correctness dependency: every
//! shared-tier failure is logged and degraded to a cache miss or a dropped
//! write. A client built without a Redis DSN behaves identically with the
//! shared tier permanently absent.

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use redis::AsyncCommands;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

/// Lifetime of a process-tier entry. Short, since the process tier cannot be
/// invalidated from other processes.
pub const DEFAULT_PROCESS_TTL: Duration = Duration::from_secs(2 * 60);

/// Default shared-tier TTL for asset bytes and listings.
pub const DEFAULT_SHARED_TTL: Duration = Duration::from_secs(60 * 60);

const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("invalid redis url: {0}")]
    InvalidUrl(#[from] redis::RedisError),
}

#[derive(Clone, Copy, Debug)]
pub struct CacheOptions {
    /// Process-tier entry count bound; the LRU evicts past it.
    pub capacity: NonZeroUsize,
    pub process_ttl: Duration,
    pub shared_ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            process_ttl: DEFAULT_PROCESS_TTL,
            shared_ttl: DEFAULT_SHARED_TTL,
        }
    }
}

#[derive(Clone)]
enum CacheValue {
    Bytes(Bytes),
    Json(Arc<Value>),
}

struct ProcessEntry {
    value: CacheValue,
    expires_at: Instant,
}

struct Tiers {
    process: Mutex<LruCache<String, ProcessEntry>>,
    redis: Option<redis::Client>,
    options: CacheOptions,
}

/// Handle to both cache tiers. Cheap to clone; all clones share the tiers.
#[derive(Clone)]
pub struct CacheClient {
    inner: Arc<Tiers>,
}

impl CacheClient {
    /// Connect both tiers. Fails only on an unparseable DSN; the Redis
    /// connection itself is established lazily per operation.
    pub fn new(redis_url: &str) -> Result<Self, CacheError> {
        Self::with_options(Some(redis_url), CacheOptions::default())
    }

    /// Process tier only; shared-tier operations become no-ops.
    pub fn in_process() -> Self {
        Self::build(None, CacheOptions::default())
    }

    pub fn with_options(
        redis_url: Option<&str>,
        options: CacheOptions,
    ) -> Result<Self, CacheError> {
        let redis = redis_url.map(redis::Client::open).transpose()?;
        Ok(Self::build(redis, options))
    }

    fn build(redis: Option<redis::Client>, options: CacheOptions) -> Self {
        Self {
            inner: Arc::new(Tiers {
                process: Mutex::new(LruCache::new(options.capacity)),
                redis,
                options,
            }),
        }
    }

    /// Raw bytes for `key`, if any tier holds them.
    pub async fn get_bytes(&self, key: &str) -> Option<Bytes> {
        if let Some(CacheValue::Bytes(bytes)) = self.process_get(key) {
            return Some(bytes);
        }

        let raw = self.shared_get(key).await?;
        let bytes = Bytes::from(raw);
        self.process_put(key, CacheValue::Bytes(bytes.clone()));
        Some(bytes)
    }

    pub fn set_bytes(&self, key: &str, value: Bytes) {
        self.set_bytes_with_ttl(key, value, self.inner.options.shared_ttl);
    }

    /// Like [`CacheClient::set_bytes`] with a caller-chosen shared-tier TTL.
    /// Used for the version manifest, which must expire on a horizon of
    /// minutes rather than the hour-scale default.
    pub fn set_bytes_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) {
        self.process_put(key, CacheValue::Bytes(value.clone()));
        self.shared_set_detached(key, value, ttl);
    }

    /// Parsed JSON document for `key`. A shared-tier hit re-parses the raw
    /// bytes and backfills the process tier with the document.
    pub async fn get_json(&self, key: &str) -> Option<Arc<Value>> {
        if let Some(CacheValue::Json(doc)) = self.process_get(key) {
            return Some(doc);
        }

        let raw = self.shared_get(key).await?;
        let doc: Value = match serde_json::from_slice(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(%key, error = %e, "shared cache held unparseable json");
                return None;
            }
        };
        let doc = Arc::new(doc);
        self.process_put(key, CacheValue::Json(doc.clone()));
        Some(doc)
    }

    /// Memoize a parsed document. The process tier keeps the document, the
    /// shared tier the raw bytes it was parsed from.
    pub fn set_json(&self, key: &str, raw: Bytes, doc: Arc<Value>) {
        self.process_put(key, CacheValue::Json(doc));
        self.shared_set_detached(key, raw, self.inner.options.shared_ttl);
    }

    /// Clear both tiers. The process tier is cleared atomically under its
    /// lock; a shared-tier failure is logged and ignored.
    pub async fn flush(&self) {
        self.inner.process.lock().clear();

        let Some(client) = &self.inner.redis else {
            return;
        };
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let flushed: Result<(), _> = redis::cmd("FLUSHDB").query_async(&mut conn).await;
                if let Err(e) = flushed {
                    warn!(error = %e, "shared cache flush failed");
                }
            }
            Err(e) => warn!(error = %e, "shared cache flush failed"),
        }
    }

    fn process_get(&self, key: &str) -> Option<CacheValue> {
        let mut process = self.inner.process.lock();
        let expired = match process.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            process.pop(key);
        }
        None
    }

    fn process_put(&self, key: &str, value: CacheValue) {
        let entry = ProcessEntry {
            value,
            expires_at: Instant::now() + self.inner.options.process_ttl,
        };
        self.inner.process.lock().put(key.to_string(), entry);
    }

    async fn shared_get(&self, key: &str) -> Option<Vec<u8>> {
        let client = self.inner.redis.as_ref()?;
        let mut conn = match client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(%key, error = %e, "shared cache read failed");
                return None;
            }
        };
        let value: Result<Option<Vec<u8>>, _> = conn.get(key).await;
        match value {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "shared cache read failed");
                None
            }
        }
    }

    fn shared_set_detached(&self, key: &str, value: Bytes, ttl: Duration) {
        let Some(client) = self.inner.redis.clone() else {
            return;
        };
        let key = key.to_string();
        let seconds = ttl.as_secs().max(1);

        tokio::spawn(async move {
            let mut conn = match client.get_multiplexed_async_connection().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(%key, error = %e, "shared cache write failed");
                    return;
                }
            };
            let written: Result<(), _> = conn.set_ex(&key, value.as_ref(), seconds).await;
            if let Err(e) = written {
                warn!(%key, length = value.len(), error = %e, "shared cache write failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_only(options: CacheOptions) -> CacheClient {
        CacheClient::with_options(None, options).unwrap()
    }

    #[tokio::test]
    async fn bytes_round_trip() {
        let cache = CacheClient::in_process();
        cache.set_bytes("open:a", Bytes::from_static(b"abc"));

        assert_eq!(
            cache.get_bytes("open:a").await.unwrap().as_ref(),
            b"abc"
        );
        assert!(cache.get_bytes("open:b").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_read_as_misses() {
        let cache = process_only(CacheOptions {
            process_ttl: Duration::ZERO,
            ..CacheOptions::default()
        });
        cache.set_bytes("open:a", Bytes::from_static(b"abc"));

        assert!(cache.get_bytes("open:a").await.is_none());
    }

    #[tokio::test]
    async fn lru_evicts_under_size_pressure() {
        let cache = process_only(CacheOptions {
            capacity: NonZeroUsize::new(2).unwrap(),
            ..CacheOptions::default()
        });
        cache.set_bytes("k1", Bytes::from_static(b"1"));
        cache.set_bytes("k2", Bytes::from_static(b"2"));
        cache.set_bytes("k3", Bytes::from_static(b"3"));

        assert!(cache.get_bytes("k1").await.is_none());
        assert!(cache.get_bytes("k2").await.is_some());
        assert!(cache.get_bytes("k3").await.is_some());
    }

    #[tokio::test]
    async fn json_hits_return_the_same_document() {
        let cache = CacheClient::in_process();
        let raw = Bytes::from_static(br#"{"resVersion":"v1"}"#);
        let doc: Arc<Value> = Arc::new(serde_json::from_slice(&raw).unwrap());
        cache.set_json("json:manifest", raw, doc.clone());

        let hit = cache.get_json("json:manifest").await.unwrap();
        assert!(Arc::ptr_eq(&doc, &hit));
    }

    #[tokio::test]
    async fn byte_and_json_entries_do_not_alias() {
        let cache = CacheClient::in_process();
        let raw = Bytes::from_static(br#"{"a":1}"#);
        let doc: Arc<Value> = Arc::new(serde_json::from_slice(&raw).unwrap());
        cache.set_json("k", raw, doc);

        // a JSON entry is not readable as raw bytes
        assert!(cache.get_bytes("k").await.is_none());
    }

    #[tokio::test]
    async fn flush_clears_the_process_tier() {
        let cache = CacheClient::in_process();
        cache.set_bytes("open:a", Bytes::from_static(b"abc"));
        cache.flush().await;

        assert!(cache.get_bytes("open:a").await.is_none());
    }
}
