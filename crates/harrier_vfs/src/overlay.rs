//! The asset resolution facade.

use harrier_cache::CacheClient;
use harrier_core::prelude::*;

use bytes::Bytes;
use rand::Rng;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Probability, in percent, of asking the remote backend to drop its
/// directory metadata after serving an object.
///
/// Bounds the growth of the remote's internal listing state at the cost of
/// occasional extra latency on the next listing.
#[derive(Clone, Copy, Debug)]
pub struct PurgePolicy {
    pub percent: u8,
}

impl Default for PurgePolicy {
    fn default() -> Self {
        Self { percent: 5 }
    }
}

impl PurgePolicy {
    pub const DISABLED: Self = Self { percent: 0 };

    pub const ALWAYS: Self = Self { percent: 100 };

    fn roll(&self) -> bool {
        self.percent > 0 && rand::rng().random_range(0..100u8) < self.percent
    }
}

/// One read surface over the local mirror, the remote bulk store and an
/// optional gamedata override.
///
/// Merged listings, raw objects and parsed JSON documents are memoized in
/// the tiered cache; the facade itself holds no request state and every
/// method takes `&self`.
#[derive(Clone)]
pub struct AssetFs<L, R, G = NoOverride>
where
    L: Backend,
    R: Backend,
    G: OverrideBackend,
{
    pub(crate) local: L,
    pub(crate) remote: R,
    pub(crate) gamedata: Option<G>,
    pub(crate) cache: CacheClient,
    pub(crate) purge: PurgePolicy,
}

impl<L: Backend, R: Backend> AssetFs<L, R> {
    pub fn new(local: L, remote: R, cache: CacheClient) -> Self {
        Self {
            local,
            remote,
            gamedata: None,
            cache,
            purge: PurgePolicy::default(),
        }
    }
}

impl<L: Backend, R: Backend, G: OverrideBackend> AssetFs<L, R, G> {
    /// Route requests under the override's subtree through `gamedata`.
    pub fn with_override<H: OverrideBackend>(self, gamedata: H) -> AssetFs<L, R, H> {
        AssetFs {
            local: self.local,
            remote: self.remote,
            gamedata: Some(gamedata),
            cache: self.cache,
            purge: self.purge,
        }
    }

    pub fn with_purge_policy(mut self, purge: PurgePolicy) -> Self {
        self.purge = purge;
        self
    }

    pub fn cache(&self) -> &CacheClient {
        &self.cache
    }

    /// Merged, deduplicated directory listing.
    pub async fn list(&self, path: &str) -> Result<Vec<DirEntry>, ResolveError> {
        let key = format!("list:{path}");
        if let Some(raw) = self.cache.get_bytes(&key).await
            && let Ok(entries) = serde_json::from_slice::<Vec<DirEntry>>(&raw)
        {
            return Ok(entries);
        }

        let entries = self.list_merged(path).await?;

        match serde_json::to_vec(&entries) {
            Ok(raw) => self.cache.set_bytes(&key, raw.into()),
            Err(e) => warn!(%path, error = %e, "failed to encode listing for cache"),
        }
        Ok(entries)
    }

    /// Current-version object resolution, memoized in the tiered cache.
    pub async fn open(&self, path: &str) -> Result<Bytes, ResolveError> {
        let key = format!("open:{path}");
        if let Some(bytes) = self.cache.get_bytes(&key).await {
            return Ok(bytes);
        }

        let bytes = self.open_fresh(path).await?;
        self.cache.set_bytes(&key, bytes.clone());
        Ok(bytes)
    }

    /// Resolve and parse a JSON object, memoizing the parsed document.
    pub async fn open_json(&self, path: &str) -> Result<Arc<Value>, ResolveError> {
        let key = format!("json:{path}");
        if let Some(doc) = self.cache.get_json(&key).await {
            return Ok(doc);
        }

        let raw = self.open_fresh(path).await?;
        let doc: Value = serde_json::from_slice(&raw).map_err(|source| ResolveError::Json {
            path: path.to_string(),
            source,
        })?;
        let doc = Arc::new(doc);
        self.cache.set_json(&key, raw, doc.clone());
        Ok(doc)
    }

    /// Resolve an object through the backend chain, bypassing the byte
    /// cache.
    ///
    /// The version probe depends on this entry point: a cached manifest read
    /// could never observe a version bump.
    pub async fn open_fresh(&self, path: &str) -> Result<Bytes, BackendError> {
        match self.local.open(path).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) => trace!(%path, %err, "local mirror miss"),
        }

        if let Some(gamedata) = &self.gamedata
            && gamedata.serves(path)
        {
            match gamedata.open(path).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) => debug!(%path, %err, "gamedata override miss"),
            }
        }

        let bytes = self.remote.open(path).await?;

        if self.purge.roll() {
            debug!("purging remote directory metadata");
            self.remote.flush_dir_cache().await;
        }

        Ok(bytes)
    }

    async fn list_merged(&self, path: &str) -> Result<Vec<DirEntry>, BackendError> {
        let (local, remote) = tokio::join!(self.local.list(path), self.remote.list(path));

        let (local, remote) = match (local, remote) {
            // the remote is the long-term store, so its error is the one
            // that matters when neither side can answer
            (Err(local_err), Err(remote_err)) => {
                debug!(%path, %local_err, "local listing failed alongside remote");
                return Err(remote_err);
            }
            (local, remote) => (local.unwrap_or_default(), remote.unwrap_or_default()),
        };

        // dedup by basename, directories and objects independently; the
        // local mirror is iterated first, so its classification wins
        let mut directories = HashSet::new();
        let mut objects = HashSet::new();
        let mut entries = Vec::new();
        for entry in local.into_iter().chain(remote) {
            let seen = if entry.is_dir {
                &mut directories
            } else {
                &mut objects
            };
            if seen.insert(entry.name.clone()) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_policy_bounds() {
        assert!(!PurgePolicy::DISABLED.roll());
        assert!(PurgePolicy::ALWAYS.roll());
    }
}
