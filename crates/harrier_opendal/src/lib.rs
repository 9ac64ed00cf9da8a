use harrier_core::prelude::*;

use bytes::Bytes;
use dashmap::DashMap;
use opendal::{EntryMode, Operator};
use std::sync::Arc;

/// Remote bulk-store backend backed by an OpenDAL [`Operator`].
///
/// The Operator can be configured for any supported service e.g., s3, gcs,
/// azblob, etc. The store is the authoritative long-term home of historical
/// asset versions and may be slow or rate-limited, which is why the resolver
/// consults it last.
///
/// Listings are memoized per process. The memo grows with every distinct
/// directory listed, so the resolver's purge policy drops it periodically
/// through [`Backend::flush_dir_cache`].
#[derive(Clone)]
pub struct RemoteStore {
    op: Operator,
    dir_memo: Arc<DashMap<String, Vec<DirEntry>>>,
}

impl RemoteStore {
    /// Create a new store from an OpenDAL Operator.
    pub fn new(op: Operator) -> Self {
        Self {
            op,
            dir_memo: Arc::new(DashMap::new()),
        }
    }
}

impl Backend for RemoteStore {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, BackendError> {
        if let Some(entries) = self.dir_memo.get(path) {
            return Ok(entries.clone());
        }

        // opendal only lists directories when the path carries a trailing
        // separator
        let dir = if path.is_empty() || path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };

        let listing = match self.op.list(&dir).await {
            Ok(listing) => listing,
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => {
                return Err(BackendError::NotFound(path.to_string()));
            }
            Err(e) => return Err(BackendError::Unavailable(e.to_string())),
        };

        let mut entries = Vec::with_capacity(listing.len());
        for entry in listing {
            if entry.path() == dir {
                // the listed directory itself
                continue;
            }
            entries.push(DirEntry {
                name: entry.name().trim_end_matches('/').to_string(),
                is_dir: entry.metadata().mode() == EntryMode::DIR,
            });
        }

        self.dir_memo.insert(path.to_string(), entries.clone());
        Ok(entries)
    }

    async fn open(&self, path: &str) -> Result<Bytes, BackendError> {
        match self.op.read(path).await {
            Ok(buffer) => Ok(buffer.to_bytes()),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => {
                Err(BackendError::NotFound(path.to_string()))
            }
            Err(e) => Err(BackendError::Unavailable(e.to_string())),
        }
    }

    async fn flush_dir_cache(&self) {
        self.dir_memo.clear();
    }
}
