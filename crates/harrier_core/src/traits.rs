use crate::error::*;
use crate::manifest::DirEntry;

use bytes::Bytes;

/// A storage provider exposing read operations over a path namespace.
///
/// Implementations are constructed once at startup and cloned freely; any
/// credentials or connection state live behind the clone.
pub trait Backend: Send + Sync + 'static + Clone {
    /// List the immediate children of a directory.
    fn list(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<DirEntry>, BackendError>> + Send;

    /// Read the object at `path` in full.
    fn open(&self, path: &str) -> impl Future<Output = Result<Bytes, BackendError>> + Send;

    /// Optional: drop any directory metadata this backend keeps internally.
    fn flush_dir_cache(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// A backend that answers only for paths under a configured subtree.
pub trait OverrideBackend: Backend {
    fn serves(&self, path: &str) -> bool;
}

/// Placeholder for deployments without a content override.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOverride;

impl Backend for NoOverride {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, BackendError> {
        Err(BackendError::Unavailable(format!(
            "no override backend configured for {path}"
        )))
    }

    async fn open(&self, path: &str) -> Result<Bytes, BackendError> {
        Err(BackendError::Unavailable(format!(
            "no override backend configured for {path}"
        )))
    }
}

impl OverrideBackend for NoOverride {
    fn serves(&self, _path: &str) -> bool {
        false
    }
}
