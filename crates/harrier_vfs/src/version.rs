//! The version pointer: resolves the currently published version and drives
//! cache invalidation.

use crate::overlay::AssetFs;
use crate::paths;

use harrier_core::prelude::*;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared-tier TTL for the manifest probe. The manifest is the trigger for
/// all invalidation and must be re-checked on a horizon of minutes.
pub const MANIFEST_TTL: Duration = Duration::from_secs(5 * 60);

/// Resolves the current version manifest per (server, platform) and flushes
/// every cache tier when the upstream bytes change.
#[derive(Clone)]
pub struct VersionService<L, R, G = NoOverride>
where
    L: Backend,
    R: Backend,
    G: OverrideBackend,
{
    fs: Arc<AssetFs<L, R, G>>,
}

impl<L: Backend, R: Backend, G: OverrideBackend> VersionService<L, R, G> {
    pub fn new(fs: Arc<AssetFs<L, R, G>>) -> Self {
        Self { fs }
    }

    /// Fetch and parse the current manifest.
    ///
    /// The fetch bypasses the byte cache; the freshly read bytes are
    /// compared against the previously cached copy, and a difference flushes
    /// the whole cache — a new authoritative version directory supersedes
    /// every cached listing, object and "not found".
    pub async fn latest_version(
        &self,
        server: &str,
        platform: &str,
    ) -> Result<VersionManifest, ResolveError> {
        let path = paths::version_manifest_path(server, platform);
        let raw = self
            .fs
            .open_fresh(&path)
            .await
            .map_err(|err| ResolveError::Manifest(format!("{path}: {err}")))?;
        let manifest: VersionManifest = serde_json::from_slice(&raw)
            .map_err(|err| ResolveError::Manifest(format!("{path}: {err}")))?;

        let key = format!("manifest:{server}:{platform}");
        match self.fs.cache().get_bytes(&key).await {
            Some(previous) if previous == raw => {}
            Some(_) => {
                self.fs.cache().flush().await;
                info!(server, platform, res_version = %manifest.res_version, "version changed, cache flushed");
                self.fs.cache().set_bytes_with_ttl(&key, raw, MANIFEST_TTL);
            }
            None => self.fs.cache().set_bytes_with_ttl(&key, raw, MANIFEST_TTL),
        }

        Ok(manifest)
    }

    /// Resolve the `latest` sentinel; a pinned version passes through
    /// unchanged.
    pub async fn real_latest_version(
        &self,
        server: &str,
        platform: &str,
        res_version: &str,
    ) -> Result<String, ResolveError> {
        if res_version == paths::LATEST {
            let manifest = self.latest_version(server, platform).await?;
            return Ok(manifest.res_version);
        }
        Ok(res_version.to_string())
    }

    /// Physical directory for a version, with the `latest` sentinel
    /// resolved.
    pub async fn real_latest_version_path(
        &self,
        server: &str,
        platform: &str,
        res_version: &str,
    ) -> Result<String, ResolveError> {
        let res_version = self
            .real_latest_version(server, platform, res_version)
            .await?;
        Ok(format!(
            "{}/{}",
            paths::asset_root(server, platform),
            res_version
        ))
    }
}
