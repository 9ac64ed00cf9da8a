//! Version-fallback ("smart") resolution.

use crate::overlay::AssetFs;
use crate::paths::{self, STAGING_PREFIX};

use harrier_core::prelude::*;

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, warn};

/// Only the first entries of a version listing are considered; asset
/// directories accumulate hundreds of historical versions.
const FALLBACK_SCAN_LIMIT: usize = 25;

/// Upper bound on fallback probes per request.
const FALLBACK_PROBE_LIMIT: usize = 5;

impl<L: Backend, R: Backend, G: OverrideBackend> AssetFs<L, R, G> {
    /// Version-fallback object resolution.
    ///
    /// Tries the currently published version first, then the gamedata
    /// override, then a sampled subset of historical version directories on
    /// the remote store, newest-looking first. Each stage is attempted at
    /// most once per request.
    pub async fn open_smart(
        &self,
        server: &str,
        platform: &str,
        logical_path: &str,
    ) -> Result<Bytes, ResolveError> {
        let logical = paths::normalize(logical_path);

        let manifest = self
            .open_json(&paths::version_manifest_path(server, platform))
            .await
            .map_err(|err| ResolveError::Manifest(err.to_string()))?;
        let Some(res_version) = manifest.get("resVersion").and_then(Value::as_str) else {
            return Err(ResolveError::Manifest(format!(
                "manifest for {server}/{platform} has no resVersion"
            )));
        };

        let current = paths::asset_path(server, platform, res_version, &logical);
        match self.open(&current).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) => debug!(path = %current, %err, "current version miss"),
        }

        if let Some(gamedata) = &self.gamedata
            && gamedata.serves(&logical)
        {
            match gamedata.open(&logical).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) => debug!(path = %logical, %err, "gamedata override miss"),
            }
        }

        for folder in self.asset_folders(server, platform, res_version).await? {
            let candidate = paths::asset_path(server, platform, &folder, &logical);
            match self.remote.open(&candidate).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) => debug!(path = %candidate, %err, "fallback version miss"),
            }
        }

        Err(ResolveError::NotFound(logical))
    }

    /// Historical version directories eligible for fallback: everything
    /// under `assets/` except the current version and staging folders,
    /// sampled down to at most [`FALLBACK_PROBE_LIMIT`] evenly spaced names
    /// and sorted newest-looking first.
    ///
    /// The sampled list is cached per (server, platform, resVersion); it is
    /// expensive to recompute and stays valid until the next version-change
    /// flush.
    pub(crate) async fn asset_folders(
        &self,
        server: &str,
        platform: &str,
        res_version: &str,
    ) -> Result<Vec<String>, ResolveError> {
        let key = format!("folders:{server}:{platform}:{res_version}");
        if let Some(raw) = self.cache.get_bytes(&key).await
            && let Ok(folders) = serde_json::from_slice::<Vec<String>>(&raw)
        {
            return Ok(folders);
        }

        let entries = self.list(&paths::asset_root(server, platform)).await?;

        let mut folders: Vec<String> = entries
            .iter()
            .filter(|entry| {
                entry.is_dir
                    && entry.name != res_version
                    && !entry.name.starts_with(STAGING_PREFIX)
            })
            .map(|entry| entry.name.clone())
            .collect();

        folders.sort_unstable_by(|a, b| b.cmp(a));
        folders.truncate(FALLBACK_SCAN_LIMIT);

        let step = folders.len().div_ceil(FALLBACK_PROBE_LIMIT).max(1);
        let folders: Vec<String> = folders.into_iter().step_by(step).collect();

        match serde_json::to_vec(&folders) {
            Ok(raw) => self.cache.set_bytes(&key, raw.into()),
            Err(e) => warn!(error = %e, "failed to encode fallback folders for cache"),
        }
        Ok(folders)
    }
}
