//! # Harrier FileSystem Mirror
//!
//! A local-mirror backend for Harrier.
//!
//! This crate implements the [`Backend`] trait over a directory on disk that
//! mirrors the most recently published assets. The mirror is the cheapest
//! backend, so the resolver always consults it first.
//!
//! ## Usage
//!
//! ```no_run
//! use harrier_fs::LocalStore;
//!
//! let store = LocalStore::new("./AK_AB_DATA");
//! ```

use harrier_core::prelude::*;

use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;

#[derive(Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Backend for LocalStore {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, BackendError> {
        let dir = self.full_path(path);
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::NotFound(path.to_string()));
            }
            Err(e) => return Err(BackendError::Io(e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(BackendError::Io)? {
            let file_type = entry.file_type().await.map_err(BackendError::Io)?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: file_type.is_dir(),
            });
        }

        Ok(entries)
    }

    async fn open(&self, path: &str) -> Result<Bytes, BackendError> {
        let full = self.full_path(path);
        match fs::read(&full).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BackendError::NotFound(path.to_string()))
            }
            Err(e) => Err(BackendError::Io(e)),
        }
    }
}
