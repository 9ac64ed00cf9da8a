//! In-memory backend for tests and wiring examples.
//!
//! Don't use this in production! The store keeps every object in a map,
//! derives directories from object paths and counts backend calls so tests
//! can assert how often the resolver actually reached a backend.

use harrier_core::prelude::*;

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Clone)]
pub struct MemStore {
    files: Arc<Mutex<BTreeMap<String, Bytes>>>,
    available: Arc<AtomicBool>,
    subtree: Option<String>,
    list_calls: Arc<AtomicUsize>,
    open_calls: Arc<AtomicUsize>,
    dir_flushes: Arc<AtomicUsize>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            files: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
            subtree: None,
            list_calls: Arc::default(),
            open_calls: Arc::default(),
            dir_flushes: Arc::default(),
        }
    }

    /// A store that also acts as an [`OverrideBackend`] for `subtree`.
    pub fn with_subtree(subtree: impl Into<String>) -> Self {
        Self {
            subtree: Some(subtree.into()),
            ..Self::new()
        }
    }

    pub fn insert(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.files.lock().insert(path.into(), data.into());
    }

    pub fn remove(&self, path: &str) {
        self.files.lock().remove(path);
    }

    /// Simulate an outage: every call fails with `Unavailable` while false.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::Relaxed)
    }

    pub fn dir_flushes(&self) -> usize {
        self.dir_flushes.load(Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("simulated outage".to_string()))
        }
    }
}

impl Backend for MemStore {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };

        let files = self.files.lock();
        let mut entries: Vec<DirEntry> = Vec::new();
        for key in files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let entry = match rest.split_once('/') {
                Some((dir, _)) => DirEntry {
                    name: dir.to_string(),
                    is_dir: true,
                },
                None => DirEntry {
                    name: rest.to_string(),
                    is_dir: false,
                },
            };
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }

        if entries.is_empty() {
            return Err(BackendError::NotFound(path.to_string()));
        }
        Ok(entries)
    }

    async fn open(&self, path: &str) -> Result<Bytes, BackendError> {
        self.open_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;

        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(path.to_string()))
    }

    async fn flush_dir_cache(&self) {
        self.dir_flushes.fetch_add(1, Ordering::Relaxed);
    }
}

impl OverrideBackend for MemStore {
    fn serves(&self, path: &str) -> bool {
        self.subtree
            .as_deref()
            .is_some_and(|subtree| path.contains(subtree))
    }
}
