//! Explicit dataset memoization for a presentation session.
//!
//! Datasets are keyed by source identity: a file path, or the name of an
//! uploaded file. Path sources are loaded once and reused until
//! invalidated. A new upload always replaces the entry for its name,
//! unless the bytes are identical to what is already cached.
//!
//! Cached datasets are shared as `Arc<Dataset>` and never mutated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use demandcast_core::{loader, Dataset, PipelineError};
use tracing::{debug, info};

/// Identity of a dataset source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Path(PathBuf),
    Upload(String),
}

impl SourceKey {
    /// Key for a path, canonicalized when the file exists.
    pub fn path(path: &Path) -> Self {
        SourceKey::Path(std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
    }

    pub fn upload(name: impl Into<String>) -> Self {
        SourceKey::Upload(name.into())
    }
}

/// Per-session dataset cache. Owned by the caller; there is no global instance.
#[derive(Debug, Default)]
pub struct DatasetSession {
    datasets: HashMap<SourceKey, Arc<Dataset>>,
    parse_count: usize,
}

impl DatasetSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dataset from `path`, reusing a cached copy when present.
    pub fn load_path(&mut self, path: &Path) -> Result<Arc<Dataset>, PipelineError> {
        let key = SourceKey::path(path);
        if let Some(ds) = self.datasets.get(&key) {
            debug!(path = %path.display(), "dataset cache hit");
            return Ok(Arc::clone(ds));
        }

        let dataset = Arc::new(loader::load_path(path)?);
        self.parse_count += 1;
        info!(path = %path.display(), records = dataset.len(), "dataset loaded");
        self.datasets.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Register a new upload under `name`, replacing any previous upload of
    /// that name.
    ///
    /// On a parse failure the previous entry is dropped as well, so a stale
    /// dataset is never served for a rejected upload.
    pub fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<Arc<Dataset>, PipelineError> {
        let key = SourceKey::upload(name);
        let fingerprint = blake3::hash(bytes).to_hex().to_string();

        if let Some(ds) = self.datasets.get(&key) {
            if ds.fingerprint == fingerprint {
                debug!(name, "re-upload with identical bytes; keeping cached dataset");
                return Ok(Arc::clone(ds));
            }
        }

        self.datasets.remove(&key);
        let dataset = Arc::new(loader::load_bytes(bytes)?);
        self.parse_count += 1;
        info!(name, records = dataset.len(), "upload loaded");
        self.datasets.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn get(&self, key: &SourceKey) -> Option<Arc<Dataset>> {
        self.datasets.get(key).cloned()
    }

    /// Drop one cached dataset. Returns whether an entry was removed.
    pub fn invalidate(&mut self, key: &SourceKey) -> bool {
        self.datasets.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.datasets.clear();
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Number of times a source was actually parsed (cache misses).
    pub fn parse_count(&self) -> usize {
        self.parse_count
    }
}
