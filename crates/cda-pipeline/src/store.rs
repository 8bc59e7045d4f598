//! Blob storage for stage artifacts.
//!
//! Stages exchange opaque byte blobs addressed by `(bucket, key)`:
//! raw exports, transaction lists, rate tables and aggregated rows.

use crate::error::PipelineError;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Get/put access to a bucketed object store.
pub trait BlobStore: Send + Sync {
    /// Read the object at `key`.
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Vec<u8>, PipelineError>> + Send;

    /// Write `data` to `key`, replacing any existing object.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;
}

/// Filesystem store: objects live at `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object path. Keys must be relative and stay inside the bucket.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, PipelineError> {
        for part in [bucket, key] {
            let path = Path::new(part);
            let escapes = path
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if part.is_empty() || escapes {
                return Err(PipelineError::store(bucket, key, "invalid object path"));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl BlobStore for LocalBlobStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, PipelineError> {
        let path = self.object_path(bucket, key)?;
        debug!("Reading {}", path.display());

        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::store(bucket, key, "not found")
            } else {
                PipelineError::store(bucket, key, e)
            }
        })
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), PipelineError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::store(bucket, key, e))?;
        }

        debug!("Writing {} bytes to {}", data.len(), path.display());
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| PipelineError::store(bucket, key, e))
    }
}

/// In-memory store. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys present in `bucket`, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl BlobStore for MemoryBlobStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, PipelineError> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| PipelineError::store(bucket, key, "not found"))
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), PipelineError> {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }
}
