//! Local filesystem blob store implementation.
//!
//! Implements the `BlobStore` trait from `taska-core` with one file per
//! key under a root directory; the hierarchical key becomes the relative
//! path, so `users/alice/chat/index.json` lands at exactly that path.
//!
//! Version tokens are SHA-256 digests of the content. Preconditions are
//! checked under a per-key async mutex, and writes go through a temp
//! file plus rename so readers never observe a half-written blob. The
//! lock table only holds entries for in-flight writes; a key's entry is
//! removed once its last writer finishes.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use taska_core::storage::blob_store::{Blob, BlobStore, BlobVersion, WritePrecondition};
use taska_types::error::BlobStoreError;

/// Local filesystem-backed blob store.
///
/// Directory layout mirrors the key layout:
/// ```text
/// {root}/users/{user_id}/chat/sessions/{session_id}.json
/// {root}/users/{user_id}/chat/index.json
/// {root}/users/{user_id}/uploads/{session_id}/{timestamp}_{filename}
/// ```
///
/// Cloning is cheap and clones share the per-key lock table, so every
/// handle in the process serializes writes to the same key.
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl LocalBlobStore {
    /// Create a blob store rooted at `root`. The directory is created
    /// lazily on first write.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Map a key to its on-disk path, rejecting anything that could
    /// escape the root. Keys are validated segment by segment; the
    /// higher layers only build keys from parsed ids, so a rejection
    /// here means a caller bypassed them.
    fn path_for(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        if key.is_empty() {
            return Err(BlobStoreError::InvalidKey("empty key".to_string()));
        }
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(BlobStoreError::InvalidKey(format!(
                    "key contains unsafe segment: '{key}'"
                )));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn content_version(bytes: &[u8]) -> BlobVersion {
        BlobVersion::new(format!("{:x}", Sha256::digest(bytes)))
    }

    async fn read_current(path: &Path) -> Result<Option<Vec<u8>>, BlobStoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobStoreError::Backend(format!(
                "failed to read '{}': {e}",
                path.display()
            ))),
        }
    }

    /// Precondition check plus write. Callers must hold the key's lock.
    async fn write_with_precondition(
        key: &str,
        path: &Path,
        bytes: &[u8],
        precondition: &WritePrecondition,
    ) -> Result<BlobVersion, BlobStoreError> {
        let current = Self::read_current(path).await?.map(|b| Self::content_version(&b));
        match (precondition, &current) {
            (WritePrecondition::None, _) => {}
            (WritePrecondition::IfAbsent, None) => {}
            (WritePrecondition::IfVersion(expected), Some(version)) if expected == version => {}
            _ => {
                return Err(BlobStoreError::PreconditionFailed {
                    key: key.to_string(),
                });
            }
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                BlobStoreError::Backend(format!("failed to create '{}': {e}", parent.display()))
            })?;
        }

        // Write-then-rename keeps concurrent readers off partial content.
        let mut tmp_name: OsString = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        tokio::fs::write(&tmp_path, bytes).await.map_err(|e| {
            BlobStoreError::Backend(format!("failed to write '{}': {e}", tmp_path.display()))
        })?;
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
            BlobStoreError::Backend(format!("failed to rename into '{}': {e}", path.display()))
        })?;

        Ok(Self::content_version(bytes))
    }
}

impl BlobStore for LocalBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Blob>, BlobStoreError> {
        let path = self.path_for(key)?;
        Ok(Self::read_current(&path).await?.map(|bytes| {
            let version = Self::content_version(&bytes);
            Blob { bytes, version }
        }))
    }

    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        precondition: WritePrecondition,
    ) -> Result<BlobVersion, BlobStoreError> {
        let path = self.path_for(key)?;
        let written = {
            let lock = self.lock_for(key);
            let _guard = lock.lock().await;
            Self::write_with_precondition(key, &path, bytes, &precondition).await
        };
        // Evict the key's lock entry once the last writer is done. Every
        // holder and waiter keeps a clone of the Arc, and `lock_for`
        // clones under the same shard lock `remove_if` takes, so a
        // strong count of 1 proves nobody can reach this entry anymore.
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        written
    }
}
