//! Blob store trait.
//!
//! Defines the interface to the object store: whole-blob reads and
//! writes of named byte blobs, with optional per-key preconditions for
//! optimistic concurrency. Implementations live in taska-infra.

use serde::Serialize;
use serde::de::DeserializeOwned;

use taska_types::error::BlobStoreError;

/// Opaque version token for a stored blob.
///
/// Implementations derive it from content (SHA-256 hex); callers only
/// ever compare tokens and hand them back via [`WritePrecondition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobVersion(String);

impl BlobVersion {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A stored blob together with the version token it was read at.
#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub version: BlobVersion,
}

/// Condition a write must satisfy, checked atomically by the store.
///
/// `IfVersion` is the compare-and-swap half of the read-modify-write
/// cycles in the session stores: a stale token fails the put with
/// [`BlobStoreError::PreconditionFailed`] instead of silently discarding
/// the concurrent writer's update.
#[derive(Debug, Clone)]
pub enum WritePrecondition {
    /// Unconditional overwrite.
    None,
    /// Succeed only if no blob exists at the key.
    IfAbsent,
    /// Succeed only if the current blob still has this version.
    IfVersion(BlobVersion),
}

/// Trait for durable per-key blob storage.
///
/// `get` on a missing key yields `Ok(None)`, never an error, so callers
/// can distinguish "new document" from "store failure". `put` fully
/// overwrites the blob at the key; there is no partial update. Writes are
/// atomic per key with no cross-key transactions.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait BlobStore: Send + Sync {
    /// Read the blob at `key`. `None` means the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Blob>, BlobStoreError>> + Send;

    /// Overwrite the blob at `key`, subject to `precondition`.
    /// Returns the version token of the written content.
    fn put(
        &self,
        key: &str,
        bytes: &[u8],
        precondition: WritePrecondition,
    ) -> impl std::future::Future<Output = Result<BlobVersion, BlobStoreError>> + Send;

    /// Read and decode a JSON document, carrying its version for a later
    /// conditional write. A body that fails to decode into `T` is
    /// [`BlobStoreError::Corrupt`], never an empty default.
    fn get_json<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<(T, BlobVersion)>, BlobStoreError>> + Send
    {
        async move {
            match self.get(key).await? {
                Some(blob) => {
                    let value =
                        serde_json::from_slice(&blob.bytes).map_err(|e| BlobStoreError::Corrupt {
                            key: key.to_string(),
                            reason: e.to_string(),
                        })?;
                    Ok(Some((value, blob.version)))
                }
                None => Ok(None),
            }
        }
    }

    /// Encode `value` as JSON and write it, subject to `precondition`.
    fn put_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        precondition: WritePrecondition,
    ) -> impl std::future::Future<Output = Result<BlobVersion, BlobStoreError>> + Send {
        let encoded = serde_json::to_vec(value);
        async move {
            let bytes = encoded
                .map_err(|e| BlobStoreError::Backend(format!("failed to encode '{key}': {e}")))?;
            self.put(key, &bytes, precondition).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestBlobStore;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        n: u32,
    }

    #[tokio::test]
    async fn test_get_json_absent_is_none() {
        let store = TestBlobStore::new();
        let loaded = store.get_json::<Doc>("missing.json").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_put_json_then_get_json() {
        let store = TestBlobStore::new();
        store
            .put_json("doc.json", &Doc { n: 7 }, WritePrecondition::None)
            .await
            .unwrap();
        let (doc, _version) = store.get_json::<Doc>("doc.json").await.unwrap().unwrap();
        assert_eq!(doc, Doc { n: 7 });
    }

    #[tokio::test]
    async fn test_get_json_malformed_body_is_corrupt() {
        let store = TestBlobStore::new();
        store
            .put("doc.json", b"not json", WritePrecondition::None)
            .await
            .unwrap();
        let err = store.get_json::<Doc>("doc.json").await.unwrap_err();
        assert!(matches!(err, BlobStoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_if_version_precondition_detects_stale_write() {
        let store = TestBlobStore::new();
        let v1 = store
            .put_json("doc.json", &Doc { n: 1 }, WritePrecondition::None)
            .await
            .unwrap();

        // Another writer sneaks in.
        store
            .put_json("doc.json", &Doc { n: 2 }, WritePrecondition::None)
            .await
            .unwrap();

        let err = store
            .put_json("doc.json", &Doc { n: 3 }, WritePrecondition::IfVersion(v1))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobStoreError::PreconditionFailed { .. }));

        // The sneaked-in write survived.
        let (doc, _) = store.get_json::<Doc>("doc.json").await.unwrap().unwrap();
        assert_eq!(doc, Doc { n: 2 });
    }

    #[tokio::test]
    async fn test_if_absent_precondition() {
        let store = TestBlobStore::new();
        store
            .put("doc.json", b"{}", WritePrecondition::IfAbsent)
            .await
            .unwrap();
        let err = store
            .put("doc.json", b"{}", WritePrecondition::IfAbsent)
            .await
            .unwrap_err();
        assert!(matches!(err, BlobStoreError::PreconditionFailed { .. }));
    }
}
