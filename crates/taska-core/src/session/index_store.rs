//! Session index persistence.
//!
//! One JSON document per user listing every conversation, newest first.
//! The list is read whole and written whole; the move-to-front upsert is
//! the single mutation and runs under a version precondition, same as
//! the record store.

use tracing::warn;

use taska_types::error::BlobStoreError;
use taska_types::identity::UserId;
use taska_types::session::{ChatCategory, SessionIndexEntry};

use crate::session::CAS_ATTEMPTS;
use crate::storage::blob_store::{BlobStore, WritePrecondition};
use crate::storage::keys;

/// Persists the per-user history index through the blob store.
#[derive(Clone)]
pub struct SessionIndexStore<S: BlobStore> {
    blobs: S,
}

impl<S: BlobStore> SessionIndexStore<S> {
    pub fn new(blobs: S) -> Self {
        Self { blobs }
    }

    /// All index entries for a user, newest first. An absent index is an
    /// empty list; a present-but-undecodable one is an error.
    pub async fn list(&self, user_id: &UserId) -> Result<Vec<SessionIndexEntry>, BlobStoreError> {
        let key = keys::session_index(user_id);
        match self.blobs.get_json::<Vec<SessionIndexEntry>>(&key).await? {
            Some((entries, _version)) => Ok(entries),
            None => Ok(Vec::new()),
        }
    }

    /// [`list`](Self::list) narrowed to one category. Pure filter; the
    /// two history views share a single underlying document.
    pub async fn filter_by_category(
        &self,
        user_id: &UserId,
        category: ChatCategory,
    ) -> Result<Vec<SessionIndexEntry>, BlobStoreError> {
        let mut entries = self.list(user_id).await?;
        entries.retain(|e| e.category == category);
        Ok(entries)
    }

    /// Move a session to the front of the index, inserting it if new.
    ///
    /// For an existing session the stored title and category win over the
    /// caller's (both are fixed at creation); the caller's date and
    /// conversation id are taken as the fresher values. Retries on a
    /// concurrent index write.
    pub async fn upsert_move_to_front(
        &self,
        user_id: &UserId,
        entry: SessionIndexEntry,
    ) -> Result<(), BlobStoreError> {
        let key = keys::session_index(user_id);
        for attempt in 1..=CAS_ATTEMPTS {
            let (mut entries, precondition) =
                match self.blobs.get_json::<Vec<SessionIndexEntry>>(&key).await? {
                    Some((entries, version)) => (entries, WritePrecondition::IfVersion(version)),
                    None => (Vec::new(), WritePrecondition::IfAbsent),
                };

            let mut fresh = entry.clone();
            if let Some(position) = entries.iter().position(|e| e.id == entry.id) {
                let existing = entries.remove(position);
                fresh.title = existing.title;
                fresh.category = existing.category;
            }
            entries.insert(0, fresh);

            match self.blobs.put_json(&key, &entries, precondition).await {
                Ok(_version) => return Ok(()),
                Err(BlobStoreError::PreconditionFailed { .. }) if attempt < CAS_ATTEMPTS => {
                    warn!(%key, attempt, "session index changed mid-write, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("upsert_move_to_front returns from within the retry loop");
    }
}
