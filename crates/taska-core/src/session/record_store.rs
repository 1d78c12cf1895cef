//! Session record persistence.
//!
//! One JSON document per conversation holding the full ordered
//! transcript. Reads of an absent record yield an empty one, which is
//! the "new session" representation; appends are read-modify-write
//! cycles guarded by a version precondition so concurrent turns on the
//! same session cannot silently drop each other's messages.

use tracing::warn;

use taska_types::error::BlobStoreError;
use taska_types::identity::UserId;
use taska_types::session::{Message, SessionId, SessionRecord, UpstreamConversationId};

use crate::session::CAS_ATTEMPTS;
use crate::storage::blob_store::{BlobStore, WritePrecondition};
use crate::storage::keys;

/// Persists per-session transcript documents through the blob store.
///
/// Generic over `BlobStore` so taska-core never depends on taska-infra.
#[derive(Clone)]
pub struct SessionRecordStore<S: BlobStore> {
    blobs: S,
}

impl<S: BlobStore> SessionRecordStore<S> {
    pub fn new(blobs: S) -> Self {
        Self { blobs }
    }

    /// Load the record for a session.
    ///
    /// An absent record comes back as an empty one with zero messages;
    /// that covers both "brand new session" and "first turn not yet
    /// persisted". A record that exists but does not decode is an error,
    /// never an empty default.
    pub async fn load(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<SessionRecord, BlobStoreError> {
        let key = keys::session_record(user_id, session_id);
        match self.blobs.get_json::<SessionRecord>(&key).await? {
            Some((record, _version)) => Ok(record),
            None => Ok(SessionRecord::empty(session_id.clone())),
        }
    }

    /// Append one exchange (user message, then assistant message) to the
    /// session record, creating it if this is the first turn.
    ///
    /// A conversation id returned by the backend replaces the stored one;
    /// `None` leaves the existing value in place. Retries the write a
    /// bounded number of times when a concurrent turn moved the version
    /// underneath us.
    pub async fn append_turn(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        user_message: Message,
        assistant_message: Message,
        upstream_conversation_id: Option<UpstreamConversationId>,
    ) -> Result<SessionRecord, BlobStoreError> {
        let key = keys::session_record(user_id, session_id);
        for attempt in 1..=CAS_ATTEMPTS {
            let (mut record, precondition) =
                match self.blobs.get_json::<SessionRecord>(&key).await? {
                    Some((record, version)) => (record, WritePrecondition::IfVersion(version)),
                    None => (
                        SessionRecord::empty(session_id.clone()),
                        WritePrecondition::IfAbsent,
                    ),
                };

            record.messages.push(user_message.clone());
            record.messages.push(assistant_message.clone());
            if let Some(id) = &upstream_conversation_id {
                record.upstream_conversation_id = Some(id.clone());
            }

            match self.blobs.put_json(&key, &record, precondition).await {
                Ok(_version) => return Ok(record),
                Err(BlobStoreError::PreconditionFailed { .. }) if attempt < CAS_ATTEMPTS => {
                    warn!(%key, attempt, "session record changed mid-write, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("append_turn returns from within the retry loop");
    }
}
