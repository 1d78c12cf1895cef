//! Chat turn orchestration.
//!
//! `TurnService` drives one full turn end to end: resolve the session
//! id, persist and register attachments, call the chat backend, then
//! append to the session record and refresh the history index. Failures
//! abort the turn; nothing written before the failure is rolled back,
//! which can leave attachment blobs without a referencing transcript.

use chrono::Utc;
use tracing::{info, warn};

use taska_types::backend::{ChatRequest, ReplyFile};
use taska_types::error::TurnError;
use taska_types::identity::UserId;
use taska_types::session::{
    Attachment, AttachmentKind, ChatCategory, Message, SessionId, SessionIndexEntry,
    UpstreamConversationId,
};

use crate::chat::backend::ChatBackend;
use crate::session::index_store::SessionIndexStore;
use crate::session::record_store::SessionRecordStore;
use crate::session::title;
use crate::storage::blob_store::{BlobStore, WritePrecondition};
use crate::storage::keys;

/// One file submitted with a turn, still in memory.
#[derive(Debug, Clone)]
pub struct TurnUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Everything the caller provides for one turn.
///
/// `session_id` is the raw client token: absent, blank, or the literal
/// string "null" all mean "start a new session". Anything else must
/// parse as a [`SessionId`].
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub category: ChatCategory,
    pub session_id: Option<String>,
    pub query: String,
    pub uploads: Vec<TurnUpload>,
    pub upstream_conversation_id: Option<UpstreamConversationId>,
}

/// Result of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub upstream_conversation_id: UpstreamConversationId,
    pub reply_text: String,
    pub reply_files: Vec<ReplyFile>,
}

/// Orchestrates chat turns over the chat backend and the session stores.
///
/// Generic over `ChatBackend` and `BlobStore` to maintain clean
/// architecture (taska-core never depends on taska-infra).
#[derive(Clone)]
pub struct TurnService<B: ChatBackend, S: BlobStore + Clone> {
    backend: B,
    blobs: S,
    records: SessionRecordStore<S>,
    index: SessionIndexStore<S>,
}

impl<B: ChatBackend, S: BlobStore + Clone> TurnService<B, S> {
    /// Create a turn service; the session stores share the blob store.
    pub fn new(backend: B, blobs: S) -> Self {
        Self {
            backend,
            records: SessionRecordStore::new(blobs.clone()),
            index: SessionIndexStore::new(blobs.clone()),
            blobs,
        }
    }

    /// Access the session record store (history detail reads).
    pub fn record_store(&self) -> &SessionRecordStore<S> {
        &self.records
    }

    /// Access the session index store (history list reads).
    pub fn index_store(&self) -> &SessionIndexStore<S> {
        &self.index
    }

    /// Run one chat turn for a user.
    ///
    /// Sequence: persist each upload to the blob store and register it
    /// with the backend, send the chat request, append the exchange to
    /// the session record, then move the session to the front of the
    /// index. Any failure aborts the remainder; attachment blobs already
    /// written stay behind and are logged rather than deleted.
    pub async fn submit_turn(
        &self,
        user_id: &UserId,
        request: TurnRequest,
    ) -> Result<TurnOutcome, TurnError> {
        let session_id = resolve_session_id(request.session_id.as_deref())?;

        let mut persisted_keys = Vec::new();
        let result = self
            .run_turn(user_id, &session_id, &request, &mut persisted_keys)
            .await;

        if let Err(err) = &result {
            if !persisted_keys.is_empty() {
                warn!(
                    %session_id,
                    orphaned = persisted_keys.len(),
                    keys = ?persisted_keys,
                    error = %err,
                    "turn failed after persisting attachments, blobs left in place"
                );
            }
        }
        result
    }

    async fn run_turn(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        request: &TurnRequest,
        persisted_keys: &mut Vec<String>,
    ) -> Result<TurnOutcome, TurnError> {
        // Uploads are handled one at a time: blob write first so the
        // transcript's attachment URL always points at stored bytes by
        // the time the record is written.
        let mut attachments = Vec::with_capacity(request.uploads.len());
        let mut file_refs = Vec::with_capacity(request.uploads.len());
        for upload in &request.uploads {
            let key = keys::upload(
                user_id,
                session_id,
                Utc::now().timestamp_millis(),
                &upload.filename,
            );
            self.blobs
                .put(&key, &upload.bytes, WritePrecondition::None)
                .await?;
            persisted_keys.push(key.clone());

            let file_ref = self
                .backend
                .upload_file(user_id, &upload.filename, &upload.bytes)
                .await?;
            attachments.push(Attachment {
                name: upload.filename.clone(),
                kind: AttachmentKind::from_filename(&upload.filename),
                url: key,
            });
            file_refs.push(file_ref);
        }

        let reply = self
            .backend
            .send_message(ChatRequest {
                user_id: user_id.clone(),
                query: request.query.clone(),
                conversation_id: request.upstream_conversation_id.clone(),
                files: file_refs,
            })
            .await?;

        let user_message = Message::user(request.query.clone(), attachments);
        let assistant_message = Message::assistant(
            reply.answer.clone(),
            reply.files.iter().map(attachment_from_reply_file).collect(),
        );

        self.records
            .append_turn(
                user_id,
                session_id,
                user_message,
                assistant_message,
                Some(reply.conversation_id.clone()),
            )
            .await?;

        self.index
            .upsert_move_to_front(
                user_id,
                SessionIndexEntry {
                    id: session_id.clone(),
                    title: title::derive_title(&request.query, request.category),
                    date: Utc::now(),
                    upstream_conversation_id: Some(reply.conversation_id.clone()),
                    category: request.category,
                },
            )
            .await?;

        info!(
            %session_id,
            category = %request.category,
            uploads = request.uploads.len(),
            "chat turn persisted"
        );

        Ok(TurnOutcome {
            session_id: session_id.clone(),
            upstream_conversation_id: reply.conversation_id,
            reply_text: reply.answer,
            reply_files: reply.files,
        })
    }
}

/// Session id resolution for incoming turns: absent, blank, and the
/// literal "null" (what a browser form serializes for a missing value)
/// all mint a fresh id.
fn resolve_session_id(raw: Option<&str>) -> Result<SessionId, TurnError> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(SessionId::mint()),
        Some(token) => token.parse().map_err(TurnError::InvalidSessionId),
    }
}

fn attachment_from_reply_file(file: &ReplyFile) -> Attachment {
    let name = match &file.name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => {
            let tail = file.url.rsplit('/').next().unwrap_or_default();
            if tail.is_empty() {
                "file".to_string()
            } else {
                tail.to_string()
            }
        }
    };
    Attachment {
        name,
        kind: file.kind,
        url: file.url.clone(),
    }
}
