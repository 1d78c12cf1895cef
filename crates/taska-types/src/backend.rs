//! Chat backend request/response types for Taska.
//!
//! These types model the seam to the external LLM orchestration service:
//! file uploads, blocking chat requests, and the reply shape the
//! orchestrator consumes. The concrete HTTP client lives in taska-infra.

use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::session::{AttachmentKind, UpstreamConversationId};

/// Reference to a file the backend has accepted via its upload endpoint.
///
/// `file_id` is the backend's identifier; `kind` decides how the file is
/// declared in the subsequent chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamFileRef {
    pub file_id: String,
    pub name: String,
    pub kind: AttachmentKind,
}

/// A blocking chat request to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Stable end-user identity forwarded to the backend.
    pub user_id: UserId,
    /// Free-text query for this turn.
    pub query: String,
    /// Present when continuing an upstream conversation; absent on the
    /// first turn of a new one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<UpstreamConversationId>,
    /// Files already uploaded to the backend for this turn.
    #[serde(default)]
    pub files: Vec<UpstreamFileRef>,
}

/// A file the backend produced alongside its reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
    pub kind: AttachmentKind,
}

/// The backend's reply to a blocking chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    /// The (possibly newly issued) upstream conversation id.
    pub conversation_id: UpstreamConversationId,
    #[serde(default)]
    pub files: Vec<ReplyFile>,
}

/// Errors from chat backend operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatBackendError {
    #[error("backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("authentication with the chat backend failed")]
    AuthenticationFailed,

    #[error("upstream conversation not found: '{0}'")]
    ConversationNotFound(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("transport error: {0}")]
    Transport(String),
}
