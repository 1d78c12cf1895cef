//! Chat backend trait.
//!
//! The seam to the external LLM orchestration service. Two operations
//! cover the whole integration: registering a file so it can be attached
//! to a turn, and running one blocking chat turn. The HTTP client lives
//! in taska-infra.

use taska_types::backend::{ChatBackendError, ChatReply, ChatRequest, UpstreamFileRef};
use taska_types::identity::UserId;

/// Trait for the external chat service.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatBackend: Send + Sync {
    /// Upload raw file bytes to the backend, returning the reference to
    /// attach to a subsequent [`send_message`](Self::send_message) call.
    fn upload_file(
        &self,
        user_id: &UserId,
        filename: &str,
        bytes: &[u8],
    ) -> impl std::future::Future<Output = Result<UpstreamFileRef, ChatBackendError>> + Send;

    /// Run one blocking chat turn. Any non-success backend response is an
    /// error; there is no partial reply.
    fn send_message(
        &self,
        request: ChatRequest,
    ) -> impl std::future::Future<Output = Result<ChatReply, ChatBackendError>> + Send;
}
