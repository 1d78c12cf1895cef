//! DifyBackend -- concrete [`ChatBackend`] implementation for Dify apps.
//!
//! Sends blocking requests to the Dify app API (`/v1/chat-messages`) and
//! registers attachments through its upload endpoint (`/v1/files/upload`).
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use taska_core::chat::backend::ChatBackend;
use taska_types::backend::{ChatBackendError, ChatReply, ChatRequest, ReplyFile, UpstreamFileRef};
use taska_types::identity::UserId;
use taska_types::session::{AttachmentKind, UpstreamConversationId};

use super::types::{
    DifyChatRequest, DifyChatResponse, DifyErrorResponse, DifyFileInput, DifyUploadResponse,
    file_type_for, kind_for_file_type,
};

/// Dify chat backend client.
///
/// Implements [`ChatBackend`] against a single Dify app endpoint; the
/// app key comes from the environment at startup.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers. It never appears in Debug output,
/// Display output, or tracing logs.
pub struct DifyBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl DifyBackend {
    /// Dify apps answer synchronously in this mode; Taska does not stream.
    const RESPONSE_MODE: &'static str = "blocking";

    /// Create a new Dify client against the hosted API.
    pub fn new(api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min timeout for long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://api.dify.ai".to_string(),
        }
    }

    /// Override the base URL (self-hosted Dify, tests, proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`ChatRequest`] into a [`DifyChatRequest`].
    fn to_dify_request(request: &ChatRequest) -> DifyChatRequest {
        let files = request
            .files
            .iter()
            .map(|f| DifyFileInput {
                file_type: file_type_for(f.kind).to_string(),
                transfer_method: "local_file".to_string(),
                upload_file_id: f.file_id.clone(),
            })
            .collect();

        DifyChatRequest {
            inputs: serde_json::Map::new(),
            query: request.query.clone(),
            response_mode: Self::RESPONSE_MODE.to_string(),
            user: request.user_id.to_string(),
            conversation_id: request
                .conversation_id
                .as_ref()
                .map(|c| c.as_str().to_string()),
            files,
        }
    }

    /// Map a non-2xx response to a [`ChatBackendError`], preferring the
    /// message out of Dify's JSON error body over the raw text.
    async fn response_error(response: reqwest::Response) -> ChatBackendError {
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<DifyErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(body);

        match status.as_u16() {
            401 => ChatBackendError::AuthenticationFailed,
            404 => ChatBackendError::ConversationNotFound(message),
            429 => ChatBackendError::RateLimited { retry_after_ms },
            code => ChatBackendError::Backend {
                status: code,
                message,
            },
        }
    }
}

// DifyBackend intentionally does NOT derive Debug to prevent accidental
// exposure of internal state.

impl ChatBackend for DifyBackend {
    async fn upload_file(
        &self,
        user_id: &UserId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UpstreamFileRef, ChatBackendError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("user", user_id.to_string());

        let response = self
            .client
            .post(self.url("/v1/files/upload"))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatBackendError::Transport(format!("file upload failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }

        let uploaded: DifyUploadResponse = response.json().await.map_err(|e| {
            ChatBackendError::Deserialization(format!("failed to parse upload response: {e}"))
        })?;

        Ok(UpstreamFileRef {
            file_id: uploaded.id,
            name: uploaded.name,
            kind: AttachmentKind::from_filename(filename),
        })
    }

    async fn send_message(&self, request: ChatRequest) -> Result<ChatReply, ChatBackendError> {
        let body = Self::to_dify_request(&request);

        let response = self
            .client
            .post(self.url("/v1/chat-messages"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatBackendError::Transport(format!("chat request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }

        let dify: DifyChatResponse = response.json().await.map_err(|e| {
            ChatBackendError::Deserialization(format!("failed to parse chat response: {e}"))
        })?;

        Ok(ChatReply {
            answer: dify.answer,
            conversation_id: UpstreamConversationId::new(dify.conversation_id),
            files: dify
                .message_files
                .into_iter()
                .map(|f| ReplyFile {
                    name: None,
                    url: f.url,
                    kind: kind_for_file_type(&f.file_type),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_backend() -> DifyBackend {
        DifyBackend::new(SecretString::from("test-key-not-real"))
    }

    fn make_request() -> ChatRequest {
        ChatRequest {
            user_id: UserId::new("user-1"),
            query: "こんにちは".to_string(),
            conversation_id: Some(UpstreamConversationId::new("conv-7")),
            files: vec![UpstreamFileRef {
                file_id: "file-1".to_string(),
                name: "photo.png".to_string(),
                kind: AttachmentKind::Image,
            }],
        }
    }

    #[test]
    fn test_to_dify_request() {
        let req = DifyBackend::to_dify_request(&make_request());
        assert_eq!(req.response_mode, "blocking");
        assert_eq!(req.user, "user-1");
        assert_eq!(req.conversation_id.as_deref(), Some("conv-7"));
        assert_eq!(req.files.len(), 1);
        assert_eq!(req.files[0].file_type, "image");
        assert_eq!(req.files[0].transfer_method, "local_file");
        assert_eq!(req.files[0].upload_file_id, "file-1");
        assert!(req.inputs.is_empty());
    }

    #[test]
    fn test_to_dify_request_first_turn_has_no_conversation_id() {
        let mut request = make_request();
        request.conversation_id = None;
        let req = DifyBackend::to_dify_request(&request);
        assert!(req.conversation_id.is_none());
    }

    #[test]
    fn test_base_url_override() {
        let backend = make_backend().with_base_url("http://localhost:5001/".to_string());
        assert_eq!(
            backend.url("/v1/chat-messages"),
            "http://localhost:5001/v1/chat-messages"
        );
    }

    #[test]
    fn test_default_base_url() {
        let backend = make_backend();
        assert_eq!(
            backend.url("/v1/files/upload"),
            "https://api.dify.ai/v1/files/upload"
        );
    }
}
