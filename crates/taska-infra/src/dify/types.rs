//! Dify API types.
//!
//! These are Dify-specific request/response structures used for HTTP
//! communication with the Dify app API. They are NOT the generic chat
//! backend types from taska-types -- those are backend-agnostic.

use serde::{Deserialize, Serialize};

use taska_types::session::AttachmentKind;

/// Request body for `POST /v1/chat-messages`.
#[derive(Debug, Clone, Serialize)]
pub struct DifyChatRequest {
    /// App input variables. The Taska apps define none, but the field is
    /// required and must serialize as `{}`.
    pub inputs: serde_json::Map<String, serde_json::Value>,
    pub query: String,
    pub response_mode: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub files: Vec<DifyFileInput>,
}

/// One already-uploaded file attached to a chat request.
#[derive(Debug, Clone, Serialize)]
pub struct DifyFileInput {
    #[serde(rename = "type")]
    pub file_type: String,
    pub transfer_method: String,
    pub upload_file_id: String,
}

/// Response body from `POST /v1/chat-messages` in blocking mode.
#[derive(Debug, Clone, Deserialize)]
pub struct DifyChatResponse {
    pub answer: String,
    pub conversation_id: String,
    #[serde(default)]
    pub message_files: Vec<DifyMessageFile>,
}

/// A file the app produced alongside its answer.
#[derive(Debug, Clone, Deserialize)]
pub struct DifyMessageFile {
    #[serde(rename = "type")]
    pub file_type: String,
    pub url: String,
}

/// Response body from `POST /v1/files/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct DifyUploadResponse {
    pub id: String,
    pub name: String,
}

/// Error body Dify attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct DifyErrorResponse {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// The `type` string Dify expects for an attachment of this kind.
pub fn file_type_for(kind: AttachmentKind) -> &'static str {
    match kind {
        AttachmentKind::Image => "image",
        AttachmentKind::File => "document",
    }
}

/// Inverse of [`file_type_for`] for files Dify returns; unknown types
/// are treated as plain files.
pub fn kind_for_file_type(file_type: &str) -> AttachmentKind {
    if file_type == "image" {
        AttachmentKind::Image
    } else {
        AttachmentKind::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serialization() {
        let req = DifyChatRequest {
            inputs: serde_json::Map::new(),
            query: "履歴書を直してください".to_string(),
            response_mode: "blocking".to_string(),
            user: "user-1".to_string(),
            conversation_id: None,
            files: vec![DifyFileInput {
                file_type: "document".to_string(),
                transfer_method: "local_file".to_string(),
                upload_file_id: "file-123".to_string(),
            }],
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["inputs"], serde_json::json!({}));
        assert_eq!(json["response_mode"], "blocking");
        assert!(json.get("conversation_id").is_none());
        assert_eq!(json["files"][0]["type"], "document");
        assert_eq!(json["files"][0]["transfer_method"], "local_file");
        assert_eq!(json["files"][0]["upload_file_id"], "file-123");
    }

    #[test]
    fn test_chat_request_includes_conversation_id_when_present() {
        let req = DifyChatRequest {
            inputs: serde_json::Map::new(),
            query: "続きです".to_string(),
            response_mode: "blocking".to_string(),
            user: "user-1".to_string(),
            conversation_id: Some("conv-9".to_string()),
            files: Vec::new(),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["conversation_id"], "conv-9");
    }

    #[test]
    fn test_chat_response_deserialization() {
        let json = r#"{
            "event": "message",
            "message_id": "m-1",
            "conversation_id": "conv-1",
            "mode": "chat",
            "answer": "こんにちは",
            "created_at": 1700000000
        }"#;
        let resp: DifyChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.answer, "こんにちは");
        assert_eq!(resp.conversation_id, "conv-1");
        assert!(resp.message_files.is_empty());
    }

    #[test]
    fn test_chat_response_with_message_files() {
        let json = r#"{
            "answer": "done",
            "conversation_id": "conv-1",
            "message_files": [
                {"id": "f-1", "type": "image", "url": "https://dify.example/files/f-1", "belongs_to": "assistant"}
            ]
        }"#;
        let resp: DifyChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.message_files.len(), 1);
        assert_eq!(resp.message_files[0].file_type, "image");
    }

    #[test]
    fn test_upload_response_deserialization() {
        let json = r#"{
            "id": "file-abc",
            "name": "resume.pdf",
            "size": 1024,
            "extension": "pdf",
            "mime_type": "application/pdf",
            "created_at": 1700000000
        }"#;
        let resp: DifyUploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id, "file-abc");
        assert_eq!(resp.name, "resume.pdf");
    }

    #[test]
    fn test_error_response_deserialization() {
        let json = r#"{"code": "invalid_param", "message": "conversation not found", "status": 404}"#;
        let err: DifyErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.code.as_deref(), Some("invalid_param"));
        assert_eq!(err.message.as_deref(), Some("conversation not found"));
    }

    #[test]
    fn test_file_type_mapping() {
        assert_eq!(file_type_for(AttachmentKind::Image), "image");
        assert_eq!(file_type_for(AttachmentKind::File), "document");
        assert_eq!(kind_for_file_type("image"), AttachmentKind::Image);
        assert_eq!(kind_for_file_type("document"), AttachmentKind::File);
        assert_eq!(kind_for_file_type("audio"), AttachmentKind::File);
    }
}
