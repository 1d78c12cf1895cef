//! Session, message, and index entry types for Taska.
//!
//! These types model the durable shape of a conversation: the per-session
//! transcript (`SessionRecord`), the per-user history index
//! (`SessionIndexEntry`), and the message/attachment shapes inside them.
//! All of them are stored as JSON blobs and validated on every load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Maximum accepted length of a client-supplied session id.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Taska's own durable conversation identifier.
///
/// Minted server-side as a UUIDv7 simple string, but clients may also
/// supply their own ids, so parsing enforces storage-key safety: ids
/// become path segments in blob keys and must never traverse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh, time-sortable session id.
    pub fn mint() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("session id must not be empty".to_string());
        }
        if s.len() > MAX_SESSION_ID_LEN {
            return Err(format!(
                "session id exceeds {MAX_SESSION_ID_LEN} characters"
            ));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(format!("session id contains invalid characters: '{s}'"));
        }
        // Ids become path segments; "." and ".." style segments must not pass.
        if s.bytes().all(|b| b == b'.') {
            return Err("session id must not consist solely of dots".to_string());
        }
        Ok(Self(s.to_string()))
    }
}

// Deserialize goes through FromStr so stored/loaded ids get the same
// validation as client-supplied ones.
impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The chat backend's own conversation correlation id.
///
/// Issued by the backend on the first successful turn; opaque to Taska.
/// Distinct from [`SessionId`]: the latter exists before the backend has
/// ever seen the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpstreamConversationId(String);

impl UpstreamConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpstreamConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UpstreamConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which assistant a conversation belongs to.
///
/// Fixed at session creation and never revised; drives the separate
/// "resume" and "qa" history views over the single per-user index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatCategory {
    Qa,
    Resume,
}

impl ChatCategory {
    /// Title used when the first user message is blank.
    pub fn default_title(&self) -> &'static str {
        match self {
            ChatCategory::Qa => "新しい質問",
            ChatCategory::Resume => "新しい履歴書の相談",
        }
    }
}

impl fmt::Display for ChatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatCategory::Qa => write!(f, "qa"),
            ChatCategory::Resume => write!(f, "resume"),
        }
    }
}

impl FromStr for ChatCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "qa" => Ok(ChatCategory::Qa),
            "resume" => Ok(ChatCategory::Resume),
            other => Err(format!("invalid chat category: '{other}'")),
        }
    }
}

/// Whether an attachment renders as an inline image or a plain file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

impl AttachmentKind {
    /// Classify by filename extension (images inline, everything else a file).
    pub fn from_filename(name: &str) -> Self {
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" => AttachmentKind::Image,
            _ => AttachmentKind::File,
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Image => write!(f, "image"),
            AttachmentKind::File => write!(f, "file"),
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(AttachmentKind::Image),
            "file" => Ok(AttachmentKind::File),
            other => Err(format!("invalid attachment kind: '{other}'")),
        }
    }
}

/// A file referenced by a message.
///
/// `url` is either a client-held data URI or a persisted object-store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub url: String,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message within a session transcript.
///
/// Messages form an append-only sequence, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            attachments,
        }
    }

    pub fn assistant(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            attachments,
        }
    }
}

/// The full per-session transcript document.
///
/// Owned by exactly one user (the owning user id lives in the storage key,
/// not in the document). Created on the first turn of a conversation and
/// grown by exactly two messages (user, assistant) per turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_conversation_id: Option<UpstreamConversationId>,
}

impl SessionRecord {
    /// An empty record: the shape of both "brand new session" and
    /// "record blob genuinely absent".
    pub fn empty(id: SessionId) -> Self {
        Self {
            id,
            messages: Vec::new(),
            upstream_conversation_id: None,
        }
    }
}

/// One conversation's summary line in the per-user history index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIndexEntry {
    pub id: SessionId,
    /// Fixed at creation; never revised by later turns.
    pub title: String,
    /// Last-active timestamp; refreshed on every turn.
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_conversation_id: Option<UpstreamConversationId>,
    pub category: ChatCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_mint_is_valid() {
        let id = SessionId::mint();
        let reparsed: SessionId = id.as_str().parse().unwrap();
        assert_eq!(id, reparsed);
        assert_eq!(id.as_str().len(), 32);
    }

    #[test]
    fn test_session_id_rejects_empty_and_traversal() {
        assert!("".parse::<SessionId>().is_err());
        assert!("..".parse::<SessionId>().is_err());
        assert!(".".parse::<SessionId>().is_err());
        assert!("a/b".parse::<SessionId>().is_err());
        assert!("a\\b".parse::<SessionId>().is_err());
        assert!("id with spaces".parse::<SessionId>().is_err());
        assert!("x".repeat(MAX_SESSION_ID_LEN + 1).parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_id_accepts_client_tokens() {
        for ok in ["abc123", "a-b_c.d", "X9", &"y".repeat(MAX_SESSION_ID_LEN)] {
            assert!(ok.parse::<SessionId>().is_ok(), "should accept '{ok}'");
        }
    }

    #[test]
    fn test_session_id_deserialize_validates() {
        let err = serde_json::from_str::<SessionId>("\"../../etc\"");
        assert!(err.is_err());
        let ok: SessionId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(ok.as_str(), "abc123");
    }

    #[test]
    fn test_chat_category_roundtrip() {
        for category in [ChatCategory::Qa, ChatCategory::Resume] {
            let s = category.to_string();
            let parsed: ChatCategory = s.parse().unwrap();
            assert_eq!(category, parsed);
        }
    }

    #[test]
    fn test_chat_category_serde() {
        let json = serde_json::to_string(&ChatCategory::Resume).unwrap();
        assert_eq!(json, "\"resume\"");
        let parsed: ChatCategory = serde_json::from_str("\"qa\"").unwrap();
        assert_eq!(parsed, ChatCategory::Qa);
    }

    #[test]
    fn test_attachment_kind_from_filename() {
        assert_eq!(AttachmentKind::from_filename("photo.PNG"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from_filename("scan.jpeg"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from_filename("resume.pdf"), AttachmentKind::File);
        assert_eq!(AttachmentKind::from_filename("no_extension"), AttachmentKind::File);
    }

    #[test]
    fn test_attachment_wire_field_is_type() {
        let attachment = Attachment {
            name: "resume.pdf".to_string(),
            kind: AttachmentKind::File,
            url: "users/u1/uploads/s1/1700000000000_resume.pdf".to_string(),
        };
        let json = serde_json::to_string(&attachment).unwrap();
        assert!(json.contains("\"type\":\"file\""));
    }

    #[test]
    fn test_session_record_empty_and_defaults() {
        let record = SessionRecord::empty(SessionId::mint());
        assert!(record.messages.is_empty());
        assert!(record.upstream_conversation_id.is_none());

        // Older blobs without optional fields still deserialize.
        let json = format!("{{\"id\":\"{}\"}}", record.id);
        let parsed: SessionRecord = serde_json::from_str(&json).unwrap();
        assert!(parsed.messages.is_empty());
        assert!(parsed.upstream_conversation_id.is_none());
    }

    #[test]
    fn test_index_entry_serde_roundtrip() {
        let entry = SessionIndexEntry {
            id: "abc123".parse().unwrap(),
            title: "履歴書を直してください".to_string(),
            date: Utc::now(),
            upstream_conversation_id: Some(UpstreamConversationId::new("up-1")),
            category: ChatCategory::Resume,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: SessionIndexEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, entry.id);
        assert_eq!(parsed.title, entry.title);
        assert_eq!(parsed.category, ChatCategory::Resume);
    }
}
