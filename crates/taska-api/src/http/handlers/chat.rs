//! Chat submission endpoint.
//!
//! POST /api/v1/chat/{category}
//!
//! Accepts multipart form data with fields `query` (required),
//! `conversation_id` (Taska's session id, optional),
//! `dify_conversation_id` (the backend's correlation id, optional) and
//! zero or more `file` parts. Runs one full turn through the turn
//! service and returns the reply plus both ids for the UI to echo back
//! on the next turn.

use std::time::Instant;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use taska_core::chat::turn::{TurnRequest, TurnUpload};
use taska_observe::genai_attrs;
use taska_types::backend::ReplyFile;
use taska_types::session::{AttachmentKind, ChatCategory, UpstreamConversationId};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Upper bound on the whole multipart body (file budget plus form slack).
pub(crate) const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Maximum query length in characters (not bytes).
const MAX_QUERY_CHARS: usize = 4000;

/// Maximum size of a single uploaded file.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Maximum number of `file` parts per turn.
const MAX_UPLOADS_PER_TURN: usize = 5;

/// Response body for a completed chat turn.
#[derive(Debug, Serialize)]
pub struct ChatTurnBody {
    pub answer: String,
    /// Taska's session id; the UI echoes it back to continue the session.
    pub conversation_id: String,
    /// The backend's correlation id; echoed back unchanged by the UI.
    pub dify_conversation_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<ChatTurnFile>,
}

/// A backend-produced file in the response.
#[derive(Debug, Serialize)]
pub struct ChatTurnFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
}

impl From<ReplyFile> for ChatTurnFile {
    fn from(file: ReplyFile) -> Self {
        Self {
            name: file.name,
            url: file.url,
            kind: file.kind,
        }
    }
}

/// POST /api/v1/chat/{category} - Submit one chat turn.
pub async fn submit_chat(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(category): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ChatTurnBody>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let category: ChatCategory = category.parse().map_err(AppError::Validation)?;

    let form = parse_turn_form(multipart).await?;
    let query = validate_query(form.query)?;
    let upstream_conversation_id = normalize_upstream_id(form.dify_conversation_id.as_deref());

    let request = TurnRequest {
        category,
        session_id: form.conversation_id,
        query,
        uploads: form.uploads,
        upstream_conversation_id,
    };

    let span = tracing::info_span!(
        "gen_ai.chat",
        gen_ai.operation.name = genai_attrs::OP_CHAT,
        gen_ai.provider.name = genai_attrs::PROVIDER_DIFY,
        gen_ai.conversation.id = tracing::field::Empty,
    );
    let outcome = state
        .turn_service
        .submit_turn(&user_id, request)
        .instrument(span.clone())
        .await?;
    span.record(
        genai_attrs::GEN_AI_CONVERSATION_ID,
        outcome.upstream_conversation_id.as_str(),
    );

    let elapsed = start.elapsed().as_millis() as u64;
    let history_link = format!("/api/v1/history/{}", outcome.session_id);

    let body = ChatTurnBody {
        answer: outcome.reply_text,
        conversation_id: outcome.session_id.to_string(),
        dify_conversation_id: outcome.upstream_conversation_id.to_string(),
        files: outcome
            .reply_files
            .into_iter()
            .map(ChatTurnFile::from)
            .collect(),
    };

    let resp = ApiResponse::success(body, request_id, elapsed).with_link("history", &history_link);
    Ok(Json(resp))
}

/// The raw multipart form for one turn, before validation.
#[derive(Debug, Default)]
struct TurnForm {
    query: Option<String>,
    conversation_id: Option<String>,
    dify_conversation_id: Option<String>,
    uploads: Vec<TurnUpload>,
}

/// Drain the multipart stream into a [`TurnForm`], enforcing per-file
/// and per-turn upload limits. Unknown fields are skipped so the UI can
/// add fields without breaking older servers.
async fn parse_turn_form(mut multipart: Multipart) -> Result<TurnForm, AppError> {
    let mut form = TurnForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "query" => {
                form.query = Some(read_text_field(field, "query").await?);
            }
            "conversation_id" => {
                form.conversation_id = Some(read_text_field(field, "conversation_id").await?);
            }
            "dify_conversation_id" => {
                form.dify_conversation_id =
                    Some(read_text_field(field, "dify_conversation_id").await?);
            }
            "file" => {
                if form.uploads.len() >= MAX_UPLOADS_PER_TURN {
                    return Err(AppError::Validation(format!(
                        "At most {MAX_UPLOADS_PER_TURN} files per message"
                    )));
                }
                let filename = field.file_name().unwrap_or("file").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file part: {e}"))
                })?;
                if bytes.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::Validation(format!(
                        "File '{filename}' exceeds the {} MiB limit",
                        MAX_UPLOAD_BYTES / (1024 * 1024)
                    )));
                }
                form.uploads.push(TurnUpload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))
}

fn validate_query(query: Option<String>) -> Result<String, AppError> {
    let query =
        query.ok_or_else(|| AppError::Validation("Missing required field 'query'".to_string()))?;
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::Validation(format!(
            "Field 'query' exceeds {MAX_QUERY_CHARS} characters"
        )));
    }
    Ok(query)
}

/// Blank and the literal "null" both mean "no upstream conversation yet".
fn normalize_upstream_id(raw: Option<&str>) -> Option<UpstreamConversationId> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && *v != "null")
        .map(UpstreamConversationId::new)
}
