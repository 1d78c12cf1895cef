//! Chat history endpoints.
//!
//! - GET /api/v1/history               - the caller's session index
//! - GET /api/v1/history/{session_id}  - one full session transcript

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use taska_types::session::{ChatCategory, SessionId, SessionIndexEntry, SessionRecord};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for history listing.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryListQuery {
    /// Filter by chat category ("qa" | "resume").
    #[serde(rename = "type")]
    pub category: Option<String>,
}

/// GET /api/v1/history - List the caller's sessions, most recent first.
pub async fn list_history(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<HistoryListQuery>,
) -> Result<Json<ApiResponse<Vec<SessionIndexEntry>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let index = state.turn_service.index_store();
    let entries = match query.category.as_deref() {
        None => index.list(&user_id).await?,
        Some(raw) => {
            let category: ChatCategory = raw.parse().map_err(AppError::Validation)?;
            index.filter_by_category(&user_id, category).await?
        }
    };

    let elapsed = start.elapsed().as_millis() as u64;
    let resp =
        ApiResponse::success(entries, request_id, elapsed).with_link("self", "/api/v1/history");
    Ok(Json(resp))
}

/// GET /api/v1/history/{session_id} - Get one full session transcript.
///
/// A genuinely absent record comes back as an empty transcript, the same
/// shape a brand-new session has. Storage failures are errors, not
/// empties.
pub async fn get_history_detail(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionRecord>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session_id: SessionId = session_id.parse().map_err(AppError::Validation)?;
    let record = state
        .turn_service
        .record_store()
        .load(&user_id, &session_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let self_link = format!("/api/v1/history/{session_id}");
    let resp = ApiResponse::success(record, request_id, elapsed).with_link("self", &self_link);
    Ok(Json(resp))
}
