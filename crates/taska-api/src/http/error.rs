//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Turn and history failures deliberately reach the UI as one generic,
//! localized message per path; the machine-readable `code` and the server
//! logs carry the real cause. Upstream backend detail never crosses the
//! boundary.

use axum::response::{IntoResponse, Response};
use serde_json::json;

use taska_types::backend::ChatBackendError;
use taska_types::error::{BlobStoreError, TurnError};
use taska_types::identity::IdentityError;

use crate::http::response::status_for_code;

/// Shown to the user when a chat submission fails for any server-side reason.
pub(crate) const TURN_FAILURE_MESSAGE: &str =
    "チャットの送信に失敗しました。もう一度お試しください。";

/// Shown to the user when a history read fails.
pub(crate) const HISTORY_FAILURE_MESSAGE: &str =
    "履歴の取得に失敗しました。もう一度お試しください。";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// A chat turn failed (validation, backend, or storage).
    Turn(TurnError),
    /// A history read failed.
    Storage(BlobStoreError),
    /// The identity provider could not be consulted.
    Identity(IdentityError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        AppError::Turn(e)
    }
}

impl From<BlobStoreError> for AppError {
    fn from(e: BlobStoreError) -> Self {
        AppError::Storage(e)
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        AppError::Identity(e)
    }
}

impl AppError {
    /// The envelope error code and user-facing message for this error.
    pub(crate) fn code_and_message(&self) -> (&'static str, String) {
        match self {
            AppError::Turn(TurnError::InvalidSessionId(msg)) => ("VALIDATION_ERROR", msg.clone()),
            AppError::Turn(TurnError::Backend(ChatBackendError::RateLimited { .. })) => {
                ("RATE_LIMITED", TURN_FAILURE_MESSAGE.to_string())
            }
            AppError::Turn(TurnError::Backend(_)) => {
                ("BACKEND_ERROR", TURN_FAILURE_MESSAGE.to_string())
            }
            AppError::Turn(TurnError::Storage(_)) => {
                ("STORAGE_ERROR", TURN_FAILURE_MESSAGE.to_string())
            }
            AppError::Storage(_) => ("STORAGE_ERROR", HISTORY_FAILURE_MESSAGE.to_string()),
            AppError::Identity(_) => (
                "IDENTITY_UNAVAILABLE",
                "Identity provider is unavailable".to_string(),
            ),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = self.code_and_message();
        let status = status_for_code(code);

        // The user message is generic; keep the real cause in the logs.
        if status.is_server_error() {
            tracing::error!(code, error = ?self, "request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_invalid_session_id_is_a_validation_error() {
        let err = AppError::Turn(TurnError::InvalidSessionId(
            "session id contains invalid characters: '../x'".to_string(),
        ));
        let (code, message) = err.code_and_message();
        assert_eq!(code, "VALIDATION_ERROR");
        assert!(message.contains("invalid characters"));
    }

    #[test]
    fn test_backend_failures_collapse_to_generic_message() {
        for backend_err in [
            ChatBackendError::Backend {
                status: 500,
                message: "internal detail that must not leak".to_string(),
            },
            ChatBackendError::AuthenticationFailed,
            ChatBackendError::ConversationNotFound("up-1".to_string()),
            ChatBackendError::Transport("connection reset".to_string()),
        ] {
            let err = AppError::Turn(TurnError::Backend(backend_err));
            let (code, message) = err.code_and_message();
            assert_eq!(code, "BACKEND_ERROR");
            assert_eq!(message, TURN_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn test_rate_limit_gets_its_own_code() {
        let err = AppError::Turn(TurnError::Backend(ChatBackendError::RateLimited {
            retry_after_ms: Some(2000),
        }));
        let (code, _) = err.code_and_message();
        assert_eq!(code, "RATE_LIMITED");
    }

    #[test]
    fn test_storage_message_depends_on_path() {
        let turn_side = AppError::Turn(TurnError::Storage(BlobStoreError::Backend(
            "disk full".to_string(),
        )));
        assert_eq!(turn_side.code_and_message().1, TURN_FAILURE_MESSAGE);

        let history_side = AppError::Storage(BlobStoreError::Corrupt {
            key: "users/u1/chat/index.json".to_string(),
            reason: "expected value".to_string(),
        });
        let (code, message) = history_side.code_and_message();
        assert_eq!(code, "STORAGE_ERROR");
        assert_eq!(message, HISTORY_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_response_envelope_carries_code_and_status() {
        let err = AppError::Unauthorized("Missing session credential".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["code"], "UNAUTHORIZED");
        assert_eq!(json["errors"][0]["message"], "Missing session credential");
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn test_identity_outage_is_not_an_auth_rejection() {
        let err = AppError::Identity(IdentityError::ProviderUnreachable(
            "dns failure".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["code"], "IDENTITY_UNAVAILABLE");
    }
}
