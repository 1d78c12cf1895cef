//! Session credential authentication extractor.
//!
//! Extracts the caller's credential from:
//! - `Authorization: Bearer <credential>` header
//! - `X-Session-Token: <credential>` header
//!
//! The credential is resolved through the configured identity provider.
//! Rejection happens before any handler logic, so an unauthenticated
//! request can never touch storage or the chat backend. A provider
//! outage is surfaced as 503, never as "invalid credential".

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use taska_types::identity::UserId;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated caller. Extracting this resolves the request credential
/// to the stable user id that namespaces every storage key.
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = extract_credential(parts)?;

        match state.identity.resolve(&credential).await? {
            Some(user_id) => Ok(AuthenticatedUser(user_id)),
            None => Err(AppError::Unauthorized(
                "Invalid or expired session credential".to_string(),
            )),
        }
    }
}

/// Extract the session credential from request headers.
fn extract_credential(parts: &Parts) -> Result<String, AppError> {
    // Try Authorization: Bearer <credential>
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(credential) = auth_str.strip_prefix("Bearer ") {
            return Ok(credential.trim().to_string());
        }
    }

    // Try X-Session-Token header
    if let Some(token) = parts.headers.get("x-session-token") {
        let token_str = token.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-Session-Token header encoding".to_string())
        })?;
        return Ok(token_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing session credential. Provide via 'Authorization: Bearer <token>' or 'X-Session-Token: <token>' header.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/api/v1/history");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_credential_is_extracted() {
        let parts = parts_with_headers(&[("authorization", "Bearer tok-abc ")]);
        assert_eq!(extract_credential(&parts).unwrap(), "tok-abc");
    }

    #[test]
    fn test_session_token_header_is_the_fallback() {
        let parts = parts_with_headers(&[("x-session-token", "tok-xyz")]);
        assert_eq!(extract_credential(&parts).unwrap(), "tok-xyz");
    }

    #[test]
    fn test_bearer_wins_over_session_token_header() {
        let parts = parts_with_headers(&[
            ("authorization", "Bearer from-bearer"),
            ("x-session-token", "from-header"),
        ]);
        assert_eq!(extract_credential(&parts).unwrap(), "from-bearer");
    }

    #[test]
    fn test_missing_credential_is_unauthorized() {
        let parts = parts_with_headers(&[]);
        let err = extract_credential(&parts).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_non_bearer_authorization_alone_is_rejected() {
        let parts = parts_with_headers(&[("authorization", "Basic dXNlcjpwdw==")]);
        let err = extract_credential(&parts).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
