//! Identity types for Taska.
//!
//! Taska does not manage accounts itself; the external identity provider
//! resolves a request credential to a stable user identifier, and every
//! storage key is namespaced by that identifier.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Maximum accepted length of a resolved user id.
pub const MAX_USER_ID_LEN: usize = 128;

/// Stable identifier of an authenticated user.
///
/// Comes from the identity provider (e.g., the OIDC `sub` claim). Like
/// [`crate::session::SessionId`], it becomes a storage-key path segment,
/// so parsing enforces key safety.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Construct without validation, for values Taska itself controls
    /// (tests, config fixtures). Provider-returned ids go through parse.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("user id must not be empty".to_string());
        }
        if s.len() > MAX_USER_ID_LEN {
            return Err(format!("user id exceeds {MAX_USER_ID_LEN} characters"));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | ':'))
        {
            return Err(format!("user id contains invalid characters: '{s}'"));
        }
        if s.bytes().all(|b| b == b'.') {
            return Err("user id must not consist solely of dots".to_string());
        }
        Ok(Self(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors from identity provider operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity provider unreachable: {0}")]
    ProviderUnreachable(String),

    #[error("identity provider returned a malformed response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_accepts_provider_subjects() {
        // Cognito-style UUID subs and email-ish local ids both pass.
        for ok in [
            "2f1c0b4e-8a41-7012-b3d5-0242ac120002",
            "student.tanaka@example.jp",
            "region:pool:abc123",
        ] {
            assert!(ok.parse::<UserId>().is_ok(), "should accept '{ok}'");
        }
    }

    #[test]
    fn test_user_id_rejects_key_unsafe_values() {
        assert!("".parse::<UserId>().is_err());
        assert!("..".parse::<UserId>().is_err());
        assert!("a/b".parse::<UserId>().is_err());
        assert!("a b".parse::<UserId>().is_err());
        assert!("x".repeat(MAX_USER_ID_LEN + 1).parse::<UserId>().is_err());
    }
}
