//! Static token identity provider.
//!
//! Resolves credentials against a fixed table loaded from config. The
//! table holds SHA-256 digests, never plaintext tokens, so config files
//! stay safe to commit for development setups.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::warn;

use taska_core::identity::IdentityProvider;
use taska_types::config::StaticToken;
use taska_types::identity::{IdentityError, UserId};

/// Identity provider backed by a static digest table.
pub struct StaticTokenProvider {
    /// Lowercase hex SHA-256 digest of a token -> resolved user id.
    tokens: HashMap<String, UserId>,
}

impl StaticTokenProvider {
    /// Build the table from config entries. Entries whose user id would
    /// be unusable as a storage key prefix are skipped with a warning
    /// instead of poisoning startup.
    pub fn from_config(entries: &[StaticToken]) -> Self {
        let mut tokens = HashMap::with_capacity(entries.len());
        for entry in entries {
            match entry.user_id.parse::<UserId>() {
                Ok(user_id) => {
                    tokens.insert(entry.sha256.to_lowercase(), user_id);
                }
                Err(err) => {
                    warn!(
                        user_id = %entry.user_id,
                        "skipping static token with invalid user id: {err}"
                    );
                }
            }
        }
        Self { tokens }
    }

    /// Compute SHA-256 hash of a token (lowercase hex).
    fn hash_token(token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        format!("{:x}", digest)
    }
}

impl IdentityProvider for StaticTokenProvider {
    async fn resolve(&self, credential: &str) -> Result<Option<UserId>, IdentityError> {
        Ok(self.tokens.get(&Self::hash_token(credential)).cloned())
    }
}
