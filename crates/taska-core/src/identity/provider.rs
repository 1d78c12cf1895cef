//! Identity provider trait.

use taska_types::identity::{IdentityError, UserId};

/// Resolves a bearer credential to a stable user identity.
///
/// `Ok(None)` means the credential was checked and rejected, which the
/// HTTP layer turns into 401. `Err` means the provider itself could not
/// be consulted and the request must not be treated as unauthenticated.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait IdentityProvider: Send + Sync {
    fn resolve(
        &self,
        credential: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserId>, IdentityError>> + Send;
}
