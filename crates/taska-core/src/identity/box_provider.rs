//! BoxIdentityProvider -- object-safe dynamic dispatch wrapper for
//! IdentityProvider.
//!
//! 1. Define an object-safe `IdentityProviderDyn` trait with boxed futures
//! 2. Blanket-impl `IdentityProviderDyn` for all `T: IdentityProvider`
//! 3. `BoxIdentityProvider` wraps `Box<dyn IdentityProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use taska_types::identity::{IdentityError, UserId};

use super::provider::IdentityProvider;

/// Object-safe version of [`IdentityProvider`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch
/// (`dyn IdentityProviderDyn`). A blanket implementation is provided for
/// all types implementing `IdentityProvider`.
pub trait IdentityProviderDyn: Send + Sync {
    fn resolve_boxed<'a>(
        &'a self,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserId>, IdentityError>> + Send + 'a>>;
}

/// Blanket implementation: any `IdentityProvider` automatically
/// implements `IdentityProviderDyn`.
impl<T: IdentityProvider> IdentityProviderDyn for T {
    fn resolve_boxed<'a>(
        &'a self,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserId>, IdentityError>> + Send + 'a>> {
        Box::pin(self.resolve(credential))
    }
}

/// Type-erased identity provider for runtime provider selection.
///
/// Since `IdentityProvider` uses RPITIT, it cannot be used as a trait
/// object directly. `BoxIdentityProvider` provides an equivalent method
/// that delegates to the inner `IdentityProviderDyn` trait object,
/// letting the server pick OIDC or a static token table at startup.
pub struct BoxIdentityProvider {
    inner: Box<dyn IdentityProviderDyn + Send + Sync>,
}

impl BoxIdentityProvider {
    /// Wrap a concrete `IdentityProvider` in a type-erased box.
    pub fn new<T: IdentityProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    /// Resolve a bearer credential to a user identity.
    pub async fn resolve(&self, credential: &str) -> Result<Option<UserId>, IdentityError> {
        self.inner.resolve_boxed(credential).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysAlice;

    impl IdentityProvider for AlwaysAlice {
        async fn resolve(&self, credential: &str) -> Result<Option<UserId>, IdentityError> {
            if credential == "good" {
                Ok(Some(UserId::new("alice")))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn test_boxed_provider_delegates() {
        let provider = BoxIdentityProvider::new(AlwaysAlice);
        let resolved = provider.resolve("good").await.unwrap();
        assert_eq!(resolved, Some(UserId::new("alice")));
        assert_eq!(provider.resolve("bad").await.unwrap(), None);
    }
}
