//! Identity resolution.
//!
//! The trait to the external identity provider plus the type-erased
//! wrapper the HTTP layer holds. The concrete providers (OIDC userinfo,
//! static token table) live in taska-infra.

pub mod box_provider;
pub mod provider;

pub use box_provider::BoxIdentityProvider;
pub use provider::IdentityProvider;
