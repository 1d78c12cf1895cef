//! Identity provider implementations.
//!
//! `OidcUserInfoProvider` resolves bearer tokens against an OIDC
//! userinfo endpoint (the production path, e.g. Cognito).
//! `StaticTokenProvider` resolves against a digest table from config,
//! for local development without an identity provider.

pub mod oidc;
pub mod static_tokens;

pub use oidc::OidcUserInfoProvider;
pub use static_tokens::StaticTokenProvider;
