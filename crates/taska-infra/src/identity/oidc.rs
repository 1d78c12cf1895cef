//! OIDC userinfo identity provider.
//!
//! Resolves a bearer access token by calling the provider's userinfo
//! endpoint and taking the `sub` claim as the stable user id. Works
//! against any OIDC-conformant provider; Cognito user pools are the
//! deployed case (`https://{domain}/oauth2/userInfo`).

use std::time::Duration;

use serde::Deserialize;

use taska_core::identity::IdentityProvider;
use taska_types::identity::{IdentityError, UserId};

/// Identity provider backed by an OIDC userinfo endpoint.
///
/// A 200 with a `sub` claim authenticates the caller; 401/403 mean the
/// token was checked and rejected. Anything else is a provider failure,
/// which must not be confused with "bad token".
pub struct OidcUserInfoProvider {
    client: reqwest::Client,
    userinfo_url: String,
}

impl OidcUserInfoProvider {
    pub fn new(userinfo_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            userinfo_url,
        }
    }
}

/// The slice of the userinfo response Taska needs.
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: String,
}

impl IdentityProvider for OidcUserInfoProvider {
    async fn resolve(&self, credential: &str) -> Result<Option<UserId>, IdentityError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| IdentityError::ProviderUnreachable(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let info: UserInfoResponse = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;
                let user_id = info.sub.parse().map_err(|e| {
                    IdentityError::MalformedResponse(format!("unusable sub claim: {e}"))
                })?;
                Ok(Some(user_id))
            }
            401 | 403 => Ok(None),
            status => Err(IdentityError::ProviderUnreachable(format!(
                "userinfo endpoint returned HTTP {status}"
            ))),
        }
    }
}
