//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and
//! REST API. The turn service is generic over the chat backend and blob
//! store traits, but AppState pins it to the concrete infra
//! implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use taska_core::chat::turn::TurnService;
use taska_core::identity::BoxIdentityProvider;
use taska_infra::config::{load_config, resolve_data_dir};
use taska_infra::dify::DifyBackend;
use taska_infra::identity::{OidcUserInfoProvider, StaticTokenProvider};
use taska_infra::storage::LocalBlobStore;
use taska_types::config::TaskaConfig;

/// Concrete type alias for the turn service pinned to infra implementations.
pub type ConcreteTurnService = TurnService<DifyBackend, LocalBlobStore>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub turn_service: Arc<ConcreteTurnService>,
    pub identity: Arc<BoxIdentityProvider>,
    pub config: TaskaConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, wire services.
    ///
    /// The backend API key is read from the environment variable named in
    /// the config; it never lives in the config file itself.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let api_key = std::env::var(&config.backend.api_key_env).map_err(|_| {
            anyhow::anyhow!(
                "chat backend API key not found: set the {} environment variable",
                config.backend.api_key_env
            )
        })?;
        let backend = DifyBackend::new(SecretString::from(api_key))
            .with_base_url(config.backend.base_url.clone());

        let blob_root = config
            .storage
            .root
            .clone()
            .unwrap_or_else(|| data_dir.join("blobs"));
        tokio::fs::create_dir_all(&blob_root).await?;
        let blobs = LocalBlobStore::new(blob_root);

        // Pick the identity provider: OIDC userinfo when configured,
        // otherwise the static token table (development setups).
        let identity = match &config.identity.userinfo_url {
            Some(url) => BoxIdentityProvider::new(OidcUserInfoProvider::new(url.clone())),
            None => {
                if config.identity.tokens.is_empty() {
                    tracing::warn!(
                        "no identity.userinfo_url and no identity.tokens configured; \
                         every request will be rejected as unauthenticated"
                    );
                }
                BoxIdentityProvider::new(StaticTokenProvider::from_config(&config.identity.tokens))
            }
        };

        Ok(Self {
            turn_service: Arc::new(TurnService::new(backend, blobs)),
            identity: Arc::new(identity),
            config,
            data_dir,
        })
    }
}
