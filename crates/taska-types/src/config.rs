//! Service configuration types for Taska.
//!
//! `TaskaConfig` represents the top-level `config.toml` that controls the
//! HTTP listener, the chat backend endpoint, and identity resolution.
//! Secret material (the backend API key) never lives in the file; the
//! config only names the environment variable that holds it.

use serde::{Deserialize, Serialize};

use std::path::PathBuf;

/// Top-level configuration for the Taska service.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskaConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Chat backend (LLM orchestration service) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend, without the `/v1` suffix.
    #[serde(default = "default_backend_base_url")]
    pub base_url: String,

    /// Environment variable holding the backend API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_backend_base_url() -> String {
    "https://api.dify.ai".to_string()
}

fn default_api_key_env() -> String {
    "TASKA_BACKEND_API_KEY".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Identity resolution settings.
///
/// When `userinfo_url` is set, credentials are resolved against that OIDC
/// userinfo endpoint. Otherwise the static token directory below is used
/// (development and tests only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_url: Option<String>,

    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

/// One entry of the development token directory.
///
/// Only the SHA-256 hex digest of a token is stored, never the token itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub sha256: String,
    pub user_id: String,
}

/// Blob storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for the local blob store. Defaults to
    /// `{data_dir}/blobs` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}
