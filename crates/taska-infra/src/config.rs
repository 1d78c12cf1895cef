//! Configuration loader for Taska.
//!
//! Reads `config.toml` from the data directory (`~/.taska/` in
//! production) and deserializes it into [`TaskaConfig`]. Falls back to
//! defaults when the file is missing or malformed; secrets never live in
//! the file, only environment variable names do.

use std::path::{Path, PathBuf};

use taska_types::config::TaskaConfig;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `TASKA_DATA_DIR` environment variable
/// 2. Platform-specific data directory (e.g., `~/.taska` on macOS/Linux)
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TASKA_DATA_DIR") {
        return PathBuf::from(dir);
    }

    // Use home directory fallback: ~/.taska
    if let Some(home) = dirs::home_dir() {
        return home.join(".taska");
    }

    // Last resort: current directory
    PathBuf::from(".taska")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`TaskaConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns
///   the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> TaskaConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return TaskaConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return TaskaConfig::default();
        }
    };

    match toml::from_str::<TaskaConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            TaskaConfig::default()
        }
    }
}
