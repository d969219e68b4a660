//! Sync configuration loader for Arcana.
//!
//! Reads `config.toml` from the data directory (`~/.arcana/` in production)
//! and deserializes it into [`SyncConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use arcana_types::config::SyncConfig;

/// Resolve the data directory: `ARCANA_DATA_DIR` env var, falling back to
/// `~/.arcana`.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ARCANA_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".arcana")
}

/// Load sync configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`SyncConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_sync_config(data_dir: &Path) -> SyncConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return SyncConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return SyncConfig::default();
        }
    };

    match toml::from_str::<SyncConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            SyncConfig::default()
        }
    }
}
