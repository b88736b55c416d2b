//! Server configuration: connection strings plus the engine's own config
//! (spec.md §6.4), loaded from YAML the way
//! `cyntra_core::config::KernelConfig::load_from_project` loads project
//! config — a `serde`-deserializable struct with a hand-written `Default`.

use serde::{Deserialize, Serialize};
use territory_protocol::EngineConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Redis connection URL for the `KVStore`.
    pub redis_url: String,
    /// Postgres connection URL for the `SnapshotSink`.
    pub database_url: String,
    /// Rule constants and tick/flush intervals (spec.md §6.4).
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            database_url: "postgres://localhost/territory".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from a YAML document, falling back to defaults for any missing
    /// field (including the whole document being empty).
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Read and parse a config file from disk, or fall back to `Default` if
    /// the file does not exist (matches `KernelConfig::load_from_project`'s
    /// "config is optional" behavior).
    pub fn load_from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Self::from_yaml(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = ServerConfig::default();
        assert_eq!(config.engine.chunk_size, 64);
        assert!(config.redis_url.starts_with("redis://"));
    }

    #[test]
    fn partial_yaml_fills_remaining_defaults() {
        let config = ServerConfig::from_yaml("redis_url: redis://cache:6379\n").unwrap();
        assert_eq!(config.redis_url, "redis://cache:6379");
        assert_eq!(config.database_url, "postgres://localhost/territory");
        assert_eq!(config.engine.max_tile_energy, 100.0);
    }

    #[test]
    fn missing_config_file_falls_back_to_default() {
        let config = ServerConfig::load_from_path(std::path::Path::new(
            "/nonexistent/territory-server.yaml",
        ))
        .unwrap();
        assert_eq!(config.redis_url, ServerConfig::default().redis_url);
    }
}
