use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MnemoConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `"stdio"` or `"http"`.
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// Table capacity; storing past it evicts the least important memory.
    pub max_memories: usize,
    pub embedding_dim: usize,
    pub default_importance: f64,
    /// Importance lost per hour without access.
    pub default_decay_rate: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub enabled: bool,
    pub decay_interval_secs: u64,
    /// Memories whose importance decays below this are removed.
    pub decay_floor: f64,
    /// Time buckets older than this many days are dropped.
    pub retention_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 8765,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_memories: 1000,
            embedding_dim: 384,
            default_importance: 0.5,
            default_decay_rate: 0.01,
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            decay_interval_secs: 300,
            decay_floor: 0.1,
            retention_days: 7,
        }
    }
}

/// Returns `~/.mnemo/`, or `./.mnemo/` when no home directory is known.
pub fn default_mnemo_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mnemo")
}

/// Returns the default config file path: `~/.mnemo/config.toml`
pub fn default_config_path() -> PathBuf {
    default_mnemo_dir().join("config.toml")
}

impl MnemoConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MnemoConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (MNEMO_MAX_MEMORIES, MNEMO_TRANSPORT, MNEMO_LOG_LEVEL).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("MNEMO_MAX_MEMORIES") {
            self.store.max_memories = val
                .parse()
                .with_context(|| format!("MNEMO_MAX_MEMORIES is not a number: {val}"))?;
        }
        if let Ok(val) = std::env::var("MNEMO_TRANSPORT") {
            self.server.transport = val;
        }
        if let Ok(val) = std::env::var("MNEMO_LOG_LEVEL") {
            self.server.log_level = val;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MnemoConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.store.max_memories, 1000);
        assert_eq!(config.store.embedding_dim, 384);
        assert_eq!(config.maintenance.decay_interval_secs, 300);
        assert_eq!(config.maintenance.retention_days, 7);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[store]
max_memories = 50

[maintenance]
enabled = false
"#;
        let config: MnemoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.store.max_memories, 50);
        assert!(!config.maintenance.enabled);
        // defaults still apply for unset fields
        assert_eq!(config.store.embedding_dim, 384);
        assert_eq!(config.maintenance.decay_floor, 0.1);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MnemoConfig::default();
        std::env::set_var("MNEMO_MAX_MEMORIES", "42");
        std::env::set_var("MNEMO_TRANSPORT", "http");
        std::env::set_var("MNEMO_LOG_LEVEL", "trace");

        let applied = config.apply_env_overrides();

        // Clean up before asserting so a failure doesn't leak into other tests
        std::env::remove_var("MNEMO_MAX_MEMORIES");
        std::env::remove_var("MNEMO_TRANSPORT");
        std::env::remove_var("MNEMO_LOG_LEVEL");

        applied.unwrap();
        assert_eq!(config.store.max_memories, 42);
        assert_eq!(config.server.transport, "http");
        assert_eq!(config.server.log_level, "trace");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = MnemoConfig::load_from("/nonexistent/mnemo/config.toml").unwrap();
        assert_eq!(config.store.embedding_dim, 384);
        assert!(config.maintenance.enabled);
    }
}
