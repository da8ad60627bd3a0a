//! Configuration management with YAML support

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides the configured database path.
pub const DATABASE_PATH_ENV: &str = "LOREKEEPER_DB_PATH";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset ("info", "lorekeeper=debug", ...)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/lorekeeper/campaign.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./lorekeeper.yaml (current directory)
    /// 3. ~/.config/lorekeeper/lorekeeper.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "lorekeeper.yaml".to_string(),
            shellexpand::tilde("~/.config/lorekeeper/lorekeeper.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory.
    /// `LOREKEEPER_DB_PATH` wins over the configured value.
    pub fn database_path(&self) -> PathBuf {
        let env_override = std::env::var(DATABASE_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty());
        self.resolve_database_path(env_override.as_deref())
    }

    fn resolve_database_path(&self, env_override: Option<&str>) -> PathBuf {
        let raw = env_override.unwrap_or(&self.database.path);
        PathBuf::from(shellexpand::tilde(raw).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.database.path.ends_with("campaign.db"));
    }

    #[test]
    fn test_env_override_wins() {
        let config = Config::default();
        assert_eq!(
            config.resolve_database_path(Some("/tmp/other.db")),
            PathBuf::from("/tmp/other.db")
        );
        assert!(!config
            .resolve_database_path(None)
            .to_string_lossy()
            .starts_with('~'));
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
database:
  path: ~/campaigns/saltmarsh.db

logging:
  level: lorekeeper=debug
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database.path, "~/campaigns/saltmarsh.db");
        assert_eq!(config.logging.level, "lorekeeper=debug");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("logging:\n  level: warn\n").unwrap();
        assert_eq!(config.database.path, default_database_path());
    }
}
