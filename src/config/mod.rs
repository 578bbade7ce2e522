use crate::constants::{env_vars, pacing};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub mod paths;
pub mod validation;

use paths::{get_config_path, get_default_database_path, get_log_dir_path};
use validation::validate_config;

/// Default upstream statistics API domain
pub const DEFAULT_API_DOMAIN: &str = "https://stats.nba.com/stats";

/// Configuration for one ingestion run.
///
/// The pipeline receives this struct at construction time; nothing reads
/// configuration through globals. Handles loading, saving, and managing
/// application settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// API domain for fetching statistics tables. Should include https:// prefix.
    #[serde(default = "default_api_domain")]
    pub api_domain: String,
    /// Path to the snapshot database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Path to the log file. If not specified, logs go to the default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// HTTP timeout in seconds for API requests. Defaults to 30 seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Minimum delay between requests to per-entity endpoint families, in ms.
    #[serde(default = "default_per_entity_delay")]
    pub per_entity_delay_ms: u64,
    /// Minimum delay between requests to league-wide endpoint families, in ms.
    #[serde(default = "default_league_delay")]
    pub league_delay_ms: u64,
    /// Bounded retry attempts for a single upstream fetch.
    #[serde(default = "default_max_retries")]
    pub max_retry_attempts: u32,
}

fn default_api_domain() -> String {
    DEFAULT_API_DOMAIN.to_string()
}

fn default_database_path() -> String {
    get_default_database_path()
}

fn default_http_timeout() -> u64 {
    crate::constants::DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_per_entity_delay() -> u64 {
    pacing::PER_ENTITY_DELAY_MS
}

fn default_league_delay() -> u64 {
    pacing::LEAGUE_DELAY_MS
}

fn default_max_retries() -> u32 {
    pacing::MAX_RETRY_ATTEMPTS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_domain: default_api_domain(),
            database_path: default_database_path(),
            log_file_path: None,
            http_timeout_seconds: default_http_timeout(),
            per_entity_delay_ms: default_per_entity_delay(),
            league_delay_ms: default_league_delay(),
            max_retry_attempts: default_max_retries(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    /// If no config file exists, defaults are used. Environment variables
    /// override config file values.
    ///
    /// # Environment Variables
    /// - `HOOPSNAP_API_DOMAIN` - Override API domain
    /// - `HOOPSNAP_LOG_FILE` - Override log file path
    /// - `HOOPSNAP_HTTP_TIMEOUT` - Override HTTP timeout in seconds
    /// - `HOOPSNAP_DATABASE_PATH` - Override snapshot database path
    pub async fn load() -> Result<Self, AppError> {
        Self::load_from_path(&get_config_path()).await
    }

    /// Loads configuration from a custom file path, applying env overrides
    /// and validation.
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path).await?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // Override with environment variables if present
        if let Ok(api_domain) = std::env::var(env_vars::API_DOMAIN) {
            config.api_domain = api_domain;
        }

        if let Ok(log_file_path) = std::env::var(env_vars::LOG_FILE) {
            config.log_file_path = Some(log_file_path);
        }

        if let Ok(database_path) = std::env::var(env_vars::DATABASE_PATH) {
            config.database_path = database_path;
        }

        if let Some(timeout) = std::env::var(env_vars::HTTP_TIMEOUT)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.http_timeout_seconds = timeout;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(
            &self.api_domain,
            &self.log_file_path,
            self.per_entity_delay_ms,
            self.league_delay_ms,
            self.max_retry_attempts,
        )
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        self.save_to_path(&get_config_path()).await
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    /// Returns the platform-specific path for the log directory.
    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Displays current configuration settings to stdout.
    pub async fn display() -> Result<(), AppError> {
        let config_path = get_config_path();
        let log_dir = get_log_dir_path();

        if Path::new(&config_path).exists() {
            let config = Config::load().await?;
            println!("\nCurrent Configuration");
            println!("────────────────────────────────────");
            println!("Config Location:");
            println!("{config_path}");
            println!("────────────────────────────────────");
            println!("API Domain:");
            println!("{}", config.api_domain);
            println!("────────────────────────────────────");
            println!("Database:");
            println!("{}", config.database_path);
            println!("────────────────────────────────────");
            println!("HTTP Timeout:");
            println!("{} seconds", config.http_timeout_seconds);
            println!("────────────────────────────────────");
            println!("Request Pacing:");
            println!(
                "{} ms per-entity / {} ms league-wide, {} retries",
                config.per_entity_delay_ms, config.league_delay_ms, config.max_retry_attempts
            );
            println!("────────────────────────────────────");
            println!("Log File Location:");
            if let Some(custom_path) = &config.log_file_path {
                println!("{custom_path}");
            } else {
                println!("{log_dir}/hoopsnap.log");
                println!("(Default location)");
            }
        } else {
            println!("\nNo configuration file found at:");
            println!("{config_path}");
            println!("Defaults are in effect.");
        }

        Ok(())
    }

    /// Saves configuration to a custom file path.
    ///
    /// Creates the parent directory if it doesn't exist and ensures the API
    /// domain has the proper https:// prefix.
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }
        let api_domain = if !self.api_domain.starts_with("https://")
            && !self.api_domain.starts_with("http://localhost")
            && !self.api_domain.starts_with("http://127.0.0.1")
        {
            format!("https://{}", self.api_domain.trim_start_matches("http://"))
        } else {
            self.api_domain.clone()
        };
        let content = toml::to_string_pretty(&Config {
            api_domain,
            ..self.clone()
        })?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[tokio::test]
    #[serial]
    async fn test_load_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = Config::load_from_path(config_path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.api_domain, DEFAULT_API_DOMAIN);
        assert_eq!(
            config.http_timeout_seconds,
            crate::constants::DEFAULT_HTTP_TIMEOUT_SECONDS
        );
        assert_eq!(config.per_entity_delay_ms, pacing::PER_ENTITY_DELAY_MS);
    }

    #[tokio::test]
    #[serial]
    async fn test_save_and_load_round_trip() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let path = config_path.to_str().unwrap();

        let config = Config {
            api_domain: "https://stats.example.com".to_string(),
            database_path: "/tmp/snapshot.db".to_string(),
            log_file_path: None,
            http_timeout_seconds: 12,
            per_entity_delay_ms: 250,
            league_delay_ms: 750,
            max_retry_attempts: 5,
        };
        config.save_to_path(path).await.unwrap();

        let loaded = Config::load_from_path(path).await.unwrap();
        assert_eq!(loaded.api_domain, "https://stats.example.com");
        assert_eq!(loaded.database_path, "/tmp/snapshot.db");
        assert_eq!(loaded.http_timeout_seconds, 12);
        assert_eq!(loaded.per_entity_delay_ms, 250);
        assert_eq!(loaded.league_delay_ms, 750);
        assert_eq!(loaded.max_retry_attempts, 5);
    }

    #[tokio::test]
    #[serial]
    async fn test_save_prefixes_https() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let path = config_path.to_str().unwrap();

        let config = Config {
            api_domain: "stats.example.com".to_string(),
            ..Config::default()
        };
        config.save_to_path(path).await.unwrap();

        let loaded = Config::load_from_path(path).await.unwrap();
        assert_eq!(loaded.api_domain, "https://stats.example.com");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_override_api_domain() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        // SAFETY: guarded by #[serial]; no other test reads these vars concurrently
        unsafe {
            std::env::set_var(env_vars::API_DOMAIN, "https://override.example.com");
        }
        let config = Config::load_from_path(config_path.to_str().unwrap())
            .await
            .unwrap();
        unsafe {
            std::env::remove_var(env_vars::API_DOMAIN);
        }

        assert_eq!(config.api_domain, "https://override.example.com");
    }

    #[tokio::test]
    #[serial]
    async fn test_invalid_config_file_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        tokio::fs::write(&config_path, "api_domain = \"\"\n")
            .await
            .unwrap();

        let result = Config::load_from_path(config_path.to_str().unwrap()).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
