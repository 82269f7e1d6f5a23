//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 3000)
    pub port: u16,
    /// Public domain the server is reached at (e.g., "social.example.com")
    ///
    /// Used to build absolute URLs for uploaded files.
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://social.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Authentication configuration (bearer tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens (32+ bytes)
    pub token_secret: String,
    /// Token lifetime in seconds (default: 3600 = 1 hour)
    pub token_ttl_seconds: i64,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub media: MediaStorageConfig,
}

/// Media storage configuration (local disk)
#[derive(Debug, Clone, Deserialize)]
pub struct MediaStorageConfig {
    /// Directory accepted uploads are written to
    pub root: PathBuf,
    /// URL path the upload directory is served under (e.g., "/uploads")
    pub public_path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// Filter directives used when `RUST_LOG` is not set
    pub fn env_filter(&self) -> String {
        format!("lagoon={},tower_http=debug", self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (LAGOON_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.domain", "localhost:3000")?
            .set_default("server.protocol", "http")?
            .set_default("auth.token_ttl_seconds", 3600)?
            .set_default("storage.media.root", "uploads")?
            .set_default("storage.media.public_path", "/uploads")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (LAGOON_*)
            .add_source(
                Environment::with_prefix("LAGOON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_TOKEN_SECRET_BYTES: usize = 32;

        if self.auth.token_secret.as_bytes().len() < MIN_TOKEN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.token_secret must be at least {} bytes",
                MIN_TOKEN_SECRET_BYTES
            )));
        }

        if self.auth.token_ttl_seconds <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.token_ttl_seconds must be greater than 0".to_string(),
            ));
        }

        if !self.storage.media.public_path.starts_with('/') {
            return Err(crate::error::AppError::Config(
                "storage.media.public_path must start with '/'".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                domain: "localhost:3000".to_string(),
                protocol: "http".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/lagoon-test.db"),
            },
            auth: AuthConfig {
                token_secret: "x".repeat(32),
                token_ttl_seconds: 3600,
            },
            storage: StorageConfig {
                media: MediaStorageConfig {
                    root: PathBuf::from("/tmp/lagoon-uploads"),
                    public_path: "/uploads".to_string(),
                },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_valid_config() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.base_url(), "http://localhost:3000");
    }

    #[test]
    fn validate_rejects_short_token_secret() {
        let mut config = valid_config();
        config.auth.token_secret = "short-secret".to_string();

        let error = config
            .validate()
            .expect_err("token secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.token_secret")
        ));
    }

    #[test]
    fn validate_rejects_non_positive_ttl() {
        let mut config = valid_config();
        config.auth.token_ttl_seconds = 0;

        let error = config.validate().expect_err("zero TTL must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("token_ttl_seconds")
        ));
    }

    #[test]
    fn validate_rejects_relative_public_path() {
        let mut config = valid_config();
        config.storage.media.public_path = "uploads".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn logging_config_drives_filter_and_format() {
        let mut config = valid_config();
        config.logging.level = "debug".to_string();
        assert_eq!(config.logging.env_filter(), "lagoon=debug,tower_http=debug");
        assert!(!config.logging.is_json());

        config.logging.format = "json".to_string();
        assert!(config.logging.is_json());
    }
}
