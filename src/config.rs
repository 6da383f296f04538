//! Tool configuration.
//!
//! Loaded from a TOML file with sensible defaults for every value.
//! CLI flags and environment variables override file values in the
//! binary; the library only sees the merged result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FerryError, Result};

/// Complete tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store connection settings.
    pub store: StoreConfig,
    /// Manifest and interchange file paths.
    pub files: FileConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Hostname or IP of the store.
    pub host: String,
    /// Port of the store.
    pub port: u16,
    /// Logical database to operate on.
    pub database: u32,
    /// Optional password for AUTH.
    pub auth: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            auth: None,
        }
    }
}

impl StoreConfig {
    /// Render the connection URL in `redis://[:auth@]host:port/db` form.
    ///
    /// AUTH and SELECT both happen during the connection handshake.
    pub fn url(&self) -> String {
        let mut url = String::from("redis://");
        if let Some(ref auth) = self.auth {
            url.push(':');
            url.push_str(auth);
            url.push('@');
        }
        url.push_str(&format!("{}:{}/{}", self.host, self.port, self.database));
        url
    }
}

/// Manifest and interchange file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Manifest CSV listing keys to export.
    pub manifest: PathBuf,
    /// Interchange file written by export and read by import.
    pub data: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("keys.csv"),
            data: PathBuf::from("keys.dat"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config =
            toml::from_str(&text).map_err(|e| FerryError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.store.host.is_empty() {
            return Err(FerryError::Config("store.host must not be empty".to_string()));
        }
        if self.store.port == 0 {
            return Err(FerryError::Config("store.port must not be 0".to_string()));
        }
        if self.files.manifest.as_os_str().is_empty() {
            return Err(FerryError::Config(
                "files.manifest must not be empty".to_string(),
            ));
        }
        if self.files.data.as_os_str().is_empty() {
            return Err(FerryError::Config("files.data must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.host, "127.0.0.1");
        assert_eq!(config.store.port, 6379);
        assert_eq!(config.store.database, 0);
        assert!(config.store.auth.is_none());
        assert_eq!(config.files.manifest, PathBuf::from("keys.csv"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn url_without_auth() {
        let store = StoreConfig::default();
        assert_eq!(store.url(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn url_with_auth_and_database() {
        let store = StoreConfig {
            host: "db.example.com".to_string(),
            port: 6380,
            database: 3,
            auth: Some("s3cret".to_string()),
        };
        assert_eq!(store.url(), "redis://:s3cret@db.example.com:6380/3");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            host = "10.0.0.5"

            [files]
            data = "out.dat"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.host, "10.0.0.5");
        assert_eq!(config.store.port, 6379);
        assert_eq!(config.files.data, PathBuf::from("out.dat"));
        assert_eq!(config.files.manifest, PathBuf::from("keys.csv"));
    }

    #[test]
    fn empty_host_fails_validation() {
        let mut config = Config::default();
        config.store.host.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = Config::default();
        config.store.auth = Some("pw".to_string());
        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.store.auth.as_deref(), Some("pw"));
        assert_eq!(back.store.port, config.store.port);
    }
}
