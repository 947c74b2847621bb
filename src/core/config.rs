//! Configuration management

use config::{Config as ConfigBuilder, ConfigError as BuilderError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid application configuration: {0}")]
    InvalidApp(String),

    #[error("Invalid storage configuration: {0}")]
    InvalidStorage(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid thumbnail configuration: {0}")]
    InvalidThumbnail(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSection,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub thumbnails: ThumbnailConfig,
}

/// Static application facts handed to plugins through their context
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub version: String,
    pub platform: String,
    pub locale: String,
    pub dark_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root under which each plugin gets a private data directory
    pub data_dir: PathBuf,
    /// Shared download directory visible to all plugins
    pub download_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailConfig {
    /// JPEG quality used by the lossy presets (1-100)
    pub jpeg_quality: u8,
    /// Upper bound on thumbnail edge length accepted from callers
    pub max_edge: u32,
}

impl AppConfig {
    /// Load configuration with precedence: Environment variables > Config file > Defaults
    ///
    /// Environment variables are prefixed with QUIRE_ and use __ for nesting,
    /// e.g. `QUIRE_LOGGING__LEVEL=debug`.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;

        if let Some(config_path) = config_file {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(config_path.display().to_string()));
            }
            builder = builder.add_source(File::from(config_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("QUIRE")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from defaults only (tests, embedded use)
    pub fn default_config() -> Result<Self, ConfigError> {
        let config: AppConfig = Self::defaults()?.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = ConfigBuilder::builder()
            .set_default("app.version", env!("CARGO_PKG_VERSION"))?
            .set_default("app.platform", std::env::consts::OS)?
            .set_default("app.locale", "en-US")?
            .set_default("app.dark_mode", false)?
            .set_default("storage.data_dir", "./data/plugins")?
            .set_default("storage.download_dir", "./data/downloads")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            .set_default("logging.output", "stdout")?
            .set_default("thumbnails.jpeg_quality", 85)?
            .set_default("thumbnails.max_edge", 4096)?;
        Ok(builder)
    }

    /// Validate the configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.version.is_empty() {
            return Err(ConfigError::InvalidApp("version must not be empty".into()));
        }
        if self.app.locale.is_empty() {
            return Err(ConfigError::InvalidApp("locale must not be empty".into()));
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidStorage("data_dir must not be empty".into()));
        }
        if self.storage.download_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidStorage(
                "download_dir must not be empty".into(),
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::InvalidLogging(format!(
                    "unknown log level: {}",
                    other
                )))
            }
        }
        match self.logging.format.as_str() {
            "json" | "text" => {}
            other => {
                return Err(ConfigError::InvalidLogging(format!(
                    "unknown log format: {}",
                    other
                )))
            }
        }
        if self.logging.output == "file" && self.logging.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be set when output is 'file'".into(),
            ));
        }

        if self.thumbnails.jpeg_quality == 0 || self.thumbnails.jpeg_quality > 100 {
            return Err(ConfigError::InvalidThumbnail(format!(
                "jpeg_quality must be 1-100, got {}",
                self.thumbnails.jpeg_quality
            )));
        }
        if self.thumbnails.max_edge == 0 {
            return Err(ConfigError::InvalidThumbnail("max_edge must be > 0".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default_config().unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.thumbnails.jpeg_quality, 85);
        assert!(!config.app.version.is_empty());
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let mut config = AppConfig::default_config().unwrap();
        config.logging.level = "verbose".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogging(_))));
    }

    #[test]
    fn test_file_output_requires_log_file() {
        let mut config = AppConfig::default_config().unwrap();
        config.logging.output = "file".into();
        config.logging.log_file = None;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogging(_))));
    }

    #[test]
    fn test_quality_bounds() {
        let mut config = AppConfig::default_config().unwrap();
        config.thumbnails.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.thumbnails.jpeg_quality = 101;
        assert!(config.validate().is_err());
        config.thumbnails.jpeg_quality = 100;
        assert!(config.validate().is_ok());
    }
}
