//! Structured logging system
//!
//! Configures the global tracing subscriber from `LoggingConfig`:
//! JSON or text formatting, env-filter levels, stdout or rolling file
//! output via tracing-appender.

use crate::core::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logger instance that owns the writer guard for the lifetime of the process
pub struct Logger {
    _guard: Option<WorkerGuard>,
}

impl Logger {
    /// Initialize the logging system based on configuration
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

        let (writer, guard) = match config.output.as_str() {
            "stdout" => {
                let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
                (non_blocking, Some(guard))
            }
            "file" => {
                let log_file = config
                    .log_file
                    .as_ref()
                    .context("log_file must be specified when output is 'file'")?;

                if let Some(parent) = log_file.parent() {
                    std::fs::create_dir_all(parent).context("Failed to create log directory")?;
                }

                let dir = log_file.parent().unwrap_or_else(|| std::path::Path::new("."));
                let file_name = log_file
                    .file_name()
                    .context("log_file must name a file")?
                    .to_os_string();
                let file_appender = tracing_appender::rolling::daily(dir, file_name);

                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                (non_blocking, Some(guard))
            }
            _ => {
                anyhow::bail!("Invalid output configuration: {}", config.output);
            }
        };

        let fmt_layer = match config.format.as_str() {
            "json" => fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            "text" => fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .boxed(),
            _ => {
                anyhow::bail!("Invalid format configuration: {}", config.format);
            }
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize tracing subscriber")?;

        tracing::info!(
            level = %config.level,
            format = %config.format,
            output = %config.output,
            "Logging system initialized"
        );

        Ok(Logger { _guard: guard })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LoggingConfig;

    fn base_config() -> LoggingConfig {
        LoggingConfig {
            level: "info".into(),
            format: "text".into(),
            output: "stdout".into(),
            log_file: None,
        }
    }

    #[test]
    fn test_file_output_without_path_fails() {
        let mut config = base_config();
        config.output = "file".into();
        let result = Logger::init(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_output_fails() {
        let mut config = base_config();
        config.output = "syslog".into();
        assert!(Logger::init(&config).is_err());
    }
}
