//! Plugin runtime context
//!
//! Each plugin owns one context for its lifetime: a pre-scoped storage
//! handle, an HTTP client, a logger bound to the plugin id, the static
//! application facts, and two directories (plugin-private data, shared
//! downloads). Contexts are built by a factory external to the plugin and
//! dropped when the plugin is unregistered.

use crate::core::config::AppConfig;
use crate::core::error::Result;
use crate::plugin::logger::{PluginLogger, TracingPluginLogger};
use crate::plugin::storage::PluginStorage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Static application facts exposed to plugins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    pub app_version: String,
    pub platform: String,
    pub locale: String,
    pub is_dark_mode: bool,
}

impl AppInfo {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            app_version: config.app.version.clone(),
            platform: config.app.platform.clone(),
            locale: config.app.locale.clone(),
            is_dark_mode: config.app.dark_mode,
        }
    }
}

/// Runtime environment owned by exactly one plugin instance
#[derive(Clone)]
pub struct PluginContext {
    /// Namespaced storage handle
    pub storage: Arc<dyn PluginStorage>,

    /// HTTP client for catalog and download traffic
    pub http: reqwest::Client,

    /// Logger scoped to the plugin id
    pub logger: Arc<dyn PluginLogger>,

    /// Static application facts
    pub app: AppInfo,

    /// Plugin-private data directory
    pub data_dir: PathBuf,

    /// Shared download directory
    pub download_dir: PathBuf,
}

/// Builds a context for a plugin id and its storage handle
#[async_trait]
pub trait ContextFactory: Send + Sync {
    async fn create(
        &self,
        plugin_id: &str,
        storage: Arc<dyn PluginStorage>,
    ) -> Result<PluginContext>;
}

/// Default factory wiring contexts from the application configuration
pub struct DefaultContextFactory {
    app: AppInfo,
    data_root: PathBuf,
    download_dir: PathBuf,
    http: reqwest::Client,
}

impl DefaultContextFactory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            app: AppInfo::from_config(config),
            data_root: config.storage.data_dir.clone(),
            download_dir: config.storage.download_dir.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Factory rooted under the platform data directory
    pub fn with_platform_dirs(config: &AppConfig) -> Self {
        let mut factory = Self::new(config);
        if let Some(base) = dirs::data_dir() {
            factory.data_root = base.join("quire").join("plugins");
            factory.download_dir = base.join("quire").join("downloads");
        }
        factory
    }
}

#[async_trait]
impl ContextFactory for DefaultContextFactory {
    async fn create(
        &self,
        plugin_id: &str,
        storage: Arc<dyn PluginStorage>,
    ) -> Result<PluginContext> {
        let data_dir = self.data_root.join(plugin_id);
        tokio::fs::create_dir_all(&data_dir).await?;
        tokio::fs::create_dir_all(&self.download_dir).await?;

        Ok(PluginContext {
            storage,
            http: self.http.clone(),
            logger: TracingPluginLogger::new(plugin_id),
            app: self.app.clone(),
            data_dir,
            download_dir: self.download_dir.clone(),
        })
    }
}
