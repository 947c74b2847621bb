use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Logger handed to a plugin through its context, scoped to the plugin id
pub trait PluginLogger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default logger backed by the tracing ecosystem
pub struct TracingPluginLogger {
    plugin_id: String,
}

impl TracingPluginLogger {
    pub fn new(plugin_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            plugin_id: plugin_id.into(),
        })
    }
}

impl PluginLogger for TracingPluginLogger {
    fn debug(&self, message: &str) {
        debug!(plugin = %self.plugin_id, "{}", message);
    }
    fn info(&self, message: &str) {
        info!(plugin = %self.plugin_id, "{}", message);
    }
    fn warn(&self, message: &str) {
        warn!(plugin = %self.plugin_id, "{}", message);
    }
    fn error(&self, message: &str) {
        error!(plugin = %self.plugin_id, "{}", message);
    }
}
