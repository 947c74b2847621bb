//! Plugin registry
//!
//! The central directory of the plugin system. Plugins are registered
//! with a storage factory and a context factory; the registry builds the
//! plugin's isolated environment, runs `initialize`, and only then makes
//! the plugin visible; no lookup can ever observe a partially
//! initialized plugin. Lookups are synchronous snapshot reads; only
//! registration and the file probe suspend.
//!
//! There is no global instance: hosts create one registry and pass it
//! around explicitly.

use crate::core::error::{QuireError, Result};
use crate::plugin::context::ContextFactory;
use crate::plugin::storage::StorageFactory;
use crate::plugin::types::{CapabilityTag, Plugin, PluginId};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

/// Visible registry state: entries plus registration order
///
/// The order vector keeps lookups deterministic; map iteration order is
/// not.
#[derive(Default)]
struct RegistryState {
    entries: HashMap<PluginId, Arc<dyn Plugin>>,
    order: Vec<PluginId>,
}

impl RegistryState {
    fn ordered(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }
}

/// Plugin registry
pub struct PluginRegistry {
    state: RwLock<RegistryState>,
    /// Ids with a registration in flight, so concurrent registrations of
    /// the same id are rejected before either becomes visible
    pending: Mutex<HashSet<PluginId>>,
}

impl PluginRegistry {
    /// Create a new empty plugin registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Register a plugin
    ///
    /// Builds storage through `storage_factory`, a context through
    /// `context_factory`, initializes the plugin with it, and makes the
    /// plugin visible as the final step. Fails with
    /// `DuplicateRegistration` if the id is already registered or a
    /// registration for it is in flight; an initialization failure aborts
    /// this plugin only and leaves the registry untouched.
    pub async fn register(
        &self,
        plugin: Arc<dyn Plugin>,
        storage_factory: &dyn StorageFactory,
        context_factory: &dyn ContextFactory,
    ) -> Result<()> {
        let identity = plugin.identity().clone();
        identity.validate()?;
        let id = identity.id.clone();

        // Reserve the id before any await so concurrent registrations of
        // the same plugin cannot both proceed.
        {
            let state = self.state.read().expect("registry lock poisoned");
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            if state.entries.contains_key(&id) || !pending.insert(id.clone()) {
                return Err(QuireError::DuplicateRegistration(id));
            }
        }
        let _guard = PendingGuard { registry: self, id: id.clone() };

        let storage = storage_factory.create(&id).await?;
        let context = context_factory.create(&id, storage).await?;

        plugin
            .initialize(&context)
            .await
            .map_err(|e| QuireError::PluginInit(format!("{}: {}", id, e)))?;

        // Visibility is the last step.
        {
            let mut state = self.state.write().expect("registry lock poisoned");
            state.entries.insert(id.clone(), plugin);
            state.order.push(id.clone());
        }

        info!(plugin = %id, version = %identity.version, "plugin registered");
        Ok(())
    }

    /// Unregister a plugin
    ///
    /// Removes the plugin from all lookups first, then disposes it.
    /// Returns whether a plugin was present under the id.
    pub async fn unregister(&self, id: &str) -> bool {
        let removed = {
            let mut state = self.state.write().expect("registry lock poisoned");
            state.order.retain(|p| p != id);
            state.entries.remove(id)
        };

        match removed {
            Some(plugin) => {
                if let Err(e) = plugin.dispose().await {
                    warn!(plugin = %id, error = %e, "plugin dispose failed");
                }
                info!(plugin = %id, "plugin unregistered");
                true
            }
            None => false,
        }
    }

    /// Get a plugin by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        let state = self.state.read().expect("registry lock poisoned");
        state.entries.get(id).cloned()
    }

    /// Whether a plugin id is registered and visible
    pub fn is_registered(&self, id: &str) -> bool {
        let state = self.state.read().expect("registry lock poisoned");
        state.entries.contains_key(id)
    }

    /// Number of registered plugins
    pub fn count(&self) -> usize {
        let state = self.state.read().expect("registry lock poisoned");
        state.entries.len()
    }

    /// All plugins declaring a capability, in registration order
    pub fn with_capability(&self, tag: CapabilityTag) -> Vec<Arc<dyn Plugin>> {
        let state = self.state.read().expect("registry lock poisoned");
        state
            .ordered()
            .filter(|p| p.capabilities().contains(tag))
            .cloned()
            .collect()
    }

    /// First plugin with the capability whose declared MIME-type list
    /// contains `mime` (case-insensitive exact match)
    pub fn for_mime_type(&self, tag: CapabilityTag, mime: &str) -> Option<Arc<dyn Plugin>> {
        let wanted = mime.to_ascii_lowercase();
        let state = self.state.read().expect("registry lock poisoned");
        let result = state
            .ordered()
            .filter(|p| p.capabilities().contains(tag))
            .find(|p| {
                p.as_reader()
                    .map(|r| {
                        r.supported_mime_types()
                            .iter()
                            .any(|m| m.eq_ignore_ascii_case(&wanted))
                    })
                    .unwrap_or(false)
            })
            .cloned();
        result
    }

    /// First reader plugin that can handle the file
    ///
    /// Two-stage: candidates are filtered by declared file extension, then
    /// each candidate's `can_handle_file` probe runs in order until one
    /// returns true. The cheap filter keeps the registry from opening
    /// every candidate archive for every file; probes never run
    /// concurrently for the same path.
    pub async fn for_file(&self, path: &Path) -> Option<Arc<dyn Plugin>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;

        let candidates: Vec<Arc<dyn Plugin>> = {
            let state = self.state.read().expect("registry lock poisoned");
            state
                .ordered()
                .filter(|p| {
                    p.as_reader()
                        .map(|r| r.supported_extensions().contains(&extension.as_str()))
                        .unwrap_or(false)
                })
                .cloned()
                .collect()
        };

        for plugin in candidates {
            let Some(reader) = plugin.as_reader() else { continue };
            match reader.can_handle_file(path).await {
                Ok(true) => return Some(plugin.clone()),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        plugin = %plugin.identity().id,
                        path = %path.display(),
                        error = %e,
                        "file probe failed"
                    );
                }
            }
        }
        None
    }

    /// Dispose all plugins and empty the registry (test/teardown use)
    pub async fn clear(&self) {
        let drained: Vec<(PluginId, Arc<dyn Plugin>)> = {
            let mut state = self.state.write().expect("registry lock poisoned");
            state.order.clear();
            state.entries.drain().collect()
        };

        for (id, plugin) in drained {
            if let Err(e) = plugin.dispose().await {
                warn!(plugin = %id, error = %e, "plugin dispose failed during clear");
            }
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases a reserved id when a registration attempt ends, however it ends
struct PendingGuard<'a> {
    registry: &'a PluginRegistry,
    id: PluginId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self
            .registry
            .pending
            .lock()
            .expect("pending lock poisoned");
        pending.remove(&self.id);
    }
}
