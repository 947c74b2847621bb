//! Plugin type definitions
//!
//! This module defines the base plugin contract and its identity types.
//! Plugins are dispatched by declared capability, not by concrete type: a
//! plugin carries a set of capability tags and exposes accessor methods
//! for each capability contract it structurally satisfies.

use crate::core::error::{QuireError, Result};
use crate::plugin::account::AccountCapability;
use crate::plugin::catalog::CatalogBrowsingCapability;
use crate::plugin::context::PluginContext;
use crate::plugin::reader::ReaderCapability;
use crate::plugin::sync::ProgressSyncCapability;
use serde::{Deserialize, Serialize};

/// Unique identifier for a plugin (reverse-domain style)
pub type PluginId = String;

/// Identity of a plugin, immutable once registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginIdentity {
    /// Globally unique id, reverse-domain style (e.g. "app.quire.comic")
    pub id: PluginId,

    /// Human-readable plugin name
    pub name: String,

    /// Plugin description
    pub description: String,

    /// Plugin version (semantic versioning)
    pub version: String,
}

impl PluginIdentity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            version: version.into(),
        }
    }

    /// Validate the identity: non-empty id, parseable semver version
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(QuireError::Validation("plugin id must not be empty".into()));
        }
        semver::Version::parse(&self.version).map_err(|e| {
            QuireError::Validation(format!(
                "plugin {} has invalid version '{}': {}",
                self.id, self.version, e
            ))
        })?;
        Ok(())
    }
}

/// Capability contracts a plugin can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTag {
    /// Opens and reads book files
    Reader,
    /// Browses and downloads from remote catalogs
    CatalogBrowsing,
    /// Authenticates against catalog servers
    Account,
    /// Syncs reading progress with a server
    ProgressSync,
}

impl std::fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityTag::Reader => write!(f, "reader"),
            CapabilityTag::CatalogBrowsing => write!(f, "catalog_browsing"),
            CapabilityTag::Account => write!(f, "account"),
            CapabilityTag::ProgressSync => write!(f, "progress_sync"),
        }
    }
}

/// The set of capability tags a plugin declares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(Vec<CapabilityTag>);

impl CapabilitySet {
    pub fn new(tags: impl IntoIterator<Item = CapabilityTag>) -> Self {
        let mut set = Vec::new();
        for tag in tags {
            if !set.contains(&tag) {
                set.push(tag);
            }
        }
        Self(set)
    }

    pub fn contains(&self, tag: CapabilityTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn tags(&self) -> &[CapabilityTag] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<CapabilityTag> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = CapabilityTag>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Base plugin trait
///
/// A plugin is one object that may satisfy several capability contracts at
/// once. The declared tag set and the accessor methods must agree: a
/// plugin that declares `Reader` must return `Some` from `as_reader`.
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    /// Get the plugin identity
    fn identity(&self) -> &PluginIdentity;

    /// Capability tags this plugin declares
    fn capabilities(&self) -> CapabilitySet;

    /// Initialize the plugin with its private context
    ///
    /// Called once during registration, before the plugin becomes visible
    /// to any lookup. A failure here aborts the registration.
    async fn initialize(&self, context: &PluginContext) -> Result<()>;

    /// Dispose the plugin and release its resources
    ///
    /// Called after the plugin has been removed from all lookups.
    async fn dispose(&self) -> Result<()>;

    /// Access the reader capability, if declared
    fn as_reader(&self) -> Option<&dyn ReaderCapability> {
        None
    }

    /// Access the catalog browsing capability, if declared
    fn as_catalog(&self) -> Option<&dyn CatalogBrowsingCapability> {
        None
    }

    /// Access the account capability, if declared
    fn as_account(&self) -> Option<&dyn AccountCapability> {
        None
    }

    /// Access the progress sync capability, if declared
    fn as_progress_sync(&self) -> Option<&dyn ProgressSyncCapability> {
        None
    }
}
