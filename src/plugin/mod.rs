//! Plugin system module
//!
//! This module provides the capability-based plugin framework:
//! - Base plugin contract and capability tags
//! - Capability interfaces (Reader, CatalogBrowsing, Account, ProgressSync)
//! - Per-plugin sandboxed context and storage
//! - The registry that indexes plugins by id, capability, extension and
//!   MIME type

pub mod account;
pub mod catalog;
pub mod context;
pub mod logger;
pub mod reader;
pub mod registry;
pub mod storage;
pub mod sync;
pub mod types;

pub use account::{AccountCapability, AccountInfo, AuthType, Credentials, OAuthSession};
pub use catalog::{
    BrowseResult, CatalogBrowsingCapability, CatalogEntry, CatalogFeature, CatalogInfo,
    ProgressCallback, ValidationResult,
};
pub use context::{AppInfo, ContextFactory, DefaultContextFactory, PluginContext};
pub use logger::{PluginLogger, TracingPluginLogger};
pub use reader::{BookMetadata, ReaderCapability, ReaderController, ReadingLocation};
pub use registry::PluginRegistry;
pub use storage::{MemoryStorageFactory, PluginStorage, StorageFactory};
pub use sync::{ProgressRecord, ProgressSyncCapability, SyncOutcome};
pub use types::{CapabilitySet, CapabilityTag, Plugin, PluginId, PluginIdentity};
