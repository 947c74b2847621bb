//! Quire reader core
//!
//! The capability-based plugin framework and archive-backed format-reader
//! core of a multi-format e-book/comic reader: plugin registry, per-plugin
//! contexts and storage, capability contracts, and the complete CBZ/CBR
//! comic pipeline (containers, metadata precedence, natural page ordering,
//! thumbnails).

pub mod archive;
pub mod comic;
pub mod core;
pub mod media;
pub mod plugin;

// Re-export commonly used types
pub use crate::core::{AppConfig, QuireError, Result};
pub use comic::ComicReaderPlugin;
pub use plugin::{PluginContext, PluginRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
