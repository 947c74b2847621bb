//! Core support module
//!
//! This module provides the crate-wide foundation:
//! - Error handling and type system
//! - Configuration management
//! - Structured logging system
//! - Credential encryption
//! - Natural filename ordering
//! - Precedence policies

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod natsort;
pub mod policy;

pub use config::{AppConfig, AppSection, LoggingConfig, StorageConfig, ThumbnailConfig};
pub use error::{ErrorContext, QuireError, Result};
pub use logging::Logger;
pub use natsort::{natural_compare, natural_sort};
pub use policy::{FormatPriority, MetadataPrecedence};
