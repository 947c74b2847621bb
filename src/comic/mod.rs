//! Comic archive pipeline
//!
//! Container access, metadata precedence, natural page ordering and the
//! reading session for CBZ/CBR archives, plus the plugin that exposes the
//! pipeline through the reader capability.

pub mod book;
pub mod metadata;
pub mod pages;
pub mod plugin;
pub mod reader;

pub use book::{ComicBook, ReadingDirection};
pub use metadata::{ComicMetadata, MetadataSchema, MetadataSource};
pub use pages::{Page, PageBuildOptions, PageMetadataApplicator, PageOrderBuilder, PageType};
pub use plugin::ComicReaderPlugin;
pub use reader::{ComicOpenOptions, ComicReaderSession};
