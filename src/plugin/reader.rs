//! Reader capability
//!
//! The contract between the registry and format-reading plugins: cheap
//! extension/MIME declarations for dispatch, a content probe for the
//! expensive check, metadata extraction, and the reader session returned
//! by `open_book`.

use crate::core::error::Result;
use crate::media::thumbnail::ThumbnailPreset;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format-independent book metadata, as produced by `parse_metadata`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,

    #[serde(default)]
    pub series: Option<String>,

    #[serde(default)]
    pub issue_number: Option<String>,

    #[serde(default)]
    pub volume: Option<i32>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub publisher: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    /// ISO date of first publication, when known
    #[serde(default)]
    pub release_date: Option<String>,

    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub page_count: Option<u32>,

    #[serde(default)]
    pub right_to_left: bool,
}

/// Position within an open book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingLocation {
    /// Current page index (0-based)
    pub page_index: usize,
    /// Total pages
    pub page_count: usize,
}

impl ReadingLocation {
    /// Fraction of the book read, 0.0 to 1.0
    pub fn progress(&self) -> f32 {
        if self.page_count == 0 {
            return 0.0;
        }
        (self.page_index + 1) as f32 / self.page_count as f32
    }
}

/// Reader capability: opening and reading book files
#[async_trait]
pub trait ReaderCapability: Send + Sync {
    /// File extensions this reader handles, lowercase, without dots
    fn supported_extensions(&self) -> &[&str];

    /// MIME types this reader handles
    fn supported_mime_types(&self) -> &[&str];

    /// Content probe: can this reader actually open the file?
    ///
    /// May perform I/O (open the archive, sniff magic bytes). The registry
    /// only calls this after the cheap extension filter has passed.
    async fn can_handle_file(&self, path: &Path) -> Result<bool>;

    /// Parse metadata without keeping the book open
    async fn parse_metadata(&self, path: &Path) -> Result<BookMetadata>;

    /// Open a reading session
    async fn open_book(&self, path: &Path) -> Result<Box<dyn ReaderController>>;

    /// Extract the cover image bytes, if the file yields one
    async fn extract_cover(&self, path: &Path) -> Result<Option<Vec<u8>>>;
}

/// An open reading session
///
/// Lifecycle: created by `open_book`, terminated by `dispose`. Every read
/// operation fails with `AlreadyDisposed` after disposal; `dispose` itself
/// is idempotent.
#[async_trait]
pub trait ReaderController: Send + Sync {
    /// Metadata of the open book
    fn metadata(&self) -> BookMetadata;

    /// Total number of pages
    fn page_count(&self) -> usize;

    /// Current reading location
    fn location(&self) -> Result<ReadingLocation>;

    /// Jump to a page by index
    fn go_to_page(&self, index: usize) -> Result<ReadingLocation>;

    /// Advance one page; saturates at the last page
    fn next_page(&self) -> Result<ReadingLocation>;

    /// Go back one page; saturates at the first page
    fn previous_page(&self) -> Result<ReadingLocation>;

    /// Jump to a named chapter (bookmark), where the format has them
    fn go_to_chapter(&self, _name: &str) -> Result<ReadingLocation> {
        Err(crate::core::error::QuireError::UnsupportedOperation(
            "chapter navigation".into(),
        ))
    }

    /// Raw bytes of a page
    async fn page_bytes(&self, index: usize) -> Result<Vec<u8>>;

    /// Raw bytes of the cover page
    async fn cover_bytes(&self) -> Result<Vec<u8>>;

    /// Thumbnail of a page under a named preset
    async fn thumbnail(&self, index: usize, preset: ThumbnailPreset) -> Result<Vec<u8>>;

    /// Full-text search within the book, where the format supports it
    async fn search(&self, _query: &str) -> Result<Vec<ReadingLocation>> {
        Err(crate::core::error::QuireError::UnsupportedOperation(
            "search".into(),
        ))
    }

    /// Drop the page cache without closing the session
    fn clear_cache(&self) -> Result<()>;

    /// Terminate the session; safe to call repeatedly
    async fn dispose(&self) -> Result<()>;
}
