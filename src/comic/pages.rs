//! Page construction
//!
//! Turns a container's naturally sorted image entries into typed page
//! records and overlays externally parsed per-page metadata onto them.

use crate::archive::{basename, ArchiveContainer};
use crate::comic::metadata::ComicInfoPage;
use crate::core::error::Result;
use crate::media::dimensions::dimensions_of;
use crate::media::format::media_type_for;
use serde::{Deserialize, Serialize};

/// Role of a page within the book (the ComicInfo vocabulary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageType {
    FrontCover,
    InnerCover,
    Roundup,
    #[default]
    Story,
    Advertisement,
    Editorial,
    Letters,
    Preview,
    BackCover,
    Other,
    Deleted,
}

impl PageType {
    /// Parse a ComicInfo page type attribute; unknown values become Other
    pub fn parse(value: &str) -> Self {
        match value {
            "FrontCover" => PageType::FrontCover,
            "InnerCover" => PageType::InnerCover,
            "Roundup" => PageType::Roundup,
            "Story" => PageType::Story,
            "Advertisement" => PageType::Advertisement,
            "Editorial" => PageType::Editorial,
            "Letters" => PageType::Letters,
            "Preview" => PageType::Preview,
            "BackCover" => PageType::BackCover,
            "Deleted" => PageType::Deleted,
            _ => PageType::Other,
        }
    }
}

/// One page of a book
///
/// Immutable value record; `index` matches reading order and is contiguous
/// from zero within a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    /// Basename of the archive entry
    pub filename: String,
    /// Full archive path of the entry, for container reads
    pub archive_path: String,
    pub media_type: String,
    pub page_type: PageType,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub file_size_bytes: Option<u64>,
    #[serde(default)]
    pub is_double_page: bool,
    #[serde(default)]
    pub bookmark: Option<String>,
}

/// Options for building the page list
#[derive(Debug, Clone, Copy, Default)]
pub struct PageBuildOptions {
    /// Probe image headers for dimensions (cheap, header-only)
    pub read_dimensions: bool,
    /// Fall back to a full decode when the header probe is inconclusive.
    /// Expensive; off unless a caller explicitly wants exact dimensions.
    pub full_decode_fallback: bool,
}

/// Builds ordered, typed page sequences from a container
pub struct PageOrderBuilder;

impl PageOrderBuilder {
    /// Build pages from the container's naturally sorted image entries
    ///
    /// The first page defaults to `FrontCover`; metadata can override page
    /// types afterwards through the applicator. Media types come from each
    /// entry's magic bytes. A page whose dimensions cannot be probed keeps
    /// `None` rather than failing the build.
    pub fn build(
        container: &mut dyn ArchiveContainer,
        options: PageBuildOptions,
    ) -> Result<Vec<Page>> {
        let entries = container.image_entries()?;
        let mut pages = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let bytes = container.read_entry(&entry.path)?;
            let media_type = media_type_for(&bytes, &entry.path);

            let (width, height) = if options.read_dimensions {
                match dimensions_of(&bytes, options.full_decode_fallback) {
                    Ok(Some(dims)) => (Some(dims.width), Some(dims.height)),
                    Ok(None) => (None, None),
                    Err(e) => {
                        tracing::debug!(page = %entry.path, error = %e, "dimension probe failed");
                        (None, None)
                    }
                }
            } else {
                (None, None)
            };

            pages.push(Page {
                index,
                filename: basename(&entry.path).to_string(),
                archive_path: entry.path.clone(),
                media_type,
                page_type: if index == 0 {
                    PageType::FrontCover
                } else {
                    PageType::Story
                },
                width,
                height,
                file_size_bytes: Some(entry.size_bytes),
                is_double_page: false,
                bookmark: None,
            });
        }

        Ok(pages)
    }
}

/// Merges parsed per-page metadata onto built pages by index
pub struct PageMetadataApplicator;

impl PageMetadataApplicator {
    /// Apply ComicInfo page records to the page list
    ///
    /// Records address pages by their `Image` index; records pointing past
    /// the end are ignored and pages without a record are left unchanged.
    pub fn apply(pages: &mut [Page], records: &[ComicInfoPage]) {
        for record in records {
            let Some(index) = record.image else { continue };
            let Some(page) = pages.get_mut(index as usize) else {
                continue;
            };
            if let Some(page_type) = record.page_type.as_deref() {
                page.page_type = PageType::parse(page_type);
            }
            if let Some(double) = record.double_page {
                page.is_double_page = double;
            }
            if record.image_width.is_some() {
                page.width = record.image_width;
            }
            if record.image_height.is_some() {
                page.height = record.image_height;
            }
            if record.bookmark.is_some() {
                page.bookmark = record.bookmark.clone();
            }
        }
    }
}
