//! Archive container abstraction
//!
//! A container is a uniform read-only view over an archive's entries,
//! independent of the underlying archive format. The two shipping
//! adapters cover ZIP-backed (CBZ) and RAR-backed (CBR) comic archives.
//!
//! Page order comes from the container: image entries are filtered to
//! recognized image types, stripped of hidden files and resource-fork
//! artifacts, and sorted with the natural comparator. Metadata files are
//! looked up case-insensitively by basename regardless of directory.

pub mod rar;
pub mod zip;

use crate::core::error::{QuireError, Result};
use crate::core::natsort::natural_compare;
use crate::media::format::IMAGE_EXTENSIONS;
use std::path::Path;

pub use rar::RarContainer;
pub use zip::ZipContainer;

/// An entry in an archive
///
/// Paths are archive-relative and forward-slash separated; the original
/// casing is preserved for re-export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub size_bytes: u64,
}

/// Underlying archive format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
}

impl ArchiveKind {
    /// Detect archive kind from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "zip" | "cbz" => Some(Self::Zip),
            "rar" | "cbr" => Some(Self::Rar),
            _ => None,
        }
    }

    /// Detect archive kind from leading magic bytes
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if bytes.starts_with(b"Rar!\x1a\x07") {
            Some(Self::Rar)
        } else {
            None
        }
    }
}

/// Uniform list/read contract over an open archive
///
/// Containers are not shared between concurrent readers; each reading
/// session opens its own. Resources are released on drop.
pub trait ArchiveContainer: Send {
    /// Underlying archive format
    fn kind(&self) -> ArchiveKind;

    /// All entries, in archive order
    fn entries(&mut self) -> Result<Vec<ArchiveEntry>>;

    /// Read the raw bytes of an entry by its exact archive path
    fn read_entry(&mut self, path: &str) -> Result<Vec<u8>>;

    /// Whether an entry can be extracted by this adapter
    ///
    /// ZIP entries always can; RAR entries stored with an unknown
    /// compression method cannot.
    fn can_extract(&mut self, _path: &str) -> Result<bool> {
        Ok(true)
    }

    /// Image entries filtered and sorted into reading order
    ///
    /// Excludes hidden files, resource-fork artifacts and anything without
    /// a recognized image extension, then applies the natural comparator.
    /// This is the page order, independent of any metadata.
    fn image_entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let mut images: Vec<ArchiveEntry> = self
            .entries()?
            .into_iter()
            .filter(|e| is_page_image(&e.path))
            .collect();
        images.sort_by(|a, b| natural_compare(&a.path, &b.path));
        Ok(images)
    }

    /// Case-insensitive lookup of a file by basename, in any directory
    fn find_file(&mut self, name: &str) -> Result<Option<ArchiveEntry>> {
        let wanted = name.to_ascii_lowercase();
        Ok(self.entries()?.into_iter().find(|e| {
            basename(&e.path).to_ascii_lowercase() == wanted
        }))
    }

    /// Whether the archive contains a file with this basename
    fn has_file(&mut self, name: &str) -> Result<bool> {
        Ok(self.find_file(name)?.is_some())
    }

    /// Read a file by basename, case-insensitively
    fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .find_file(name)?
            .ok_or_else(|| QuireError::EntryNotFound(name.to_string()))?;
        self.read_entry(&entry.path)
    }
}

/// Open a container for the archive at `path`, sniffing the format
///
/// Magic bytes win over the extension: a `.cbz` that is really a RAR opens
/// as RAR. An unrecognizable file fails with `Format`.
pub fn open_container(path: &Path) -> Result<Box<dyn ArchiveContainer>> {
    let mut magic = [0u8; 8];
    let n = read_prefix(path, &mut magic)?;

    let kind = ArchiveKind::from_magic(&magic[..n]).or_else(|| {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(ArchiveKind::from_extension)
    });

    match kind {
        Some(ArchiveKind::Zip) => Ok(Box::new(ZipContainer::open(path)?)),
        Some(ArchiveKind::Rar) => Ok(Box::new(RarContainer::open(path)?)),
        None => Err(QuireError::Format(format!(
            "not a recognized archive: {}",
            path.display()
        ))),
    }
}

fn read_prefix(path: &Path, buf: &mut [u8]) -> Result<usize> {
    use std::io::Read;
    let mut file = std::fs::File::open(path)?;
    let mut read = 0;
    while read < buf.len() {
        let n = file.read(&mut buf[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(read)
}

/// Normalize an archive path to forward slashes
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Basename of an archive path
pub(crate) fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether an archive path names a displayable comic page image
///
/// Rejects directories, hidden files, and macOS resource-fork artifacts
/// ("__MACOSX" directories, "._" AppleDouble files).
pub(crate) fn is_page_image(path: &str) -> bool {
    if path.ends_with('/') {
        return false;
    }
    let normalized = normalize_path(path);
    for component in normalized.split('/') {
        if component.starts_with('.') || component == "__MACOSX" {
            return false;
        }
    }
    let name = basename(&normalized).to_ascii_lowercase();
    match name.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ArchiveKind::from_extension("cbz"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_extension("CBR"), Some(ArchiveKind::Rar));
        assert_eq!(ArchiveKind::from_extension("zip"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_extension("pdf"), None);
    }

    #[test]
    fn test_kind_from_magic() {
        assert_eq!(ArchiveKind::from_magic(b"PK\x03\x04...."), Some(ArchiveKind::Zip));
        assert_eq!(
            ArchiveKind::from_magic(b"Rar!\x1a\x07\x00"),
            Some(ArchiveKind::Rar)
        );
        assert_eq!(ArchiveKind::from_magic(b"%PDF-1.4"), None);
        assert_eq!(ArchiveKind::from_magic(b""), None);
    }

    #[test]
    fn test_is_page_image_filters() {
        assert!(is_page_image("001.jpg"));
        assert!(is_page_image("ch01/001.PNG"));
        assert!(is_page_image("a.webp"));
        assert!(!is_page_image("__MACOSX/001.jpg"));
        assert!(!is_page_image("ch01/._001.jpg"));
        assert!(!is_page_image(".hidden/001.jpg"));
        assert!(!is_page_image("ComicInfo.xml"));
        assert!(!is_page_image("pages/"));
        assert!(!is_page_image("noextension"));
    }

    #[test]
    fn test_basename_and_normalize() {
        assert_eq!(basename("a/b/c.jpg"), "c.jpg");
        assert_eq!(basename("c.jpg"), "c.jpg");
        assert_eq!(normalize_path("a\\b\\c.jpg"), "a/b/c.jpg");
    }

    #[test]
    fn test_open_container_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-archive.cbz");
        std::fs::write(&path, b"this is not an archive at all").unwrap();
        // Extension says ZIP, magic bytes disagree and the ZIP opener
        // rejects the payload.
        let result = open_container(&path);
        assert!(result.is_err());
    }
}
