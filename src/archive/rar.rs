//! RAR-backed archive container (CBR)
//!
//! The unrar library exposes sequential access only, so the container
//! keeps the archive path, lists headers eagerly at open time, and
//! re-opens the archive for each entry read. Encrypted archives are
//! rejected at open time; multi-volume continuation entries are reported
//! as non-extractable instead of yielding partial data.

use crate::archive::{normalize_path, ArchiveContainer, ArchiveEntry, ArchiveKind};
use crate::core::error::{QuireError, Result};
use std::path::{Path, PathBuf};
use unrar::error::{Code, UnrarError};
use unrar::Archive;

/// Container over a RAR archive on disk
pub struct RarContainer {
    path: PathBuf,
    entries: Vec<ArchiveEntry>,
    /// Entry paths that cannot be extracted standalone (volume splits)
    unextractable: Vec<String>,
}

impl RarContainer {
    /// Open a RAR archive from a file path
    ///
    /// Lists all file headers up front. Fails with `Encrypted` if the
    /// archive requires a password (either encrypted headers, which break
    /// listing, or encrypted file data flagged per entry) and with
    /// `Format` if the file is not a RAR archive.
    pub fn open(path: &Path) -> Result<Self> {
        let source = path.display().to_string();
        let listing = Archive::new(path)
            .open_for_listing()
            .map_err(|e| map_open_err(e, &source))?;

        let mut entries = Vec::new();
        let mut unextractable = Vec::new();
        for header in listing {
            let header = header.map_err(|e| map_open_err(e, &source))?;
            if !header.is_file() {
                continue;
            }
            if header.is_encrypted() {
                return Err(QuireError::Encrypted(source));
            }
            let entry_path = normalize_path(&header.filename.to_string_lossy());
            if header.is_split() {
                unextractable.push(entry_path.clone());
            }
            entries.push(ArchiveEntry {
                path: entry_path,
                size_bytes: header.unpacked_size as u64,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            unextractable,
        })
    }
}

impl ArchiveContainer for RarContainer {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Rar
    }

    fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        Ok(self.entries.clone())
    }

    fn can_extract(&mut self, path: &str) -> Result<bool> {
        if !self.entries.iter().any(|e| e.path == path) {
            return Err(QuireError::EntryNotFound(path.to_string()));
        }
        Ok(!self.unextractable.iter().any(|p| p == path))
    }

    fn read_entry(&mut self, path: &str) -> Result<Vec<u8>> {
        if !self.entries.iter().any(|e| e.path == path) {
            return Err(QuireError::EntryNotFound(path.to_string()));
        }
        if self.unextractable.iter().any(|p| p == path) {
            return Err(QuireError::UnsupportedCompression(format!(
                "{}: entry continues in another volume",
                path
            )));
        }

        let source = self.path.display().to_string();
        let mut archive = Archive::new(&self.path)
            .open_for_processing()
            .map_err(|e| map_read_err(e, &source))?;

        while let Some(header) = archive.read_header().map_err(|e| map_read_err(e, &source))? {
            let entry_path = normalize_path(&header.entry().filename.to_string_lossy());
            archive = if entry_path == path {
                let (bytes, _rest) = header.read().map_err(|e| map_read_err(e, path))?;
                return Ok(bytes);
            } else {
                header.skip().map_err(|e| map_read_err(e, &source))?
            };
        }

        // Listed at open time but gone on re-read: the file changed under us.
        Err(QuireError::Read(format!(
            "{}: entry disappeared from archive",
            path
        )))
    }
}

fn map_open_err(err: UnrarError, what: &str) -> QuireError {
    match err.code {
        Code::MissingPassword | Code::BadPassword => QuireError::Encrypted(what.to_string()),
        Code::BadArchive | Code::UnknownFormat => {
            QuireError::Format(format!("{}: {}", what, err))
        }
        _ => QuireError::Read(format!("{}: {}", what, err)),
    }
}

fn map_read_err(err: UnrarError, what: &str) -> QuireError {
    match err.code {
        Code::MissingPassword | Code::BadPassword => QuireError::Encrypted(what.to_string()),
        Code::UnknownFormat => {
            QuireError::UnsupportedCompression(format!("{}: {}", what, err))
        }
        _ => QuireError::Read(format!("{}: {}", what, err)),
    }
}
