//! ZIP-backed archive container (CBZ)

use crate::archive::{normalize_path, ArchiveContainer, ArchiveEntry, ArchiveKind};
use crate::core::error::{QuireError, Result};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Container over a ZIP archive, from a file or an in-memory buffer
pub struct ZipContainer<R: Read + Seek = std::fs::File> {
    archive: ZipArchive<R>,
    source: String,
}

impl ZipContainer<std::fs::File> {
    /// Open a ZIP archive from a file path
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let archive = ZipArchive::new(file)
            .map_err(|e| map_zip_err(e, &path.display().to_string()))?;
        Ok(Self {
            archive,
            source: path.display().to_string(),
        })
    }
}

impl ZipContainer<Cursor<Vec<u8>>> {
    /// Open a ZIP archive from an in-memory buffer
    pub fn open_bytes(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| map_zip_err(e, "<memory>"))?;
        Ok(Self {
            archive,
            source: "<memory>".to_string(),
        })
    }
}

impl<R: Read + Seek + Send> ArchiveContainer for ZipContainer<R> {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Zip
    }

    fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            // Raw access skips decompression setup, so listing an archive
            // with encrypted members still succeeds.
            let file = self
                .archive
                .by_index_raw(index)
                .map_err(|e| map_zip_err(e, &self.source))?;
            if file.is_dir() {
                continue;
            }
            entries.push(ArchiveEntry {
                path: normalize_path(file.name()),
                size_bytes: file.size(),
            });
        }
        Ok(entries)
    }

    fn read_entry(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(QuireError::EntryNotFound(path.to_string()))
            }
            Err(e) => return Err(map_zip_err(e, path)),
        };
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| QuireError::Read(format!("{}: {}", path, e)))?;
        Ok(bytes)
    }
}

fn map_zip_err(err: ZipError, what: &str) -> QuireError {
    match err {
        ZipError::FileNotFound => QuireError::EntryNotFound(what.to_string()),
        ZipError::Io(e) => QuireError::Read(format!("{}: {}", what, e)),
        ZipError::InvalidArchive(msg) => QuireError::Format(format!("{}: {}", what, msg)),
        ZipError::UnsupportedArchive(msg) if msg.contains("Password") => {
            QuireError::Encrypted(what.to_string())
        }
        ZipError::UnsupportedArchive(msg) => {
            QuireError::UnsupportedCompression(format!("{}: {}", what, msg))
        }
        other => QuireError::Read(format!("{}: {}", what, other)),
    }
}

/// Build an in-memory ZIP archive for tests elsewhere in the crate
#[cfg(test)]
pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }
    buf
}
