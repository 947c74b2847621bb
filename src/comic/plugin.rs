//! The comic archive reader plugin
//!
//! Wraps the CBZ/CBR pipeline behind the reader capability so the
//! registry can dispatch comic archives to it like any other format.

use crate::archive::ArchiveKind;
use crate::comic::reader::{ComicOpenOptions, ComicReaderSession};
use crate::core::error::{QuireError, Result};
use crate::core::policy::MetadataPrecedence;
use crate::plugin::context::PluginContext;
use crate::plugin::reader::{BookMetadata, ReaderCapability, ReaderController};
use crate::plugin::types::{CapabilitySet, CapabilityTag, Plugin, PluginIdentity};
use async_trait::async_trait;
use std::path::Path;
use std::sync::OnceLock;

const EXTENSIONS: &[&str] = &["cbz", "cbr"];

const MIME_TYPES: &[&str] = &[
    "application/vnd.comicbook+zip",
    "application/vnd.comicbook-rar",
    "application/x-cbz",
    "application/x-cbr",
];

/// Comic archive reader plugin (CBZ, CBR)
pub struct ComicReaderPlugin {
    identity: PluginIdentity,
    precedence: MetadataPrecedence,
    context: OnceLock<PluginContext>,
}

impl ComicReaderPlugin {
    pub fn new() -> Self {
        Self::with_precedence(MetadataPrecedence::default())
    }

    /// Plugin with a deployment-specific metadata schema ordering
    pub fn with_precedence(precedence: MetadataPrecedence) -> Self {
        Self {
            identity: PluginIdentity::new(
                "app.quire.comic",
                "Comic Archives",
                "Reads CBZ and CBR comic book archives",
                env!("CARGO_PKG_VERSION"),
            ),
            precedence,
            context: OnceLock::new(),
        }
    }

    fn open_options(&self) -> ComicOpenOptions {
        ComicOpenOptions {
            pages: Default::default(),
            precedence: self.precedence.clone(),
        }
    }
}

impl Default for ComicReaderPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for ComicReaderPlugin {
    fn identity(&self) -> &PluginIdentity {
        &self.identity
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new([CapabilityTag::Reader])
    }

    async fn initialize(&self, context: &PluginContext) -> Result<()> {
        context
            .logger
            .info(&format!("comic reader ready on {}", context.app.platform));
        let _ = self.context.set(context.clone());
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        if let Some(context) = self.context.get() {
            context.logger.info("comic reader disposed");
        }
        Ok(())
    }

    fn as_reader(&self) -> Option<&dyn ReaderCapability> {
        Some(self)
    }
}

#[async_trait]
impl ReaderCapability for ComicReaderPlugin {
    fn supported_extensions(&self) -> &[&str] {
        EXTENSIONS
    }

    fn supported_mime_types(&self) -> &[&str] {
        MIME_TYPES
    }

    async fn can_handle_file(&self, path: &Path) -> Result<bool> {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return Ok(false);
        };
        if !EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
            return Ok(false);
        }

        // Sniff the signature; extensions lie often enough to matter.
        use tokio::io::AsyncReadExt;
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(_) => return Ok(false),
        };
        let mut magic = [0u8; 8];
        let n = file.read(&mut magic).await?;
        Ok(ArchiveKind::from_magic(&magic[..n]).is_some())
    }

    async fn parse_metadata(&self, path: &Path) -> Result<BookMetadata> {
        let session = ComicReaderSession::open(path, self.open_options()).await?;
        let metadata = session.metadata();
        session.dispose().await?;
        Ok(metadata)
    }

    async fn open_book(&self, path: &Path) -> Result<Box<dyn ReaderController>> {
        let session = ComicReaderSession::open(path, self.open_options()).await?;
        Ok(Box::new(session))
    }

    async fn extract_cover(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let session = ComicReaderSession::open(path, self.open_options()).await?;
        let cover = match session.cover_bytes().await {
            Ok(bytes) => Some(bytes),
            Err(QuireError::EntryNotFound(_)) => None,
            Err(e) => {
                session.dispose().await?;
                return Err(e);
            }
        };
        session.dispose().await?;
        Ok(cover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::zip::build_zip;
    use crate::plugin::context::ContextFactory;
    use crate::plugin::registry::PluginRegistry;
    use crate::plugin::storage::{MemoryStorageFactory, StorageFactory};
    use std::sync::Arc;

    struct BareContextFactory;

    #[async_trait]
    impl ContextFactory for BareContextFactory {
        async fn create(
            &self,
            plugin_id: &str,
            storage: Arc<dyn crate::plugin::storage::PluginStorage>,
        ) -> crate::core::error::Result<PluginContext> {
            Ok(PluginContext {
                storage,
                http: reqwest::Client::new(),
                logger: crate::plugin::logger::TracingPluginLogger::new(plugin_id),
                app: crate::plugin::context::AppInfo {
                    app_version: "0.0.0".into(),
                    platform: "test".into(),
                    locale: "en-US".into(),
                    is_dark_mode: false,
                },
                data_dir: std::env::temp_dir(),
                download_dir: std::env::temp_dir(),
            })
        }
    }

    fn write_cbz(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, build_zip(entries)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_can_handle_checks_content() {
        let tmp = tempfile::tempdir().unwrap();
        let plugin = ComicReaderPlugin::new();

        let real = write_cbz(tmp.path(), "real.cbz", &[("001.jpg", b"\xFF\xD8\xFFx")]);
        assert!(plugin.can_handle_file(&real).await.unwrap());

        // Right extension, wrong content
        let fake = tmp.path().join("fake.cbz");
        std::fs::write(&fake, b"plain text").unwrap();
        assert!(!plugin.can_handle_file(&fake).await.unwrap());

        // Wrong extension is rejected before any I/O
        assert!(!plugin
            .can_handle_file(Path::new("/books/book.epub"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_end_to_end_open_through_registry() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = write_cbz(
            tmp.path(),
            "issue.cbz",
            &[
                ("002.jpg", b"\xFF\xD8\xFF\x02"),
                ("001.jpg", b"\xFF\xD8\xFF\x01"),
                ("cover.jpg", b"\xFF\xD8\xFF\x03"),
            ],
        );

        let registry = PluginRegistry::new();
        let storage = MemoryStorageFactory::with_passphrase("test");
        registry
            .register(Arc::new(ComicReaderPlugin::new()), &storage, &BareContextFactory)
            .await
            .unwrap();

        let plugin = registry.for_file(&archive).await.expect("plugin found");
        let reader = plugin.as_reader().expect("reader capability");

        let controller = reader.open_book(&archive).await.unwrap();
        assert_eq!(controller.page_count(), 3);

        let metadata = controller.metadata();
        assert_eq!(metadata.title, "issue");

        let first = controller.page_bytes(0).await.unwrap();
        assert_eq!(first, b"\xFF\xD8\xFF\x01");

        controller.dispose().await.unwrap();
        assert!(controller.page_bytes(0).await.is_err());
    }

    #[tokio::test]
    async fn test_mime_dispatch() {
        let registry = PluginRegistry::new();
        let storage = MemoryStorageFactory::with_passphrase("test");
        registry
            .register(Arc::new(ComicReaderPlugin::new()), &storage, &BareContextFactory)
            .await
            .unwrap();

        assert!(registry
            .for_mime_type(CapabilityTag::Reader, "application/vnd.comicbook+zip")
            .is_some());
        assert!(registry
            .for_mime_type(CapabilityTag::Reader, "application/pdf")
            .is_none());
    }

    #[tokio::test]
    async fn test_parse_metadata_without_open_session() {
        let tmp = tempfile::tempdir().unwrap();
        let xml = br#"<ComicInfo><Title>Standalone</Title><Series>Meta</Series></ComicInfo>"#;
        let archive = write_cbz(
            tmp.path(),
            "meta.cbz",
            &[("001.jpg", b"\xFF\xD8\xFF\x01"), ("ComicInfo.xml", xml)],
        );

        let plugin = ComicReaderPlugin::new();
        let metadata = plugin.parse_metadata(&archive).await.unwrap();
        assert_eq!(metadata.title, "Standalone");
        assert_eq!(metadata.series.as_deref(), Some("Meta"));
    }

    #[tokio::test]
    async fn test_extract_cover() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = write_cbz(
            tmp.path(),
            "cover.cbz",
            &[("001.jpg", b"\xFF\xD8\xFF\x01"), ("002.jpg", b"\xFF\xD8\xFF\x02")],
        );

        let plugin = ComicReaderPlugin::new();
        let cover = plugin.extract_cover(&archive).await.unwrap();
        assert_eq!(cover, Some(b"\xFF\xD8\xFF\x01".to_vec()));
    }

    #[tokio::test]
    async fn test_open_rejects_garbage_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.cbz");
        std::fs::write(&path, b"not an archive").unwrap();

        let plugin = ComicReaderPlugin::new();
        let result = plugin.open_book(&path).await;
        assert!(result.is_err());
    }
}
