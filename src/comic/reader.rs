//! Comic reading session
//!
//! Owns one open container and the book built from it. Page bytes are
//! cached by index on first read and dropped on `clear_cache` or
//! disposal. The session is a state machine: created with the book
//! parsed, open while serving reads, and terminally disposed. Every
//! read after `dispose()` fails with `AlreadyDisposed`.

use crate::archive::{open_container, ArchiveContainer};
use crate::comic::book::{ComicBook, ReadingDirection};
use crate::comic::metadata::{
    parse_comet, parse_comic_info, ComicMetadata, COMET_FILENAME, COMIC_INFO_FILENAME,
};
use crate::comic::pages::{PageBuildOptions, PageMetadataApplicator, PageOrderBuilder};
use crate::core::error::{QuireError, Result};
use crate::core::policy::MetadataPrecedence;
use crate::media::thumbnail::{ThumbnailGenerator, ThumbnailPreset};
use crate::plugin::reader::{BookMetadata, ReaderController, ReadingLocation};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Options controlling how a comic archive is opened
#[derive(Debug, Clone, Default)]
pub struct ComicOpenOptions {
    pub pages: PageBuildOptions,
    pub precedence: MetadataPrecedence,
}

/// An open comic archive serving page reads
pub struct ComicReaderSession {
    session_id: Uuid,
    book: ComicBook,
    container: Mutex<Option<Box<dyn ArchiveContainer>>>,
    page_cache: Mutex<HashMap<usize, Vec<u8>>>,
    current_page: AtomicUsize,
    disposed: AtomicBool,
    thumbnailer: ThumbnailGenerator,
}

impl ComicReaderSession {
    /// Open the archive at `path`
    ///
    /// Fatal failures: the archive cannot be opened, or the page list
    /// cannot be built. Metadata parse failures are not fatal; the book
    /// degrades to pages-only with `MetadataSource::None`.
    pub async fn open(path: &Path, options: ComicOpenOptions) -> Result<Self> {
        let path = path.to_path_buf();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        tokio::task::spawn_blocking(move || {
            let container = open_container(&path)?;
            Self::from_container(container, stem, options)
        })
        .await
        .map_err(|e| QuireError::Read(format!("open task failed: {}", e)))?
    }

    /// Build a session from an already opened container
    pub fn from_container(
        mut container: Box<dyn ArchiveContainer>,
        fallback_title: String,
        options: ComicOpenOptions,
    ) -> Result<Self> {
        let comic_info = match container.read_file(COMIC_INFO_FILENAME) {
            Ok(bytes) => match parse_comic_info(&bytes) {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::warn!(error = %e, "ComicInfo.xml present but unparsable");
                    None
                }
            },
            Err(QuireError::EntryNotFound(_)) => None,
            Err(e) => {
                tracing::warn!(error = %e, "ComicInfo.xml unreadable");
                None
            }
        };
        let comet = match container.read_file(COMET_FILENAME) {
            Ok(bytes) => match parse_comet(&bytes) {
                Ok(comet) => Some(comet),
                Err(e) => {
                    tracing::warn!(error = %e, "CoMet.xml present but unparsable");
                    None
                }
            },
            Err(QuireError::EntryNotFound(_)) => None,
            Err(e) => {
                tracing::warn!(error = %e, "CoMet.xml unreadable");
                None
            }
        };

        let metadata = ComicMetadata::resolve(comic_info, comet, &options.precedence);

        let mut pages = PageOrderBuilder::build(container.as_mut(), options.pages)?;
        if let Some(info) = &metadata.comic_info {
            if let Some(records) = &info.pages {
                PageMetadataApplicator::apply(&mut pages, &records.pages);
            }
        }

        let book = ComicBook::new(fallback_title, metadata, pages);

        Ok(Self {
            session_id: Uuid::new_v4(),
            book,
            container: Mutex::new(Some(container)),
            page_cache: Mutex::new(HashMap::new()),
            current_page: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
            thumbnailer: ThumbnailGenerator::new(),
        })
    }

    pub fn book(&self) -> &ComicBook {
        &self.book
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn ensure_open(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(QuireError::AlreadyDisposed(self.session_id.to_string()));
        }
        Ok(())
    }

    fn location_at(&self, index: usize) -> ReadingLocation {
        ReadingLocation {
            page_index: index,
            page_count: self.book.page_count(),
        }
    }

    fn read_page_bytes(&self, index: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;

        if let Some(bytes) = self.page_cache.lock().expect("cache poisoned").get(&index) {
            return Ok(bytes.clone());
        }

        let page = self
            .book
            .page(index)
            .ok_or_else(|| QuireError::EntryNotFound(format!("page {}", index)))?
            .clone();

        let mut guard = self.container.lock().expect("container poisoned");
        let container = guard
            .as_mut()
            .ok_or_else(|| QuireError::AlreadyDisposed(self.session_id.to_string()))?;
        let bytes = container.read_entry(&page.archive_path)?;
        drop(guard);

        self.page_cache
            .lock()
            .expect("cache poisoned")
            .insert(index, bytes.clone());
        Ok(bytes)
    }
}

#[async_trait]
impl ReaderController for ComicReaderSession {
    fn metadata(&self) -> BookMetadata {
        book_metadata(&self.book)
    }

    fn page_count(&self) -> usize {
        self.book.page_count()
    }

    fn location(&self) -> Result<ReadingLocation> {
        self.ensure_open()?;
        Ok(self.location_at(self.current_page.load(Ordering::SeqCst)))
    }

    fn go_to_page(&self, index: usize) -> Result<ReadingLocation> {
        self.ensure_open()?;
        if index >= self.book.page_count() {
            return Err(QuireError::EntryNotFound(format!("page {}", index)));
        }
        self.current_page.store(index, Ordering::SeqCst);
        Ok(self.location_at(index))
    }

    fn next_page(&self) -> Result<ReadingLocation> {
        self.ensure_open()?;
        let last = self.book.page_count().saturating_sub(1);
        let index = self
            .current_page
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(1).min(last))
            })
            .unwrap_or(0)
            .saturating_add(1)
            .min(last);
        Ok(self.location_at(index))
    }

    fn previous_page(&self) -> Result<ReadingLocation> {
        self.ensure_open()?;
        let index = self
            .current_page
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_sub(1))
            })
            .unwrap_or(0)
            .saturating_sub(1);
        Ok(self.location_at(index))
    }

    fn go_to_chapter(&self, name: &str) -> Result<ReadingLocation> {
        self.ensure_open()?;
        let index = self
            .book
            .pages()
            .iter()
            .find(|p| {
                p.bookmark
                    .as_deref()
                    .map(|b| b.eq_ignore_ascii_case(name))
                    .unwrap_or(false)
            })
            .map(|p| p.index)
            .ok_or_else(|| QuireError::EntryNotFound(format!("chapter '{}'", name)))?;
        self.current_page.store(index, Ordering::SeqCst);
        Ok(self.location_at(index))
    }

    async fn page_bytes(&self, index: usize) -> Result<Vec<u8>> {
        self.read_page_bytes(index)
    }

    async fn cover_bytes(&self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let cover = self
            .book
            .cover_page()
            .ok_or_else(|| QuireError::EntryNotFound("cover page".into()))?;
        self.read_page_bytes(cover.index)
    }

    async fn thumbnail(&self, index: usize, preset: ThumbnailPreset) -> Result<Vec<u8>> {
        let bytes = self.read_page_bytes(index)?;
        self.thumbnailer.generate_preset(bytes, preset).await
    }

    fn clear_cache(&self) -> Result<()> {
        self.ensure_open()?;
        self.page_cache.lock().expect("cache poisoned").clear();
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.page_cache.lock().expect("cache poisoned").clear();
        // Dropping the container releases the underlying file handle.
        self.container.lock().expect("container poisoned").take();
        tracing::debug!(session = %self.session_id, "reader session disposed");
        Ok(())
    }
}

/// Project the comic book onto the format-independent metadata record
pub fn book_metadata(book: &ComicBook) -> BookMetadata {
    BookMetadata {
        title: book.display_title(),
        series: book.series(),
        issue_number: book.issue_number(),
        volume: book.volume(),
        summary: book.summary(),
        publisher: book.publisher(),
        author: book.writer(),
        language: book.language(),
        release_date: book.release_date().map(|d| d.to_string()),
        genres: book.genres(),
        tags: book.tags(),
        page_count: Some(book.page_count() as u32),
        right_to_left: book.reading_direction() == ReadingDirection::RightToLeft,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::zip::{build_zip, ZipContainer};
    use crate::comic::metadata::MetadataSource;
    use crate::media::dimensions::png_header;

    fn session_from(entries: &[(&str, &[u8])]) -> ComicReaderSession {
        let container = ZipContainer::open_bytes(build_zip(entries)).unwrap();
        ComicReaderSession::from_container(
            Box::new(container),
            "Fixture Comic".into(),
            ComicOpenOptions::default(),
        )
        .unwrap()
    }

    fn three_pages() -> ComicReaderSession {
        session_from(&[
            ("002.jpg", b"\xFF\xD8\xFF\x02"),
            ("001.jpg", b"\xFF\xD8\xFF\x01"),
            ("cover.jpg", b"\xFF\xD8\xFF\x03"),
        ])
    }

    #[test]
    fn test_open_without_metadata_builds_from_pages() {
        let session = three_pages();
        let book = session.book();

        assert_eq!(book.page_count(), 3);
        assert_eq!(book.metadata_source(), MetadataSource::None);
        assert_eq!(book.pages()[0].filename, "001.jpg");
        assert_eq!(book.pages()[1].filename, "002.jpg");
        assert_eq!(book.pages()[2].filename, "cover.jpg");
        assert_eq!(book.display_title(), "Fixture Comic");
    }

    #[test]
    fn test_open_with_comic_info_applies_pages() {
        let xml = br#"<ComicInfo>
  <Title>Named</Title>
  <Pages>
    <Page Image="2" Type="BackCover" Bookmark="Epilogue" />
  </Pages>
</ComicInfo>"#;
        let session = session_from(&[
            ("001.jpg", b"\xFF\xD8\xFF\x01"),
            ("002.jpg", b"\xFF\xD8\xFF\x02"),
            ("003.jpg", b"\xFF\xD8\xFF\x03"),
            ("ComicInfo.xml", xml),
        ]);
        let book = session.book();

        assert_eq!(book.metadata_source(), MetadataSource::ComicInfo);
        assert_eq!(book.display_title(), "Named");
        assert_eq!(
            book.pages()[2].page_type,
            crate::comic::pages::PageType::BackCover
        );
        assert_eq!(book.pages()[2].bookmark.as_deref(), Some("Epilogue"));
        // Metadata files never count as pages
        assert_eq!(book.page_count(), 3);
    }

    #[test]
    fn test_malformed_metadata_degrades_to_none() {
        let session = session_from(&[
            ("001.jpg", b"\xFF\xD8\xFF\x01"),
            ("ComicInfo.xml", b"<ComicInfo><Title>broken"),
        ]);
        assert_eq!(session.book().metadata_source(), MetadataSource::None);
        assert_eq!(session.book().page_count(), 1);
    }

    #[tokio::test]
    async fn test_page_reads_and_cache() {
        let session = three_pages();

        let first = session.page_bytes(0).await.unwrap();
        assert_eq!(first, b"\xFF\xD8\xFF\x01");

        // Cached read returns identical bytes
        let again = session.page_bytes(0).await.unwrap();
        assert_eq!(first, again);

        session.clear_cache().unwrap();
        let after_clear = session.page_bytes(0).await.unwrap();
        assert_eq!(first, after_clear);

        assert!(session.page_bytes(9).await.is_err());
    }

    #[tokio::test]
    async fn test_cover_prefers_front_cover_page() {
        // No metadata: first page by natural order is the cover
        let session = three_pages();
        assert_eq!(session.cover_bytes().await.unwrap(), b"\xFF\xD8\xFF\x01");

        // Metadata moves the front cover elsewhere
        let xml = br#"<ComicInfo><Pages><Page Image="2" Type="FrontCover"/><Page Image="0" Type="Story"/></Pages></ComicInfo>"#;
        let session = session_from(&[
            ("001.jpg", b"\xFF\xD8\xFF\x01"),
            ("002.jpg", b"\xFF\xD8\xFF\x02"),
            ("003.jpg", b"\xFF\xD8\xFF\x03"),
            ("ComicInfo.xml", xml),
        ]);
        assert_eq!(session.cover_bytes().await.unwrap(), b"\xFF\xD8\xFF\x03");
    }

    #[test]
    fn test_navigation() {
        let session = three_pages();

        assert_eq!(session.location().unwrap().page_index, 0);
        assert_eq!(session.next_page().unwrap().page_index, 1);
        assert_eq!(session.next_page().unwrap().page_index, 2);
        // Saturates at the last page
        assert_eq!(session.next_page().unwrap().page_index, 2);
        assert_eq!(session.previous_page().unwrap().page_index, 1);
        assert_eq!(session.go_to_page(0).unwrap().page_index, 0);
        assert!(session.go_to_page(7).is_err());
    }

    #[test]
    fn test_chapter_navigation_by_bookmark() {
        let xml = br#"<ComicInfo><Pages><Page Image="1" Bookmark="Chapter 2"/></Pages></ComicInfo>"#;
        let session = session_from(&[
            ("001.jpg", b"\xFF\xD8\xFF\x01"),
            ("002.jpg", b"\xFF\xD8\xFF\x02"),
            ("ComicInfo.xml", xml),
        ]);

        assert_eq!(session.go_to_chapter("chapter 2").unwrap().page_index, 1);
        assert!(session.go_to_chapter("missing").is_err());
    }

    #[tokio::test]
    async fn test_dispose_is_terminal_and_idempotent() {
        let session = three_pages();
        session.page_bytes(0).await.unwrap();

        session.dispose().await.unwrap();
        session.dispose().await.unwrap();

        assert!(matches!(
            session.page_bytes(0).await,
            Err(QuireError::AlreadyDisposed(_))
        ));
        assert!(matches!(
            session.cover_bytes().await,
            Err(QuireError::AlreadyDisposed(_))
        ));
        assert!(matches!(session.location(), Err(QuireError::AlreadyDisposed(_))));
        assert!(matches!(session.clear_cache(), Err(QuireError::AlreadyDisposed(_))));
        assert!(matches!(
            session.go_to_page(0),
            Err(QuireError::AlreadyDisposed(_))
        ));
    }

    #[tokio::test]
    async fn test_thumbnail_from_page() {
        let png = {
            // A real decodable PNG page
            let img = image::RgbImage::from_pixel(64, 96, image::Rgb([10, 20, 30]));
            let mut buf = std::io::Cursor::new(Vec::new());
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut buf, image::ImageFormat::Png)
                .unwrap();
            buf.into_inner()
        };
        let session = session_from(&[("001.png", &png)]);

        let thumb = session
            .thumbnail(0, ThumbnailPreset::Small)
            .await
            .unwrap();
        assert!(!thumb.is_empty());

        let dims = crate::media::dimensions::dimensions_of(&thumb, true)
            .unwrap()
            .unwrap();
        assert!(dims.width <= 120);
        assert!(dims.height <= 180);
    }

    #[test]
    fn test_dimensions_probed_via_options() {
        let png = png_header(400, 600);
        let container =
            ZipContainer::open_bytes(build_zip(&[("001.png", &png)])).unwrap();
        let options = ComicOpenOptions {
            pages: PageBuildOptions {
                read_dimensions: true,
                full_decode_fallback: false,
            },
            precedence: MetadataPrecedence::default(),
        };
        let session =
            ComicReaderSession::from_container(Box::new(container), "t".into(), options).unwrap();
        assert_eq!(session.book().pages()[0].width, Some(400));
        assert_eq!(session.book().pages()[0].height, Some(600));
    }

    #[test]
    fn test_book_metadata_projection() {
        let xml = br#"<ComicInfo>
  <Title>Projected</Title>
  <Series>S</Series>
  <Number>4</Number>
  <Manga>YesAndRightToLeft</Manga>
</ComicInfo>"#;
        let session = session_from(&[("001.jpg", b"\xFF\xD8\xFF\x01"), ("ComicInfo.xml", xml)]);
        let metadata = session.metadata();

        assert_eq!(metadata.title, "Projected");
        assert_eq!(metadata.series.as_deref(), Some("S"));
        assert_eq!(metadata.issue_number.as_deref(), Some("4"));
        assert!(metadata.right_to_left);
        assert_eq!(metadata.page_count, Some(1));
    }
}
