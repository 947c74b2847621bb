//! Comic book record
//!
//! Built once when an archive is opened, from whichever metadata source is
//! canonical, and never mutated afterwards. Display getters consult the
//! canonical document first, the secondary document next, and fall back to
//! a sensible default.

use crate::comic::metadata::{ComicMetadata, MetadataSource};
use crate::comic::pages::{Page, PageType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reading direction of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// An opened comic book: canonical fields plus the ordered page sequence
#[derive(Debug, Clone)]
pub struct ComicBook {
    /// Fallback title when no metadata names the book (archive stem)
    fallback_title: String,
    metadata: ComicMetadata,
    pages: Vec<Page>,
}

impl ComicBook {
    /// Build a book from resolved metadata and built pages
    pub fn new(fallback_title: impl Into<String>, metadata: ComicMetadata, pages: Vec<Page>) -> Self {
        Self {
            fallback_title: fallback_title.into(),
            metadata,
            pages,
        }
    }

    /// Which metadata document is canonical for this book
    pub fn metadata_source(&self) -> MetadataSource {
        self.metadata.source
    }

    /// Both parsed documents, for downstream consumers
    pub fn metadata(&self) -> &ComicMetadata {
        &self.metadata
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// The page serving as the cover: first `FrontCover`, else page 0
    pub fn cover_page(&self) -> Option<&Page> {
        self.pages
            .iter()
            .find(|p| p.page_type == PageType::FrontCover)
            .or_else(|| self.pages.first())
    }

    /// Display title: canonical, then secondary, then the archive stem
    pub fn display_title(&self) -> String {
        self.first_string(
            |ci| ci.title.clone(),
            |cm| cm.title.clone(),
        )
        .unwrap_or_else(|| {
            if self.fallback_title.is_empty() {
                "Unknown".to_string()
            } else {
                self.fallback_title.clone()
            }
        })
    }

    pub fn series(&self) -> Option<String> {
        self.first_string(|ci| ci.series.clone(), |cm| cm.series.clone())
    }

    pub fn issue_number(&self) -> Option<String> {
        self.first_string(|ci| ci.number.clone(), |cm| cm.issue.clone())
    }

    pub fn volume(&self) -> Option<i32> {
        self.first_field(|ci| ci.volume, |cm| cm.volume)
    }

    pub fn summary(&self) -> Option<String> {
        self.first_string(|ci| ci.summary.clone(), |cm| cm.description.clone())
    }

    pub fn publisher(&self) -> Option<String> {
        self.first_string(|ci| ci.publisher.clone(), |cm| cm.publisher.clone())
    }

    pub fn writer(&self) -> Option<String> {
        self.first_string(|ci| ci.writer.clone(), |cm| cm.writer.clone())
    }

    pub fn language(&self) -> Option<String> {
        self.first_string(|ci| ci.language_iso.clone(), |cm| cm.language.clone())
    }

    pub fn genres(&self) -> Vec<String> {
        self.first_list(|ci| ci.genres(), |cm| cm.genres.clone())
    }

    pub fn tags(&self) -> Vec<String> {
        self.metadata
            .comic_info
            .as_ref()
            .map(|ci| ci.tag_list())
            .unwrap_or_default()
    }

    pub fn characters(&self) -> Vec<String> {
        self.first_list(|ci| ci.character_list(), |cm| cm.characters.clone())
    }

    /// Release date assembled from whichever source carries one
    pub fn release_date(&self) -> Option<NaiveDate> {
        if let Some(ci) = &self.metadata.comic_info {
            if self.metadata.source == MetadataSource::ComicInfo {
                if let Some(date) = comic_info_date(ci) {
                    return Some(date);
                }
            }
        }
        if let Some(cm) = &self.metadata.comet {
            if let Some(raw) = &cm.date {
                if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                    return Some(date);
                }
            }
        }
        self.metadata.comic_info.as_ref().and_then(comic_info_date)
    }

    pub fn reading_direction(&self) -> ReadingDirection {
        let rtl = match self.metadata.source {
            MetadataSource::ComicInfo => self
                .metadata
                .comic_info
                .as_ref()
                .map(|ci| ci.is_right_to_left())
                .unwrap_or(false),
            MetadataSource::Comet => self
                .metadata
                .comet
                .as_ref()
                .map(|cm| cm.is_right_to_left())
                .unwrap_or(false),
            MetadataSource::None => false,
        };
        if rtl {
            ReadingDirection::RightToLeft
        } else {
            ReadingDirection::LeftToRight
        }
    }

    pub fn is_manga(&self) -> bool {
        self.metadata
            .comic_info
            .as_ref()
            .map(|ci| ci.is_manga())
            .unwrap_or(false)
    }

    pub fn is_black_and_white(&self) -> bool {
        self.metadata
            .comic_info
            .as_ref()
            .map(|ci| ci.is_black_and_white())
            .unwrap_or(false)
    }

    fn first_list(
        &self,
        from_ci: impl Fn(&crate::comic::metadata::ComicInfo) -> Vec<String>,
        from_cm: impl Fn(&crate::comic::metadata::Comet) -> Vec<String>,
    ) -> Vec<String> {
        let ci = || self.metadata.comic_info.as_ref().map(&from_ci).unwrap_or_default();
        let cm = || self.metadata.comet.as_ref().map(&from_cm).unwrap_or_default();
        let (primary, secondary) = match self.metadata.source {
            MetadataSource::Comet => (cm(), ci()),
            _ => (ci(), cm()),
        };
        if primary.is_empty() {
            secondary
        } else {
            primary
        }
    }

    fn first_string(
        &self,
        from_ci: impl Fn(&crate::comic::metadata::ComicInfo) -> Option<String>,
        from_cm: impl Fn(&crate::comic::metadata::Comet) -> Option<String>,
    ) -> Option<String> {
        match self.metadata.source {
            MetadataSource::ComicInfo => self
                .metadata
                .comic_info
                .as_ref()
                .and_then(&from_ci)
                .or_else(|| self.metadata.comet.as_ref().and_then(&from_cm)),
            MetadataSource::Comet => self
                .metadata
                .comet
                .as_ref()
                .and_then(&from_cm)
                .or_else(|| self.metadata.comic_info.as_ref().and_then(&from_ci)),
            MetadataSource::None => None,
        }
    }

    fn first_field<T: Copy>(
        &self,
        from_ci: impl Fn(&crate::comic::metadata::ComicInfo) -> Option<T>,
        from_cm: impl Fn(&crate::comic::metadata::Comet) -> Option<T>,
    ) -> Option<T> {
        match self.metadata.source {
            MetadataSource::ComicInfo => self
                .metadata
                .comic_info
                .as_ref()
                .and_then(&from_ci)
                .or_else(|| self.metadata.comet.as_ref().and_then(&from_cm)),
            MetadataSource::Comet => self
                .metadata
                .comet
                .as_ref()
                .and_then(&from_cm)
                .or_else(|| self.metadata.comic_info.as_ref().and_then(&from_ci)),
            MetadataSource::None => None,
        }
    }
}

fn comic_info_date(ci: &crate::comic::metadata::ComicInfo) -> Option<NaiveDate> {
    let year = ci.year?;
    NaiveDate::from_ymd_opt(year, ci.month.unwrap_or(1), ci.day.unwrap_or(1))
}
