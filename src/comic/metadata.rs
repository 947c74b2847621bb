//! Comic metadata schemas
//!
//! Two competing XML schemas can live inside one archive: `ComicInfo.xml`
//! (the richer, page-aware schema) and `CoMet.xml` (the simpler one).
//! Parse attempts are independent and non-fatal; a malformed document in
//! one schema never prevents falling back to the other or to "no
//! metadata". Which parsed schema becomes canonical is decided by the
//! `MetadataPrecedence` policy, not hard-coded here.

use crate::core::error::{QuireError, Result};
use lazy_static::lazy_static;
use quick_xml::de::from_str;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical filename of the richer schema (lookup is case-insensitive)
pub const COMIC_INFO_FILENAME: &str = "ComicInfo.xml";

/// Canonical filename of the simpler schema
pub const COMET_FILENAME: &str = "CoMet.xml";

/// A comic metadata schema, used in precedence ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSchema {
    ComicInfo,
    Comet,
}

/// Which metadata file produced the book's canonical fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    #[default]
    None,
    ComicInfo,
    Comet,
}

impl From<MetadataSchema> for MetadataSource {
    fn from(schema: MetadataSchema) -> Self {
        match schema {
            MetadataSchema::ComicInfo => MetadataSource::ComicInfo,
            MetadataSchema::Comet => MetadataSource::Comet,
        }
    }
}

/// ComicInfo.xml document (ComicRack schema)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename = "ComicInfo")]
pub struct ComicInfo {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Series")]
    pub series: Option<String>,
    #[serde(rename = "Number")]
    pub number: Option<String>,
    #[serde(rename = "Volume")]
    pub volume: Option<i32>,
    #[serde(rename = "Summary")]
    pub summary: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Month")]
    pub month: Option<u32>,
    #[serde(rename = "Day")]
    pub day: Option<u32>,
    #[serde(rename = "Writer")]
    pub writer: Option<String>,
    #[serde(rename = "Publisher")]
    pub publisher: Option<String>,
    #[serde(rename = "Genre")]
    pub genre: Option<String>,
    #[serde(rename = "Tags")]
    pub tags: Option<String>,
    #[serde(rename = "Characters")]
    pub characters: Option<String>,
    #[serde(rename = "LanguageISO")]
    pub language_iso: Option<String>,
    #[serde(rename = "PageCount")]
    pub page_count: Option<u32>,
    #[serde(rename = "BlackAndWhite")]
    pub black_and_white: Option<String>,
    #[serde(rename = "Manga")]
    pub manga: Option<String>,
    #[serde(rename = "Pages")]
    pub pages: Option<ComicInfoPages>,
}

/// Wrapper element for per-page records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComicInfoPages {
    #[serde(default, rename = "Page")]
    pub pages: Vec<ComicInfoPage>,
}

/// One `<Page ...>` record; all data is carried in attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComicInfoPage {
    #[serde(rename = "@Image")]
    pub image: Option<u32>,
    #[serde(rename = "@Type")]
    pub page_type: Option<String>,
    #[serde(rename = "@DoublePage")]
    pub double_page: Option<bool>,
    #[serde(rename = "@ImageWidth")]
    pub image_width: Option<u32>,
    #[serde(rename = "@ImageHeight")]
    pub image_height: Option<u32>,
    #[serde(rename = "@ImageSize")]
    pub image_size: Option<u64>,
    #[serde(rename = "@Bookmark")]
    pub bookmark: Option<String>,
}

impl ComicInfo {
    /// `Manga` values of `Yes` and `YesAndRightToLeft` mark a manga
    pub fn is_manga(&self) -> bool {
        matches!(
            self.manga.as_deref(),
            Some("Yes") | Some("YesAndRightToLeft")
        )
    }

    /// Only `YesAndRightToLeft` switches the reading direction
    pub fn is_right_to_left(&self) -> bool {
        self.manga.as_deref() == Some("YesAndRightToLeft")
    }

    pub fn is_black_and_white(&self) -> bool {
        self.black_and_white.as_deref() == Some("Yes")
    }

    /// Issue number normalized to its numeric part, if any
    ///
    /// `Number` is free-form in the wild ("3", "3.5", "3a"); the leading
    /// numeric run is what sorting and display care about.
    pub fn issue_number(&self) -> Option<f64> {
        lazy_static! {
            static ref NUMERIC: Regex = Regex::new(r"^\s*(\d+(?:\.\d+)?)").unwrap();
        }
        let raw = self.number.as_deref()?;
        let captures = NUMERIC.captures(raw)?;
        captures.get(1)?.as_str().parse().ok()
    }

    /// Split a comma-separated list field into trimmed values
    fn split_list(value: &Option<String>) -> Vec<String> {
        value
            .as_deref()
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn genres(&self) -> Vec<String> {
        Self::split_list(&self.genre)
    }

    pub fn tag_list(&self) -> Vec<String> {
        Self::split_list(&self.tags)
    }

    pub fn character_list(&self) -> Vec<String> {
        Self::split_list(&self.characters)
    }
}

/// CoMet.xml document (denvog schema)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename = "comet")]
pub struct Comet {
    pub title: Option<String>,
    pub series: Option<String>,
    pub issue: Option<String>,
    pub volume: Option<i32>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub writer: Option<String>,
    pub date: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "readingDirection")]
    pub reading_direction: Option<String>,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<String>,
    #[serde(rename = "genre")]
    pub genres: Vec<String>,
    #[serde(rename = "character")]
    pub characters: Vec<String>,
}

impl Comet {
    pub fn is_right_to_left(&self) -> bool {
        self.reading_direction.as_deref() == Some("rtl")
    }
}

/// Parse a ComicInfo.xml document
pub fn parse_comic_info(bytes: &[u8]) -> Result<ComicInfo> {
    let text = decode_xml(bytes);
    from_str(&text).map_err(|e| QuireError::Format(format!("ComicInfo.xml: {}", e)))
}

/// Parse a CoMet.xml document
pub fn parse_comet(bytes: &[u8]) -> Result<Comet> {
    let text = decode_xml(bytes);
    from_str(&text).map_err(|e| QuireError::Format(format!("CoMet.xml: {}", e)))
}

/// Lossy UTF-8 with BOM stripping: tolerate sloppy taggers
fn decode_xml(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Both parsed documents plus the canonical source selection
///
/// At most one source is canonical; the other document, if present, is
/// retained as a secondary reference for downstream consumers.
#[derive(Debug, Clone, Default)]
pub struct ComicMetadata {
    pub comic_info: Option<ComicInfo>,
    pub comet: Option<Comet>,
    pub source: MetadataSource,
}

impl ComicMetadata {
    /// Combine independent parse results under a precedence policy
    pub fn resolve(
        comic_info: Option<ComicInfo>,
        comet: Option<Comet>,
        precedence: &crate::core::policy::MetadataPrecedence,
    ) -> Self {
        let mut available = Vec::new();
        if comic_info.is_some() {
            available.push(MetadataSchema::ComicInfo);
        }
        if comet.is_some() {
            available.push(MetadataSchema::Comet);
        }
        let source = precedence
            .select(&available)
            .map(MetadataSource::from)
            .unwrap_or(MetadataSource::None);
        Self {
            comic_info,
            comet,
            source,
        }
    }
}
