//! Precedence policies
//!
//! The comic pipeline and acquisition flow both rely on fixed priority
//! orders (prefer the richer metadata schema, prefer epub over cbz over cbr
//! over pdf). Those orders live here as ordinary data so a deployment can
//! swap them without touching the pipelines that consume them.

use crate::comic::metadata::MetadataSchema;
use serde::{Deserialize, Serialize};

/// Ordering of comic metadata schemas, most authoritative first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataPrecedence {
    order: Vec<MetadataSchema>,
}

impl MetadataPrecedence {
    pub fn new(order: Vec<MetadataSchema>) -> Self {
        Self { order }
    }

    /// Schemas in precedence order
    pub fn order(&self) -> &[MetadataSchema] {
        &self.order
    }

    /// Pick the most authoritative schema among those that parsed
    pub fn select(&self, available: &[MetadataSchema]) -> Option<MetadataSchema> {
        self.order
            .iter()
            .copied()
            .find(|schema| available.contains(schema))
    }
}

impl Default for MetadataPrecedence {
    fn default() -> Self {
        Self::new(vec![MetadataSchema::ComicInfo, MetadataSchema::Comet])
    }
}

/// Ordering of acquisition formats, most preferred first
///
/// Used when a catalog offers the same publication in several formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatPriority {
    order: Vec<String>,
}

impl FormatPriority {
    pub fn new<S: Into<String>>(order: Vec<S>) -> Self {
        Self {
            order: order.into_iter().map(|s| s.into().to_ascii_lowercase()).collect(),
        }
    }

    /// Rank of a format extension; unknown formats rank last
    pub fn rank(&self, format: &str) -> usize {
        let format = format.to_ascii_lowercase();
        self.order
            .iter()
            .position(|f| *f == format)
            .unwrap_or(self.order.len())
    }

    /// Pick the best format among candidates, or None if empty
    pub fn best<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().min_by_key(|f| self.rank(f))
    }
}

impl Default for FormatPriority {
    fn default() -> Self {
        Self::new(vec!["epub", "cbz", "cbr", "pdf"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_precedence() {
        let precedence = MetadataPrecedence::default();
        assert_eq!(
            precedence.select(&[MetadataSchema::Comet, MetadataSchema::ComicInfo]),
            Some(MetadataSchema::ComicInfo)
        );
        assert_eq!(
            precedence.select(&[MetadataSchema::Comet]),
            Some(MetadataSchema::Comet)
        );
        assert_eq!(precedence.select(&[]), None);
    }

    #[test]
    fn test_custom_schema_precedence() {
        let precedence =
            MetadataPrecedence::new(vec![MetadataSchema::Comet, MetadataSchema::ComicInfo]);
        assert_eq!(
            precedence.select(&[MetadataSchema::Comet, MetadataSchema::ComicInfo]),
            Some(MetadataSchema::Comet)
        );
    }

    #[test]
    fn test_format_priority_best() {
        let priority = FormatPriority::default();
        assert_eq!(priority.best(&["pdf", "cbz"]), Some("cbz"));
        assert_eq!(priority.best(&["cbr", "epub"]), Some("epub"));
        assert_eq!(priority.best(&[]), None);
    }

    #[test]
    fn test_unknown_formats_rank_last() {
        let priority = FormatPriority::default();
        assert_eq!(priority.best(&["djvu", "pdf"]), Some("pdf"));
        assert_eq!(priority.rank("djvu"), 4);
    }

    #[test]
    fn test_format_priority_case_insensitive() {
        let priority = FormatPriority::default();
        assert_eq!(priority.best(&["PDF", "CBZ"]), Some("CBZ"));
    }
}
