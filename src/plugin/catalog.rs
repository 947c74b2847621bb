//! Catalog browsing capability
//!
//! The contract for plugins that browse and download from remote catalog
//! sources (OPDS, WebDAV, vendor APIs). The protocol clients themselves
//! live outside this core; this module defines the capability surface and
//! a streaming download helper implementations can share.
//!
//! Methods that a given source cannot support ship defaults that fail with
//! `UnsupportedOperation`, never silent absence: callers attempt-and-catch
//! instead of reflecting over the plugin.

use crate::core::error::{QuireError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Progress callback for long-running transfers (0.0 to 1.0)
pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;

/// Features a catalog source can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogFeature {
    Browse,
    Search,
    Download,
    Pagination,
    Authentication,
    ProgressSync,
}

/// A configured catalog source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    /// Host-assigned catalog id (secondary key for credentials)
    pub id: String,

    /// Display name
    pub name: String,

    /// Server base URL
    pub url: String,

    /// Source kind discriminator, plugin-defined (e.g. "opds", "webdav")
    pub kind: String,
}

/// Outcome of validating a catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,

    #[serde(default)]
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }
}

/// One entry in a browse listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Identifier on the source (path, id, or href)
    pub id: String,

    pub title: String,

    /// Directory-like entries can be browsed into
    pub is_container: bool,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub cover_url: Option<String>,

    /// Acquisition formats offered, lowercase extensions
    #[serde(default)]
    pub formats: Vec<String>,

    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// A page of browse or search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseResult {
    pub entries: Vec<CatalogEntry>,

    /// Current page (1-indexed) when the source paginates
    #[serde(default)]
    pub page: Option<u32>,

    /// Total entries available, when the source reports it
    #[serde(default)]
    pub total: Option<u64>,

    /// Whether another page exists
    #[serde(default)]
    pub has_more: bool,
}

/// Catalog browsing capability
#[async_trait]
pub trait CatalogBrowsingCapability: Send + Sync {
    /// Features this source supports
    fn features(&self) -> &[CatalogFeature];

    /// Whether this plugin can serve the given catalog configuration
    async fn can_handle_catalog(&self, catalog: &CatalogInfo) -> Result<bool>;

    /// Validate a catalog configuration (URL shape, reachability, ...)
    async fn validate(&self, catalog: &CatalogInfo) -> Result<ValidationResult>;

    /// Browse a catalog path; `None` browses the root
    async fn browse(
        &self,
        catalog: &CatalogInfo,
        path: Option<&str>,
        page: Option<u32>,
    ) -> Result<BrowseResult>;

    /// Search the catalog
    async fn search(
        &self,
        _catalog: &CatalogInfo,
        _query: &str,
        _page: Option<u32>,
    ) -> Result<BrowseResult> {
        Err(QuireError::UnsupportedOperation("catalog search".into()))
    }

    /// Download a catalog file to a local path
    async fn download(
        &self,
        catalog: &CatalogInfo,
        entry: &CatalogEntry,
        local_path: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<()>;
}

/// Validate that a catalog URL parses and uses an http(s) scheme
pub fn validate_catalog_url(catalog: &CatalogInfo) -> ValidationResult {
    match url::Url::parse(&catalog.url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
            ValidationResult::valid()
        }
        Ok(parsed) => ValidationResult::invalid(vec![format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )]),
        Err(e) => ValidationResult::invalid(vec![format!("invalid URL: {}", e)]),
    }
}

/// Stream an HTTP response body to a local file with progress reporting
///
/// Shared by catalog implementations; reports fractional progress when the
/// server announces a content length, and a single completion tick
/// otherwise.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    local_path: &Path,
    progress: Option<ProgressCallback>,
) -> Result<u64> {
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| QuireError::Network(format!("download failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(QuireError::Network(format!(
            "download failed: {} for {}",
            response.status(),
            url
        )));
    }

    let total = response.content_length();

    if let Some(parent) = local_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(local_path).await?;

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| QuireError::Network(format!("download stream: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        if let (Some(cb), Some(total)) = (&progress, total) {
            if total > 0 {
                cb((written as f64 / total as f64) as f32);
            }
        }
    }
    file.flush().await?;

    if let Some(cb) = &progress {
        cb(1.0);
    }

    Ok(written)
}
