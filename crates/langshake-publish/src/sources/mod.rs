//! Artifact sources
//!
//! A [`SourceProvider`] yields `(slug, artifact)` pairs in any order. The
//! publication pipeline never cares where they came from:
//! - [`HtmlPageSource`] scans a directory of exported pages and extracts their
//!   JSON-LD blocks
//! - [`MemorySource`] wraps artifacts already held in memory

use crate::error::SourceError;
use crate::site::SiteMetadata;
use langshake_artifact::Artifact;
use std::path::PathBuf;

pub(crate) mod html;
mod scan;

pub use html::{extract_json_ld, HtmlPageSource};
pub use scan::scan_pages;

/// One artifact ready for publication
#[derive(Debug, Clone, PartialEq)]
pub struct SourceItem {
    /// Publication identifier
    pub slug: String,
    /// Where the content came from (for diagnostics)
    pub origin: PathBuf,
    /// Content records
    pub artifact: Artifact,
}

impl SourceItem {
    /// Create item
    #[must_use]
    pub fn new(slug: impl Into<String>, origin: impl Into<PathBuf>, artifact: Artifact) -> Self {
        Self {
            slug: slug.into(),
            origin: origin.into(),
            artifact,
        }
    }
}

/// Producer of artifacts for one run
///
/// Implement this trait to publish from a new kind of input.
pub trait SourceProvider {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// All items of this run; per-item failures do not stop the others
    fn items(&self) -> Vec<Result<SourceItem, SourceError>>;

    /// Site metadata to use when no record describes the site
    fn site_fallback(&self) -> Option<SiteMetadata> {
        None
    }
}

/// Artifacts supplied directly by the caller
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    items: Vec<SourceItem>,
}

impl MemorySource {
    /// Create empty source
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact under `slug`
    #[must_use]
    pub fn with(mut self, slug: impl Into<String>, artifact: Artifact) -> Self {
        let slug = slug.into();
        self.items.push(SourceItem::new(slug.clone(), slug, artifact));
        self
    }

    /// Number of artifacts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no artifacts
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SourceProvider for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn items(&self) -> Vec<Result<SourceItem, SourceError>> {
        self.items.iter().cloned().map(Ok).collect()
    }
}

impl FromIterator<(String, Artifact)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (String, Artifact)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |source, (slug, artifact)| source.with(slug, artifact))
    }
}
