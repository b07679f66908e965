//! Verification document (`.well-known/llm.json`)
//!
//! Assembled once per run from the Merkle index and site metadata, then
//! written over any previous document.

use crate::error::IndexPublishError;
use crate::site::SiteMetadata;
use chrono::{NaiveDate, Utc};
use langshake_artifact::MerkleIndex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Document format version
pub const INDEX_VERSION: &str = "1.0";

/// The only supported verification strategy
pub const MERKLE_STRATEGY: &str = "merkle";

/// Conventional location under the public root
pub const DEFAULT_INDEX_PATH: &str = ".well-known/llm.json";

/// Published verification document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationDocument {
    pub version: String,
    pub site: SiteMetadata,
    /// Public paths in canonical Merkle order
    pub modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_context: Option<Value>,
    pub verification: VerificationBlock,
}

/// `verification` block of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationBlock {
    pub strategy: String,
    /// Hex root, or `""` when no modules were published
    pub merkle_root: String,
    /// Date-only precision
    pub last_verified: NaiveDate,
}

impl VerificationDocument {
    /// Assemble from a built index
    #[must_use]
    pub fn assemble(
        index: &MerkleIndex,
        site: SiteMetadata,
        llm_context: Option<Value>,
        last_verified: NaiveDate,
    ) -> Self {
        Self {
            version: INDEX_VERSION.to_string(),
            site,
            modules: index.ordered_paths(),
            llm_context,
            verification: VerificationBlock {
                strategy: MERKLE_STRATEGY.to_string(),
                merkle_root: index.root_hex(),
                last_verified,
            },
        }
    }
}

/// Writes the verification document to a fixed destination
#[derive(Debug, Clone)]
pub struct IndexPublisher {
    path: PathBuf,
}

impl IndexPublisher {
    /// Publisher for `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Publish with today's UTC date
    ///
    /// # Errors
    /// Returns [`IndexPublishError`] if the document cannot be written
    pub fn publish(
        &self,
        index: &MerkleIndex,
        site: SiteMetadata,
        llm_context: Option<Value>,
    ) -> Result<VerificationDocument, IndexPublishError> {
        self.publish_on(index, site, llm_context, Utc::now().date_naive())
    }

    /// Publish with an explicit `lastVerified` date
    ///
    /// # Errors
    /// Returns [`IndexPublishError`] if the document cannot be written
    pub fn publish_on(
        &self,
        index: &MerkleIndex,
        site: SiteMetadata,
        llm_context: Option<Value>,
        date: NaiveDate,
    ) -> Result<VerificationDocument, IndexPublishError> {
        let document = VerificationDocument::assemble(index, site, llm_context, date);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| IndexPublishError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let json =
            serde_json::to_string_pretty(&document).map_err(|source| IndexPublishError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        fs::write(&self.path, json).map_err(|source| IndexPublishError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(
            path = %self.path.display(),
            modules = document.modules.len(),
            merkle_root = %document.verification.merkle_root,
            "published verification document"
        );
        Ok(document)
    }
}
