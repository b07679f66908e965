//! Langshake Publication Layer
//!
//! The boundary between the artifact primitives and the filesystem.
//!
//! # Core Operations
//!
//! - **Cache**: load (self-healing) and save the slug → checksum mapping
//! - **Write**: publish an artifact unless unchanged since the last run
//! - **Index**: write the Merkle-rooted verification document
//! - **Verify**: re-derive a publication's checksums and root
//!
//! # Architecture
//!
//! ```text
//! SourceProvider → ArtifactWriter ──→ <out>/<slug>.json
//!                      ↑   ↓
//!               ChecksumCache   Module list → MerkleIndex → IndexPublisher → llm.json
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use langshake_artifact::{Artifact, MerkleIndex, Module};
//! use langshake_publish::{ArtifactWriter, ChecksumCache, IndexPublisher, SiteMetadata};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cache = ChecksumCache::load(".langshake-cache.json");
//! let writer = ArtifactWriter::new("public/langshake");
//!
//! let artifact = Artifact::from_value(json!({"@type": "AboutPage", "name": "About"}))?;
//! let outcome = writer.write("about", &artifact, &mut cache)?;
//! cache.save()?;
//!
//! let index = MerkleIndex::build(vec![Module::new("langshake/about.json", outcome.checksum)]);
//! IndexPublisher::new("public/.well-known/llm.json").publish(&index, SiteMetadata::default(), None)?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod error;
pub mod index;
pub mod site;
pub mod sources;
pub mod verify;
pub mod writer;

pub use cache::{ChecksumCache, DEFAULT_CACHE_FILE};
pub use error::{CacheError, IndexPublishError, JsonLdError, SourceError, VerifyError, WriteError};
pub use index::{IndexPublisher, VerificationBlock, VerificationDocument, DEFAULT_INDEX_PATH};
pub use site::SiteMetadata;
pub use sources::{HtmlPageSource, MemorySource, SourceItem, SourceProvider};
pub use verify::{verify_index, ModuleFailure, ModuleFault, VerificationReport};
pub use writer::{ArtifactWriter, WriteAction, WriteOutcome, WritePlan};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for publishing
    pub use crate::cache::ChecksumCache;
    pub use crate::error::{IndexPublishError, SourceError, WriteError};
    pub use crate::index::IndexPublisher;
    pub use crate::site::SiteMetadata;
    pub use crate::sources::SourceProvider;
    pub use crate::writer::ArtifactWriter;
    pub use langshake_artifact::{Artifact, Checksum, MerkleIndex, Module};
}
