//! Langshake Artifact Primitives
//!
//! Content checksums, canonical JSON, and the Merkle index that summarises a
//! publication run.
//!
//! # Core Concepts
//!
//! - [`Artifact`]: Ordered structured records published under one slug
//! - [`Checksum`]: 32-byte SHA-256 digest over an artifact's canonical form
//! - [`Module`]: Public path + checksum of a published artifact
//! - [`MerkleIndex`]: Canonically ordered modules and their Merkle root
//!
//! # Example
//!
//! ```rust
//! use langshake_artifact::{Artifact, MerkleIndex, Module};
//! use serde_json::json;
//!
//! let artifact = Artifact::from_value(json!({"@type": "Article", "title": "X"})).unwrap();
//! let checksum = artifact.checksum().unwrap();
//!
//! let index = MerkleIndex::build(vec![Module::new("langshake/about.json", checksum)]);
//! assert_eq!(index.root(), Some(checksum));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
pub mod canonical;
mod checksum;
pub mod merkle;

pub use artifact::{Artifact, ArtifactError, Record};
pub use canonical::{checksum, CHECKSUM_FIELD};
pub use checksum::{Checksum, ChecksumError, CHECKSUM_HEX_LEN, CHECKSUM_LEN};
pub use merkle::{MerkleIndex, Module};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
