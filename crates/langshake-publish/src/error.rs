//! Error types for the publication layer
//!
//! One enum per concern:
//! - Cache persistence (loading never fails; see [`crate::cache`])
//! - Per-artifact writes (recoverable, counted by the caller)
//! - Index publication (fatal to a run)
//! - Index verification
//! - Page sources

use langshake_artifact::ChecksumError;
use std::path::PathBuf;

/// Errors persisting the checksum cache
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// IO error during cache write
    #[error("failed to write cache {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache could not be serialized
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors writing a single artifact
///
/// Never fatal to a run: the caller records the failure and moves on.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Slug cannot be used as a file name
    #[error("invalid slug '{0}': must be a non-empty file name without path separators")]
    InvalidSlug(String),

    /// Same slug produced twice in one run
    #[error("duplicate slug '{0}' in this run")]
    DuplicateSlug(String),

    /// Content could not be canonicalized
    #[error("malformed artifact '{slug}': {source}")]
    Malformed {
        slug: String,
        #[source]
        source: ChecksumError,
    },

    /// Output document could not be serialized
    #[error("failed to serialize '{slug}': {source}")]
    Serialize {
        slug: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO error during file write
    #[error("failed to write '{slug}' to {path}: {source}")]
    Io {
        slug: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    /// Create IO error for slug and path
    pub fn io_error(slug: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            slug: slug.into(),
            path: path.into(),
            source,
        }
    }

    /// Whether the artifact itself was at fault rather than the destination
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Errors writing the verification document
///
/// Fatal: downstream verifiers depend on this document.
#[derive(Debug, thiserror::Error)]
pub enum IndexPublishError {
    /// IO error during index write
    #[error("failed to build LLM index at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be serialized
    #[error("failed to build LLM index at {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors reading a verification document
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// IO error reading the document
    #[error("failed to read verification document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not a valid verification document
    #[error("invalid verification document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Unknown verification strategy
    #[error("unsupported verification strategy '{0}'")]
    UnsupportedStrategy(String),
}

/// A JSON-LD block that cannot become part of an artifact
#[derive(Debug, thiserror::Error)]
pub enum JsonLdError {
    /// Block body is not JSON
    #[error("JSON-LD block {block} is not valid JSON: {source}")]
    Parse {
        block: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Block (or an element of a block array) is not an object
    #[error("JSON-LD block {block} holds a {found}, expected an object")]
    NotAnObject { block: usize, found: &'static str },
}

/// Errors producing artifacts from page sources
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// IO error reading a page
    #[error("failed to read page {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Page JSON-LD does not form an artifact
    #[error("malformed artifact in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: JsonLdError,
    },

    /// Page path yields no usable slug
    #[error("cannot derive slug from {0}")]
    NoSlug(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn write_error_carries_slug_and_path() {
        let err = WriteError::io_error(
            "about",
            "/out/about.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("failed to write 'about'"));
        assert!(msg.contains("/out/about.json"));
        assert!(!err.is_malformed());
    }

    #[test]
    fn index_error_display() {
        let err = IndexPublishError::Io {
            path: PathBuf::from("/public/.well-known/llm.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("failed to build LLM index"));
    }

    #[test]
    fn cache_error_display() {
        let err = CacheError::io_error(
            "/root/cache.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().starts_with("failed to write cache"));
    }

    #[test]
    fn malformed_page_names_path_and_block() {
        let err = SourceError::Malformed {
            path: PathBuf::from("out/bad.html"),
            source: JsonLdError::NotAnObject {
                block: 2,
                found: "number",
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("out/bad.html"));
        assert!(msg.contains("block 2 holds a number"));
    }
}
