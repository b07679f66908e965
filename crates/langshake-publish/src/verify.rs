//! Third-party verification of a publication
//!
//! Reads a verification document, re-derives every module checksum from the
//! published artifact documents, rebuilds the Merkle root, and reports every
//! discrepancy instead of stopping at the first.

use crate::error::VerifyError;
use crate::index::{VerificationDocument, MERKLE_STRATEGY};
use langshake_artifact::{Artifact, Checksum, MerkleIndex, Module};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Why one module failed verification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleFault {
    /// Public path is absolute or leaves the public root
    #[error("path escapes the public root")]
    UnsafePath,

    /// Published file does not exist
    #[error("file not found")]
    Missing,

    /// File exists but could not be read or parsed
    #[error("unreadable document: {0}")]
    Unreadable(String),

    /// Document does not carry a valid trailing checksum
    #[error("invalid document: {0}")]
    Invalid(String),

    /// Declared checksum disagrees with the content
    #[error("checksum mismatch: declared {declared}, computed {computed}")]
    ChecksumMismatch {
        declared: Checksum,
        computed: Checksum,
    },
}

/// One failed module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFailure {
    pub public_path: String,
    pub fault: ModuleFault,
}

/// Outcome of verifying a publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Modules listed in the document
    pub modules_checked: usize,
    /// Per-module failures
    pub failures: Vec<ModuleFailure>,
    /// Root declared in the document
    pub declared_root: String,
    /// Root rebuilt from recomputed checksums
    pub computed_root: String,
    /// Whether the listed order is the canonical order
    pub order_matches: bool,
}

impl VerificationReport {
    /// Whether the declared root matches the rebuilt root
    #[inline]
    #[must_use]
    pub fn root_matches(&self) -> bool {
        self.declared_root == self.computed_root
    }

    /// Whether the publication verified cleanly
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty() && self.root_matches() && self.order_matches
    }
}

/// Verify the document at `document_path` against files under `public_root`
///
/// # Errors
/// Returns [`VerifyError`] only when the verification document itself cannot
/// be read, parsed, or uses an unknown strategy. Module problems are reported
/// in the returned [`VerificationReport`].
pub fn verify_index(
    document_path: impl AsRef<Path>,
    public_root: impl AsRef<Path>,
) -> Result<VerificationReport, VerifyError> {
    let document_path = document_path.as_ref();
    let text = fs::read_to_string(document_path).map_err(|source| VerifyError::Io {
        path: document_path.to_path_buf(),
        source,
    })?;
    let document: VerificationDocument =
        serde_json::from_str(&text).map_err(|source| VerifyError::Parse {
            path: document_path.to_path_buf(),
            source,
        })?;
    verify_document(&document, public_root.as_ref())
}

/// Verify an already parsed document
///
/// # Errors
/// Returns [`VerifyError::UnsupportedStrategy`] for non-Merkle documents
pub fn verify_document(
    document: &VerificationDocument,
    public_root: &Path,
) -> Result<VerificationReport, VerifyError> {
    if document.verification.strategy != MERKLE_STRATEGY {
        return Err(VerifyError::UnsupportedStrategy(
            document.verification.strategy.clone(),
        ));
    }

    let mut failures = Vec::new();
    let mut recomputed = Vec::with_capacity(document.modules.len());

    for public_path in &document.modules {
        match verify_module(public_root, public_path) {
            Ok(checksum) => {
                debug!(path = %public_path, checksum = %checksum.short(), "module verified");
                recomputed.push(Module::new(public_path.clone(), checksum));
            }
            Err(fault) => {
                warn!(path = %public_path, %fault, "module failed verification");
                failures.push(ModuleFailure {
                    public_path: public_path.clone(),
                    fault,
                });
            }
        }
    }

    let rebuilt = MerkleIndex::build(recomputed);
    Ok(VerificationReport {
        modules_checked: document.modules.len(),
        order_matches: failures.is_empty() && rebuilt.ordered_paths() == document.modules,
        failures,
        declared_root: document.verification.merkle_root.clone(),
        computed_root: rebuilt.root_hex(),
    })
}

fn verify_module(public_root: &Path, public_path: &str) -> Result<Checksum, ModuleFault> {
    let path = resolve(public_root, public_path).ok_or(ModuleFault::UnsafePath)?;
    let bytes = fs::read(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ModuleFault::Missing,
        _ => ModuleFault::Unreadable(e.to_string()),
    })?;
    let value = serde_json::from_slice(&bytes).map_err(|e| ModuleFault::Unreadable(e.to_string()))?;
    let (artifact, declared) =
        Artifact::from_document(value).map_err(|e| ModuleFault::Invalid(e.to_string()))?;
    let computed = artifact
        .checksum()
        .map_err(|e| ModuleFault::Invalid(e.to_string()))?;
    if computed != declared {
        return Err(ModuleFault::ChecksumMismatch { declared, computed });
    }
    Ok(computed)
}

fn resolve(public_root: &Path, public_path: &str) -> Option<PathBuf> {
    let relative = Path::new(public_path);
    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    safe.then(|| public_root.join(relative))
}
