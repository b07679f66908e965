//! Persisted slug → checksum cache
//!
//! Records the checksum each slug was last published with, so unchanged
//! artifacts can be skipped on the next run. Loading is self-healing: a
//! missing, unreadable, or corrupt cache file is replaced by an empty one
//! and never surfaces as an error.

use crate::error::CacheError;
use langshake_artifact::Checksum;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default cache file name, relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = ".langshake-cache.json";

/// Slug → last published checksum
///
/// An owned value handed to each write by `&mut`; there is no global cache.
/// Entries are kept sorted so the persisted file is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumCache {
    path: PathBuf,
    entries: BTreeMap<String, Checksum>,
}

impl ChecksumCache {
    /// Empty cache that will persist to `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the cache at `path`
    ///
    /// Absent state is materialized as `{}`. Present but invalid state (not
    /// JSON, not an object, or any value that is not a checksum) is
    /// discarded and replaced by `{}`.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(entries) = read_entries(&path) {
            return Self { path, entries };
        }

        let cache = Self::new(path);
        if let Err(e) = cache.save() {
            warn!(error = %e, "could not reset cache file");
        }
        cache
    }

    /// Like [`load`](Self::load), but never writes the reset state back
    #[must_use]
    pub fn read(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path).unwrap_or_default();
        Self { path, entries }
    }

    /// Persist the full mapping, replacing prior state
    ///
    /// # Errors
    /// Returns [`CacheError::Io`] if the directory or file cannot be written
    pub fn save(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CacheError::io_error(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).map_err(|e| CacheError::io_error(&self.path, e))?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "saved cache");
        Ok(())
    }

    /// Checksum last published for `slug`
    #[inline]
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&Checksum> {
        self.entries.get(slug)
    }

    /// Record a published checksum, returning the previous one
    #[inline]
    pub fn insert(&mut self, slug: impl Into<String>, checksum: Checksum) -> Option<Checksum> {
        self.entries.insert(slug.into(), checksum)
    }

    /// Check if cache contains slug
    #[inline]
    #[must_use]
    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persistence path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop entries whose slug fails `keep`, returning the dropped slugs
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut dropped = Vec::new();
        self.entries.retain(|slug, _| {
            let kept = keep(slug);
            if !kept {
                dropped.push(slug.clone());
            }
            kept
        });
        dropped
    }
}

fn read_entries(path: &Path) -> Option<BTreeMap<String, Checksum>> {
    match fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str::<BTreeMap<String, Checksum>>(&text) {
            Ok(entries) => {
                debug!(path = %path.display(), entries = entries.len(), "loaded cache");
                Some(entries)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding invalid cache");
                None
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no cache found, starting empty");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cache unreadable, starting empty");
            None
        }
    }
}
