//! Change-detecting artifact writer
//!
//! An artifact is rewritten only when its checksum differs from the cached
//! one or its output file has gone missing. Both conditions are checked, so
//! an externally deleted file is always regenerated.

use crate::cache::ChecksumCache;
use crate::error::WriteError;
use langshake_artifact::{Artifact, Checksum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of published artifact documents
pub const ARTIFACT_EXT: &str = "json";

/// What a write would do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    /// Cached checksum matches and the file exists
    Skip,
    /// Slug has never been published
    Create,
    /// Content changed since the last publication
    Update,
    /// Cache matches but the file is missing
    Restore,
    /// Unchanged, rewritten because force mode is on
    Force,
}

impl WriteAction {
    /// Whether the action touches the filesystem
    #[inline]
    #[must_use]
    pub const fn writes(self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// Side-effect free decision for one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    /// Planned action
    pub action: WriteAction,
    /// Checksum of the artifact content
    pub checksum: Checksum,
    /// Destination file
    pub path: PathBuf,
}

/// Result of a write call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Whether the file was (re)written
    pub written: bool,
    /// Checksum of the artifact content
    pub checksum: Checksum,
    /// Destination file
    pub path: PathBuf,
}

/// Writes artifact documents into one destination directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    out_dir: PathBuf,
    force: bool,
}

impl ArtifactWriter {
    /// Writer for `out_dir`; the directory is created on first write
    #[inline]
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            force: false,
        }
    }

    /// Rewrite even unchanged artifacts
    #[inline]
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Destination directory
    #[inline]
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Destination file for `slug`
    ///
    /// # Errors
    /// Returns [`WriteError::InvalidSlug`] if the slug is not a plain file name
    pub fn path_for(&self, slug: &str) -> Result<PathBuf, WriteError> {
        validate_slug(slug)?;
        Ok(self.out_dir.join(format!("{slug}.{ARTIFACT_EXT}")))
    }

    /// Decide what [`write`](Self::write) would do, without touching disk
    ///
    /// # Errors
    /// - `WriteError::InvalidSlug` for unusable slugs
    /// - `WriteError::Malformed` if the content cannot be checksummed
    pub fn plan(
        &self,
        slug: &str,
        artifact: &Artifact,
        cache: &ChecksumCache,
    ) -> Result<WritePlan, WriteError> {
        let path = self.path_for(slug)?;
        let checksum = artifact.checksum().map_err(|source| WriteError::Malformed {
            slug: slug.to_string(),
            source,
        })?;

        let action = match cache.get(slug) {
            None => WriteAction::Create,
            Some(cached) if *cached != checksum => WriteAction::Update,
            Some(_) if !path.is_file() => WriteAction::Restore,
            Some(_) if self.force => WriteAction::Force,
            Some(_) => WriteAction::Skip,
        };

        Ok(WritePlan {
            action,
            checksum,
            path,
        })
    }

    /// Write `artifact` under `slug` unless unchanged
    ///
    /// On success the cache entry for `slug` holds the new checksum. On
    /// failure the cache is left untouched.
    ///
    /// # Errors
    /// - `WriteError::InvalidSlug` for unusable slugs
    /// - `WriteError::Malformed` if the content cannot be checksummed
    /// - `WriteError::Io` if the directory or file cannot be written
    pub fn write(
        &self,
        slug: &str,
        artifact: &Artifact,
        cache: &mut ChecksumCache,
    ) -> Result<WriteOutcome, WriteError> {
        let WritePlan {
            action,
            checksum,
            path,
        } = self.plan(slug, artifact, cache)?;

        if !action.writes() {
            debug!(slug, checksum = %checksum.short(), "unchanged, skipping");
            return Ok(WriteOutcome {
                written: false,
                checksum,
                path,
            });
        }

        fs::create_dir_all(&self.out_dir)
            .map_err(|e| WriteError::io_error(slug, &self.out_dir, e))?;

        let document = artifact.to_document(&checksum);
        let json = serde_json::to_vec_pretty(&document).map_err(|source| WriteError::Serialize {
            slug: slug.to_string(),
            source,
        })?;
        fs::write(&path, json).map_err(|e| WriteError::io_error(slug, &path, e))?;

        cache.insert(slug, checksum);
        debug!(slug, ?action, checksum = %checksum.short(), path = %path.display(), "wrote artifact");

        Ok(WriteOutcome {
            written: true,
            checksum,
            path,
        })
    }
}

fn validate_slug(slug: &str) -> Result<(), WriteError> {
    let invalid = slug.is_empty()
        || slug == "."
        || slug == ".."
        || slug.contains(['/', '\\', '\0']);
    if invalid {
        return Err(WriteError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn article(title: &str) -> Artifact {
        Artifact::from_value(json!({"type": "Article", "title": title})).unwrap()
    }

    fn setup() -> (tempfile::TempDir, ArtifactWriter, ChecksumCache) {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("out"));
        let cache = ChecksumCache::new(dir.path().join("cache.json"));
        (dir, writer, cache)
    }

    #[test]
    fn writes_then_skips_identical_content() {
        let (_dir, writer, mut cache) = setup();

        let first = writer.write("about", &article("X"), &mut cache).unwrap();
        assert!(first.written);
        assert!(first.path.exists());
        assert_eq!(cache.get("about"), Some(&first.checksum));

        let second = writer.write("about", &article("X"), &mut cache).unwrap();
        assert!(!second.written);
        assert_eq!(second.checksum, first.checksum);
    }

    #[test]
    fn changed_content_is_rewritten() {
        let (_dir, writer, mut cache) = setup();

        let first = writer.write("about", &article("X"), &mut cache).unwrap();
        let second = writer.write("about", &article("Y"), &mut cache).unwrap();
        assert!(second.written);
        assert_ne!(second.checksum, first.checksum);
        assert_eq!(cache.get("about"), Some(&second.checksum));

        let data: Value = serde_json::from_slice(&fs::read(&second.path).unwrap()).unwrap();
        assert_eq!(data[0]["title"], "Y");
    }

    #[test]
    fn deleted_output_is_restored() {
        let (_dir, writer, mut cache) = setup();

        let first = writer.write("about", &article("X"), &mut cache).unwrap();
        fs::remove_file(&first.path).unwrap();

        let plan = writer.plan("about", &article("X"), &cache).unwrap();
        assert_eq!(plan.action, WriteAction::Restore);

        let again = writer.write("about", &article("X"), &mut cache).unwrap();
        assert!(again.written);
        assert!(again.path.exists());
    }

    #[test]
    fn force_rewrites_unchanged_content() {
        let (_dir, writer, mut cache) = setup();
        writer.write("about", &article("X"), &mut cache).unwrap();

        let forced = writer.with_force(true);
        let outcome = forced.write("about", &article("X"), &mut cache).unwrap();
        assert!(outcome.written);
    }

    #[test]
    fn plan_does_not_touch_disk_or_cache() {
        let (_dir, writer, cache) = setup();
        let plan = writer.plan("about", &article("X"), &cache).unwrap();
        assert_eq!(plan.action, WriteAction::Create);
        assert!(!plan.path.exists());
        assert!(cache.is_empty());
    }

    #[test]
    fn document_has_trailing_checksum_record() {
        let (_dir, writer, mut cache) = setup();
        let artifact = Artifact::from_value(json!([
            {"@context": "http://schema.org", "@type": "Article", "headline": "Test"},
            {"@context": "http://schema.org", "@type": "Product", "name": "Widget"}
        ]))
        .unwrap();

        let outcome = writer.write("testpage", &artifact, &mut cache).unwrap();
        let data: Value = serde_json::from_slice(&fs::read(&outcome.path).unwrap()).unwrap();
        let items = data.as_array().unwrap();

        assert_eq!(items.len(), 3);
        assert!(items[0].get("checksum").is_none());
        assert!(items[1].get("checksum").is_none());
        assert_eq!(items[2]["checksum"], outcome.checksum.to_string());
        assert_eq!(items[2]["checksum"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn failed_write_leaves_cache_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let writer = ArtifactWriter::new(&blocker);
        let mut cache = ChecksumCache::new(dir.path().join("cache.json"));

        let err = writer.write("about", &article("X"), &mut cache).unwrap_err();
        assert!(matches!(err, WriteError::Io { ref slug, .. } if slug == "about"));
        assert!(err.to_string().contains("failed to write"));
        assert!(cache.get("about").is_none());
    }

    #[test]
    fn rejects_path_like_slugs() {
        let (_dir, writer, mut cache) = setup();
        for slug in ["", ".", "..", "../escape", "a/b", "a\\b"] {
            let err = writer.write(slug, &article("X"), &mut cache).unwrap_err();
            assert!(matches!(err, WriteError::InvalidSlug(_)), "accepted {slug:?}");
        }
        assert!(cache.is_empty());
    }
}
