//! Publication run
//!
//! One run takes every item a [`SourceProvider`] yields, writes the changed
//! ones, persists the cache, and publishes the Merkle-rooted index over all
//! of them (written or skipped). Failures of single artifacts are recorded in
//! the [`RunSummary`] and the run continues; only index publication aborts.

use crate::config::PublishOptions;
use crate::error::PipelineError;
use chrono::{NaiveDate, Utc};
use langshake_artifact::{MerkleIndex, Module};
use langshake_publish::{
    ArtifactWriter, ChecksumCache, IndexPublisher, SiteMetadata, SourceError, SourceProvider,
    WriteError,
};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What went wrong with one part of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Source could not be read
    Source,
    /// Content could not be checksummed or is not an artifact
    Malformed,
    /// Artifact could not be written
    Write,
    /// Cache could not be persisted
    CachePersist,
    /// `llm_context` file could not be loaded
    Context,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Malformed => "malformed",
            Self::Write => "write",
            Self::CachePersist => "cache",
            Self::Context => "context",
        };
        f.write_str(name)
    }
}

/// A non-fatal failure recorded during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// Slug, or the source/cache path when no slug is known
    pub subject: String,
    pub kind: FailureKind,
    pub message: String,
}

impl RunFailure {
    fn new(subject: impl Into<String>, kind: FailureKind, error: &dyn std::error::Error) -> Self {
        Self {
            subject: subject.into(),
            kind,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Items taken from the source, including failed ones
    pub processed: usize,
    /// Artifacts written (or that would be written, in dry-run mode)
    pub written: usize,
    /// Artifacts left untouched because they were unchanged
    pub skipped: usize,
    pub errors: Vec<RunFailure>,
    /// Hex root over every published module, `""` when there are none
    pub merkle_root: String,
    /// Modules in canonical order
    pub modules: Vec<String>,
    /// Index written by this run; `None` in dry-run mode
    pub index_path: Option<PathBuf>,
    /// Cache entries dropped because their slug was not seen this run
    pub pruned: Vec<String>,
    pub dry_run: bool,
}

impl RunSummary {
    /// Whether any failure was recorded
    #[inline]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Failures of a given kind
    pub fn errors_of(&self, kind: FailureKind) -> impl Iterator<Item = &RunFailure> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

/// Publication pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PublishOptions,
}

impl Pipeline {
    /// Create pipeline
    #[inline]
    #[must_use]
    pub fn new(options: PublishOptions) -> Self {
        Self { options }
    }

    /// Run options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    /// Run, stamping the index with today's UTC date
    ///
    /// # Errors
    /// Returns [`PipelineError::IndexPublish`] if the index cannot be written
    pub fn run(&self, source: &dyn SourceProvider) -> Result<RunSummary, PipelineError> {
        self.run_on(source, Utc::now().date_naive())
    }

    /// Run with an explicit `lastVerified` date
    ///
    /// # Errors
    /// Returns [`PipelineError::IndexPublish`] if the index cannot be written
    pub fn run_on(
        &self,
        source: &dyn SourceProvider,
        date: NaiveDate,
    ) -> Result<RunSummary, PipelineError> {
        let opts = &self.options;
        info!(
            source = source.name(),
            out = %opts.out_dir.display(),
            dry_run = opts.dry_run,
            force = opts.force,
            "starting run"
        );

        let mut cache = if opts.dry_run {
            ChecksumCache::read(&opts.cache_path)
        } else {
            ChecksumCache::load(&opts.cache_path)
        };
        let writer = ArtifactWriter::new(&opts.out_dir).with_force(opts.force);

        let mut summary = RunSummary {
            dry_run: opts.dry_run,
            ..RunSummary::default()
        };
        let mut seen = HashSet::new();
        let mut modules = Vec::new();
        let mut inferred_site = None;

        for item in source.items() {
            summary.processed += 1;
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!(error = %e, "skipping source item");
                    summary.errors.push(source_failure(&e));
                    continue;
                }
            };
            let slug = item.slug.as_str();

            if !seen.insert(item.slug.clone()) {
                let e = WriteError::DuplicateSlug(item.slug.clone());
                warn!(slug, "duplicate slug, keeping the first");
                summary.errors.push(RunFailure::new(slug, FailureKind::Write, &e));
                continue;
            }

            let result = if opts.dry_run {
                writer
                    .plan(slug, &item.artifact, &cache)
                    .map(|plan| (plan.action.writes(), plan.checksum))
            } else {
                writer
                    .write(slug, &item.artifact, &mut cache)
                    .map(|outcome| (outcome.written, outcome.checksum))
            };

            match result {
                Ok((written, checksum)) => {
                    if written {
                        summary.written += 1;
                    } else {
                        summary.skipped += 1;
                    }
                    modules.push(Module::new(opts.public_path(slug), checksum));
                    if inferred_site.is_none() {
                        inferred_site = SiteMetadata::from_artifact(&item.artifact);
                    }
                }
                Err(e) => {
                    warn!(slug, error = %e, "artifact not published");
                    let kind = if e.is_malformed() {
                        FailureKind::Malformed
                    } else {
                        FailureKind::Write
                    };
                    summary.errors.push(RunFailure::new(slug, kind, &e));
                }
            }
        }

        if !opts.dry_run {
            summary.pruned = cache.retain(|slug| seen.contains(slug));
            if !summary.pruned.is_empty() {
                info!(count = summary.pruned.len(), "pruned stale cache entries");
                debug!(slugs = ?summary.pruned, "pruned");
            }
            if let Err(e) = cache.save() {
                warn!(error = %e, "failed to persist cache");
                summary.errors.push(RunFailure::new(
                    cache.path().display().to_string(),
                    FailureKind::CachePersist,
                    &e,
                ));
            }
        }

        let index = MerkleIndex::build(modules);
        summary.merkle_root = index.root_hex();
        summary.modules = index.ordered_paths();

        if opts.dry_run {
            info!(
                would_write = summary.written,
                unchanged = summary.skipped,
                root = %summary.merkle_root,
                "dry run complete, nothing written"
            );
            return Ok(summary);
        }

        let llm_context = match &opts.context_path {
            Some(path) => match load_context(path) {
                Ok(value) => Some(value),
                Err(failure) => {
                    warn!(%failure, "publishing without llm_context");
                    summary.errors.push(failure);
                    None
                }
            },
            None => None,
        };

        let site = SiteMetadata::resolve(opts.site.clone(), inferred_site, || {
            source.site_fallback()
        });
        IndexPublisher::new(&opts.index_path).publish_on(&index, site, llm_context, date)?;
        summary.index_path = Some(opts.index_path.clone());

        info!(
            written = summary.written,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            root = %summary.merkle_root,
            "run complete"
        );
        Ok(summary)
    }
}

fn source_failure(error: &SourceError) -> RunFailure {
    let (subject, kind) = match error {
        SourceError::Malformed { path, .. } => (path.display().to_string(), FailureKind::Malformed),
        SourceError::Io { path, .. } | SourceError::NoSlug(path) => {
            (path.display().to_string(), FailureKind::Source)
        }
    };
    RunFailure::new(subject, kind, error)
}

fn load_context(path: &Path) -> Result<Value, RunFailure> {
    let subject = path.display().to_string();
    let text = fs::read_to_string(path)
        .map_err(|e| RunFailure::new(subject.as_str(), FailureKind::Context, &e))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| RunFailure::new(subject.as_str(), FailureKind::Context, &e))?;
    debug!(path = %path.display(), "loaded llm_context");
    Ok(value)
}
