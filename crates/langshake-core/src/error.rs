//! Error types for Langshake runs
//!
//! Per-artifact problems never abort a run; they are collected as
//! [`RunFailure`](crate::pipeline::RunFailure)s. Only the errors here stop a run.

use langshake_publish::IndexPublishError;
use std::path::PathBuf;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading or writing the config file
    #[error("config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Config could not be serialized for saving
    #[error("failed to serialize config for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Required option missing after merging file and command line
    #[error("missing required option --{0}; specify it on the command line or in the config file")]
    Missing(&'static str),
}

/// Errors that stop a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Verification document could not be written
    #[error(transparent)]
    IndexPublish(#[from] IndexPublishError),

    /// Options could not be resolved
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Whether the run left published artifacts without a matching index
    #[inline]
    #[must_use]
    pub fn leaves_stale_index(&self) -> bool {
        matches!(self, Self::IndexPublish(_))
    }
}
