//! Langshake Core - publication orchestration
//!
//! Turns merged configuration into a [`Pipeline`] run:
//! - Loads `langshake.config.json` and layers command-line values on top
//! - Walks a [`SourceProvider`](langshake_publish::SourceProvider), writing
//!   only changed artifacts
//! - Persists the checksum cache and publishes the Merkle-rooted index
//!
//! # Example
//!
//! ```rust,no_run
//! use langshake_core::{Config, Pipeline, CONFIG_FILE};
//! use langshake_publish::HtmlPageSource;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Config::load(CONFIG_FILE).resolve()?;
//! let source = HtmlPageSource::new(&options.input);
//! let summary = Pipeline::new(options).run(&source)?;
//!
//! println!("{} written, {} unchanged, root {}", summary.written, summary.skipped, summary.merkle_root);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod build;
pub mod config;
pub mod error;
pub mod pipeline;

pub use build::{run_build_command, BuildError};
pub use config::{Config, PublishOptions, CONFIG_FILE};
pub use error::{ConfigError, PipelineError};
pub use pipeline::{FailureKind, Pipeline, RunFailure, RunSummary};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running publications
    pub use crate::{Config, Pipeline, PipelineError, PublishOptions, RunSummary};
    pub use langshake_publish::{HtmlPageSource, MemorySource, SourceProvider};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
