//! Run configuration
//!
//! Options come from `langshake.config.json` and the command line; command
//! line values win. Every field of [`Config`] is optional so the two layers
//! can be merged field by field, then resolved into [`PublishOptions`].

use crate::error::ConfigError;
use langshake_publish::{SiteMetadata, DEFAULT_CACHE_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default config file name, relative to the working directory
pub const CONFIG_FILE: &str = "langshake.config.json";

/// Public prefix used when the output directory has no usable name
pub const FALLBACK_PUBLIC_PREFIX: &str = "langshake";

/// One layer of options (file or command line)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Directory of exported pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    /// Artifact output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,
    /// Verification document path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<PathBuf>,
    /// Cache file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
    /// Prefix of module public paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_prefix: Option<String>,
    /// JSON file passed through as `llm_context`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,
    /// Shell command producing the exported pages, run before extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    /// Site metadata; inferred from pages when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteMetadata>,
}

impl Config {
    /// Read a config file
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn try_load(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Read a config file, falling back to defaults on any problem
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(Some(config)) => {
                debug!(path = %path.as_ref().display(), "loaded config");
                config
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Write this config as pretty JSON
    ///
    /// # Errors
    /// Returns error if the file cannot be written
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layer `overrides` on top of `self`
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            input: overrides.input.or(self.input),
            out: overrides.out.or(self.out),
            llm: overrides.llm.or(self.llm),
            cache: overrides.cache.or(self.cache),
            public_prefix: overrides.public_prefix.or(self.public_prefix),
            context: overrides.context.or(self.context),
            build: overrides.build.or(self.build),
            force: overrides.force.or(self.force),
            dry_run: overrides.dry_run.or(self.dry_run),
            verbose: overrides.verbose.or(self.verbose),
            site: overrides.site.or(self.site),
        }
    }

    /// Resolve into run options
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] if `input`, `out` or `llm` is unset
    pub fn resolve(&self) -> Result<PublishOptions, ConfigError> {
        let input = self.input.clone().ok_or(ConfigError::Missing("input"))?;
        let out_dir = self.out.clone().ok_or(ConfigError::Missing("out"))?;
        let index_path = self.llm.clone().ok_or(ConfigError::Missing("llm"))?;

        let public_prefix = self
            .public_prefix
            .clone()
            .unwrap_or_else(|| default_public_prefix(&out_dir));

        Ok(PublishOptions {
            input,
            out_dir,
            index_path,
            cache_path: self
                .cache
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE)),
            public_prefix,
            context_path: self.context.clone(),
            build: self.build.clone(),
            force: self.force.unwrap_or(false),
            dry_run: self.dry_run.unwrap_or(false),
            site: self.site.clone(),
        })
    }
}

fn default_public_prefix(out_dir: &Path) -> String {
    out_dir
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_PUBLIC_PREFIX)
        .to_string()
}

/// Fully resolved options for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOptions {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub index_path: PathBuf,
    pub cache_path: PathBuf,
    pub public_prefix: String,
    pub context_path: Option<PathBuf>,
    pub build: Option<String>,
    pub force: bool,
    pub dry_run: bool,
    pub site: Option<SiteMetadata>,
}

impl PublishOptions {
    /// Options with defaults for everything but the three required paths
    #[must_use]
    pub fn new(
        input: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
    ) -> Self {
        let out_dir = out_dir.into();
        Self {
            input: input.into(),
            public_prefix: default_public_prefix(&out_dir),
            out_dir,
            index_path: index_path.into(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            context_path: None,
            build: None,
            force: false,
            dry_run: false,
            site: None,
        }
    }

    /// With cache path
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// With public path prefix
    #[inline]
    #[must_use]
    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into();
        self
    }

    /// With `llm_context` source file
    #[inline]
    #[must_use]
    pub fn with_context(mut self, path: impl Into<PathBuf>) -> Self {
        self.context_path = Some(path.into());
        self
    }

    /// With build command
    #[inline]
    #[must_use]
    pub fn with_build(mut self, command: impl Into<String>) -> Self {
        self.build = Some(command.into());
        self
    }

    /// With force mode
    #[inline]
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// With dry-run mode
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// With configured site metadata
    #[inline]
    #[must_use]
    pub fn with_site(mut self, site: SiteMetadata) -> Self {
        self.site = Some(site);
        self
    }

    /// Public path of `slug`
    #[must_use]
    pub fn public_path(&self, slug: &str) -> String {
        let prefix = self.public_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{slug}.json")
        } else {
            format!("{prefix}/{slug}.json")
        }
    }
}
