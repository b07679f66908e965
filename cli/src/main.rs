//! Langshake CLI
//!
//! Run with: `langshake publish --input out --out public/langshake --llm public/.well-known/llm.json`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use langshake_core::{run_build_command, BuildError, Config, Pipeline, RunSummary, CONFIG_FILE};
use langshake_publish::{verify_index, HtmlPageSource, VerificationReport};

#[derive(Parser, Debug)]
#[command(name = "langshake")]
#[command(about = "Publish verifiable JSON-LD artifacts with a Merkle-rooted index")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract JSON-LD from exported pages and publish changed artifacts
    Publish(PublishArgs),

    /// Check a published index against the artifacts it lists
    Verify(VerifyArgs),
}

#[derive(Args, Debug, Default)]
struct PublishArgs {
    /// Directory of exported HTML pages
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for artifacts
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Path of the verification document
    #[arg(long)]
    llm: Option<PathBuf>,

    /// Checksum cache file (default: .langshake-cache.json)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Prefix of module paths in the index (default: last component of --out)
    #[arg(long)]
    public_prefix: Option<String>,

    /// JSON file embedded as llm_context
    #[arg(long)]
    context: Option<PathBuf>,

    /// Shell command that exports the pages, run before extraction
    #[arg(long)]
    build: Option<String>,

    /// Rewrite every artifact even if unchanged
    #[arg(long)]
    force: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Debug-level output
    #[arg(short, long)]
    verbose: bool,

    /// Config file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Write the merged options back to the config file
    #[arg(long)]
    save_config: bool,
}

impl PublishArgs {
    /// Command-line layer; unset flags leave file values alone
    fn overrides(&self) -> Config {
        Config {
            input: self.input.clone(),
            out: self.out.clone(),
            llm: self.llm.clone(),
            cache: self.cache.clone(),
            public_prefix: self.public_prefix.clone(),
            context: self.context.clone(),
            build: self.build.clone(),
            force: self.force.then_some(true),
            dry_run: self.dry_run.then_some(true),
            verbose: self.verbose.then_some(true),
            site: None,
        }
    }
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Verification document to check
    #[arg(long)]
    index: PathBuf,

    /// Directory module paths are relative to (default: parent of the index's directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Debug-level output
    #[arg(short, long)]
    verbose: bool,
}

impl VerifyArgs {
    fn public_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            self.index
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_default()
        })
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Publish(args) => {
            // The config file may switch on verbose output too
            let file_verbose = Config::try_load(&args.config)
                .ok()
                .flatten()
                .and_then(|c| c.verbose)
                .unwrap_or(false);
            init_tracing(args.verbose || file_verbose);
            cmd_publish(&args)
        }
        Commands::Verify(args) => {
            init_tracing(args.verbose);
            cmd_verify(&args)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            failure_code(&e)
        }
    }
}

/// A failed build command exits with its own code
fn failure_code(error: &anyhow::Error) -> ExitCode {
    error
        .downcast_ref::<BuildError>()
        .map_or(ExitCode::FAILURE, |e| ExitCode::from(e.exit_code()))
}

/// Returns whether the run finished without recorded failures
fn cmd_publish(args: &PublishArgs) -> Result<bool> {
    let merged = Config::load(&args.config).merge(args.overrides());

    if args.save_config {
        merged
            .save(&args.config)
            .with_context(|| format!("failed to save {}", args.config.display()))?;
        info!(path = %args.config.display(), "saved config");
    }

    let options = merged.resolve()?;
    debug!(?options, "resolved options");

    if let Some(command) = &options.build {
        run_build_command(command)?;
    }

    let source = HtmlPageSource::new(&options.input);
    let summary = Pipeline::new(options)
        .run(&source)
        .context("publication failed")?;

    print_summary(&summary);
    Ok(!summary.has_errors())
}

fn print_summary(summary: &RunSummary) {
    if summary.dry_run {
        println!("Dry run: nothing was written.");
    }
    println!("Processed: {}", summary.processed);
    println!("Written:   {}", summary.written);
    println!("Skipped:   {}", summary.skipped);
    println!("Errors:    {}", summary.errors.len());
    if !summary.pruned.is_empty() {
        println!("Pruned:    {}", summary.pruned.len());
    }
    for failure in &summary.errors {
        eprintln!("  {failure}");
    }
    println!("Merkle root: {}", display_root(&summary.merkle_root));
    if let Some(path) = &summary.index_path {
        println!("Index: {}", path.display());
    }
}

/// Returns whether the publication verified
fn cmd_verify(args: &VerifyArgs) -> Result<bool> {
    let root = args.public_root();
    let report = verify_index(&args.index, &root)?;
    print_report(&report);
    Ok(report.is_valid())
}

fn print_report(report: &VerificationReport) {
    println!("Modules checked: {}", report.modules_checked);
    for failure in &report.failures {
        println!("  FAIL {}: {}", failure.public_path, failure.fault);
    }
    println!("Declared root: {}", display_root(&report.declared_root));
    println!("Computed root: {}", display_root(&report.computed_root));
    if !report.order_matches {
        println!("Module order is not canonical");
    }
    println!("Valid: {}", report.is_valid());
}

fn display_root(root: &str) -> &str {
    if root.is_empty() {
        "(empty)"
    } else {
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use langshake_test_utils::{json_ld_page, TestSite};
    use serde_json::json;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn publish_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "langshake",
            "publish",
            "--input",
            "out",
            "--out",
            "public/langshake",
            "--public-prefix",
            "ld",
            "--dry-run",
        ])
        .unwrap();
        let Commands::Publish(args) = cli.command else {
            panic!("expected publish");
        };
        let overrides = args.overrides();

        assert_eq!(overrides.input, Some(PathBuf::from("out")));
        assert_eq!(overrides.public_prefix.as_deref(), Some("ld"));
        assert_eq!(overrides.dry_run, Some(true));
        assert_eq!(overrides.force, None);
        assert_eq!(args.config, PathBuf::from(CONFIG_FILE));
    }

    #[test]
    fn short_flags_and_build() {
        let cli = Cli::try_parse_from([
            "langshake",
            "publish",
            "-i",
            "out",
            "-o",
            "public/langshake",
            "--build",
            "npm run export",
        ])
        .unwrap();
        let Commands::Publish(args) = cli.command else {
            panic!("expected publish");
        };
        let overrides = args.overrides();

        assert_eq!(overrides.input, Some(PathBuf::from("out")));
        assert_eq!(overrides.out, Some(PathBuf::from("public/langshake")));
        assert_eq!(overrides.build.as_deref(), Some("npm run export"));
    }

    #[test]
    fn unset_flag_keeps_file_value() {
        let file = Config {
            force: Some(true),
            ..Config::default()
        };
        let merged = file.merge(PublishArgs::default().overrides());
        assert_eq!(merged.force, Some(true));
    }

    #[test]
    fn verify_root_defaults_to_public_dir() {
        let cli = Cli::try_parse_from([
            "langshake",
            "verify",
            "--index",
            "public/.well-known/llm.json",
        ])
        .unwrap();
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.public_root(), PathBuf::from("public"));
    }

    #[test]
    fn publish_then_verify_site() {
        let site = TestSite::new();
        site.add_json_ld_page("about.html", &[json!({"@type": "AboutPage", "name": "About"})]);

        let args = PublishArgs {
            input: Some(site.input_dir()),
            out: Some(site.out_dir()),
            llm: Some(site.index_path()),
            cache: Some(site.cache_path()),
            config: site.root().join(CONFIG_FILE),
            save_config: true,
            ..PublishArgs::default()
        };
        assert!(cmd_publish(&args).unwrap());
        assert!(site.root().join(CONFIG_FILE).is_file());

        let verify = VerifyArgs {
            index: site.index_path(),
            root: None,
            verbose: false,
        };
        assert!(cmd_verify(&verify).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn build_runs_before_extraction() {
        let site = TestSite::new();
        let page = json_ld_page(&[json!({"@type": "AboutPage", "name": "Built"})]);
        let args = PublishArgs {
            input: Some(site.input_dir()),
            out: Some(site.out_dir()),
            llm: Some(site.index_path()),
            cache: Some(site.cache_path()),
            build: Some(format!(
                "printf '%s' '{page}' > '{}'",
                site.input_dir().join("about.html").display()
            )),
            config: site.root().join(CONFIG_FILE),
            ..PublishArgs::default()
        };
        assert!(cmd_publish(&args).unwrap());
        assert_eq!(site.read_artifact("about")[0]["name"], "Built");
    }

    #[cfg(unix)]
    #[test]
    fn failed_build_aborts_with_its_code() {
        let site = TestSite::new();
        site.add_json_ld_page("about.html", &[json!({"@type": "AboutPage"})]);
        let args = PublishArgs {
            input: Some(site.input_dir()),
            out: Some(site.out_dir()),
            llm: Some(site.index_path()),
            cache: Some(site.cache_path()),
            build: Some("exit 7".into()),
            config: site.root().join(CONFIG_FILE),
            ..PublishArgs::default()
        };

        let err = cmd_publish(&args).unwrap_err();
        let build = err.downcast_ref::<BuildError>().unwrap();
        assert_eq!(build.exit_code(), 7);
        assert!(!site.index_path().exists());
        assert!(!site.out_dir().join("about.json").exists());
    }

    #[test]
    fn publish_without_required_options_fails() {
        let site = TestSite::new();
        let args = PublishArgs {
            config: site.root().join(CONFIG_FILE),
            ..PublishArgs::default()
        };
        let err = cmd_publish(&args).unwrap_err();
        assert!(err.to_string().contains("--input"));
    }
}
