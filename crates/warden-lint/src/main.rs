//! warden-lint - Validate warden rule files.
//!
//! Each argument is a rule file or a directory of `.yaml`/`.yml` rule files.
//! One line is printed per file:
//!
//! ```text
//! ok: rules/spiders.yaml (spiders-are-spooky)
//! error: rules/broken.yaml: Invalid rule: Invalid target rank. Must be 1-4.
//! ```
//!
//! The exit status is non-zero when any file fails.
//!
//! # Configuration
//!
//! - `--config` / `WARDEN_CONFIG` - Optional config file, defaults to the platform config
//!   directory's `warden/warden.toml` when it exists
//! - `WARDEN_*` - Individual overrides, see `WardenConfig::from_env`
//! - `RUST_LOG` - Log filter, logs go to stderr

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden_core::{ParseOptions, Rule, WardenConfig};

/// Validate warden rule files.
#[derive(Debug, Parser)]
#[command(name = "warden-lint", version, about)]
struct Args {
    /// Refuse deprecated conditions and actions, as when a moderator
    /// submits a new rule
    #[arg(long)]
    authored: bool,

    /// Config file (TOML, JSON or YAML)
    #[arg(long, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Rule files, or directories of .yaml/.yml rule files
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn load_config(path: Option<PathBuf>) -> Result<WardenConfig> {
    let path = path.or_else(|| Some(WardenConfig::default_path()).filter(|p| p.exists()));

    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            WardenConfig::from_file(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        }
        None => WardenConfig::from_env().context("invalid WARDEN_* environment"),
    }
}

/// Rule files named by `path`: the file itself, or the YAML files directly
/// inside a directory, sorted.
fn collect(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)
        .with_context(|| format!("failed to read directory {}", path.display()))?
    {
        let file = entry?.path();
        let is_yaml = matches!(
            file.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        if file.is_file() && is_yaml {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

/// `Ok(rule name)` or the reason the file is not a valid rule.
fn lint_file(path: &Path, options: &ParseOptions) -> Result<String, String> {
    let source = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let rule = Rule::parse_with(&source, options).map_err(|e| e.to_string())?;
    debug!(path = %path.display(), rule = %rule.name, "rule parsed");
    Ok(rule.name)
}

fn run(args: Args) -> Result<bool> {
    let config = load_config(args.config)?;
    let options = ParseOptions {
        authored: args.authored,
        ..config.parse_options()
    };

    let mut clean = true;
    for path in &args.paths {
        for file in collect(path)? {
            match lint_file(&file, &options) {
                Ok(name) => println!("ok: {} ({name})", file.display()),
                Err(reason) => {
                    clean = false;
                    println!("error: {}: {reason}", file.display());
                }
            }
        }
    }
    Ok(clean)
}

fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to stderr (stdout carries the results)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(2)
        }
    }
}
