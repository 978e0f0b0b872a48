use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::parser::is_source_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "xunit-explorer")]
#[command(about = "Discover xUnit tests and reconcile them against stable test identities", long_about = None)]
pub struct Args {
    /// Project directory or single C# file to scan
    #[arg(long, value_name = "PATH")]
    pub path: PathBuf,

    /// Attribute conventions file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Test assembly location (defaults to <path>/bin/<name>.dll)
    #[arg(long, value_name = "FILE")]
    pub assembly: Option<PathBuf>,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'O', long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Output format (json, text)
    #[arg(short = 'f', long, default_value = "json")]
    pub format: OutputFormat,

    /// Rescan the tree this many times against the same registry
    #[arg(long, default_value_t = 1)]
    pub passes: usize,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        validate_path(&self.path)?;
        if self.path.is_file() && !is_source_file(&self.path) {
            anyhow::bail!("Not a C# source file: {}", self.path.display());
        }
        if let Some(ref config) = self.config {
            if !config.exists() {
                anyhow::bail!("Conventions file does not exist: {}", config.display());
            }
        }
        if self.passes == 0 {
            anyhow::bail!("--passes must be at least 1");
        }
        Ok(())
    }
}

pub fn validate_path(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        std::fs::metadata(path).with_context(|| format!("Cannot read file: {}", path.display()))?;
    } else if path.is_dir() {
        std::fs::metadata(path)
            .with_context(|| format!("Cannot read directory: {}", path.display()))?;
    } else {
        anyhow::bail!("Path is neither a file nor a directory: {}", path.display());
    }

    Ok(())
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        }
    }
}
