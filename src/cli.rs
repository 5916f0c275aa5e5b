//! Command-line interface for implgen.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::locate;
use crate::report::{self, Format};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Build a resolved model of the interfaces and structs in a Go source file.
///
/// Embedded interfaces are followed into auxiliary files and other packages,
/// which are located through go.mod, vendor directories, the module cache,
/// GOROOT and GOPATH.
#[derive(Parser)]
#[command(name = "implgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log resolution steps to stderr (same as IMPLGEN_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a source file and print its interfaces and structs
    #[command(visible_alias = "source")]
    Parse(ParseArgs),
    /// Print the import path of the package in a directory
    Locate(LocateArgs),
}

/// Arguments for the parse command.
#[derive(Parser)]
pub struct ParseArgs {
    /// Go source file to resolve
    pub source: PathBuf,

    /// Comma-separated name=path pairs of explicit imports to use
    #[arg(long)]
    pub imports: Option<String>,

    /// Comma-separated pkg=path pairs of auxiliary Go source files
    #[arg(long = "aux-files", visible_alias = "aux_files")]
    pub aux_files: Option<String>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: Format,
}

/// Arguments for the locate command.
#[derive(Parser)]
pub struct LocateArgs {
    /// Package directory (default: current directory)
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

/// Environment, then the config file, then command-line flags.
fn load_config(args: &ParseArgs) -> anyhow::Result<Config> {
    let mut config = Config::from_env();

    let discovered = match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let start = args.source.parent().unwrap_or_else(|| Path::new("."));
            let start = if start.as_os_str().is_empty() {
                Path::new(".")
            } else {
                start
            };
            config::discover(&start.canonicalize().unwrap_or_else(|_| start.to_path_buf()))
        }
    };
    if let Some(path) = discovered {
        tracing::debug!(config = %path.display(), "loading config file");
        config.merge(Config::parse_file(&path)?);
    }

    if let Some(flag) = &args.imports {
        config.add_imports_flag(flag)?;
    }
    if let Some(flag) = &args.aux_files {
        config.add_aux_files_flag(flag)?;
    }
    Ok(config)
}

pub fn run_parse(args: &ParseArgs) -> anyhow::Result<i32> {
    let config = load_config(args)?;
    let package = crate::source_mode(&args.source, &config)
        .with_context(|| format!("failed to resolve {}", args.source.display()))?;

    let source = args.source.display().to_string();
    match args.format {
        Format::Pretty => report::write_pretty(&source, &package),
        Format::Json => report::write_json(&source, &package)?,
    }
    Ok(EXIT_SUCCESS)
}

pub fn run_locate(args: &LocateArgs) -> anyhow::Result<i32> {
    let dir = args
        .dir
        .canonicalize()
        .with_context(|| format!("failed to read directory {}", args.dir.display()))?;
    let config = Config::from_env();
    let import_path = locate::package_import_of_dir(&dir, &config.go)?;
    println!("{}", import_path);
    Ok(EXIT_SUCCESS)
}
