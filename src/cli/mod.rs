//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod analyze;
mod build;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::version::GameVersion;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// wowlua - Build World of Warcraft add-ons from annotated Lua sources
#[derive(Parser)]
#[command(name = "wowlua")]
#[command(about = "wowlua - Build World of Warcraft add-ons from annotated Lua sources")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the add-on for every configured game version
    Build {
        /// Override source directory
        #[arg(long)]
        src: Option<PathBuf>,

        /// Override library directory
        #[arg(long)]
        lib: Option<PathBuf>,

        /// Override output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Only build these game versions (repeatable)
        #[arg(short, long = "target", value_name = "VERSION")]
        targets: Vec<GameVersion>,

        /// Watch for changes and rebuild
        #[arg(short, long)]
        watch: bool,

        /// Show stage timings and debug logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the globals each file uses, declares and imports, and the resolved order
    Analyze {
        /// Only report these files (relative names such as `Core.lua`)
        files: Vec<String>,

        /// Only resolve these game versions (repeatable)
        #[arg(short, long = "target", value_name = "VERSION")]
        targets: Vec<GameVersion>,

        /// Show debug logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Initialize a new add-on project
    Init {
        /// Project directory (default: current directory)
        path: Option<PathBuf>,

        /// Add-on name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Build { verbose, .. } | Commands::Analyze { verbose, .. } => *verbose,
            Commands::Init { .. } => false,
        }
    }
}

/// Install the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "wowlua=debug" } else { "wowlua=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be set when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Parse arguments and run the selected command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.command.verbose());

    match cli.command {
        Commands::Build { src, lib, out, targets, watch, verbose } => {
            let args = build::BuildArgs { src, lib, out, targets, verbose };
            if watch {
                build::run_watch(&args)
            } else {
                build::run_build(&args)
            }
        }
        Commands::Analyze { files, targets, verbose: _ } => analyze::run_analyze(&files, &targets),
        Commands::Init { path, name } => build::run_init(path.as_deref(), name.as_deref()),
    }
}
