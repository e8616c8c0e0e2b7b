//! Build command implementations (build, watch, init)

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildContext, BuildError, BuildPipeline, BuildResult};
use crate::config::loader::{
    default_config, find_config, load_config, merge_cli_overrides, project_root, CliOverrides, ConfigError,
};
use crate::config::WowluaConfig;
use crate::version::GameVersion;

/// Arguments shared by `build` and `build --watch`.
#[derive(Debug, Clone, Default)]
pub(crate) struct BuildArgs {
    pub src: Option<PathBuf>,
    pub lib: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub targets: Vec<GameVersion>,
    pub verbose: bool,
}

/// Loaded project: configuration and the directory it applies to.
pub(crate) struct Project {
    pub config: WowluaConfig,
    pub root: PathBuf,
}

/// Find and load wowlua.toml, falling back to defaults in the current directory.
pub(crate) fn load_project(verbose: bool) -> Result<Project, ConfigError> {
    match find_config() {
        Some(config_path) => {
            if verbose {
                println!("Using config: {}", config_path.display());
            }
            let config = load_config(Some(&config_path))?;
            let root = project_root(&config_path)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            Ok(Project { config, root })
        }
        None => {
            if verbose {
                println!("No wowlua.toml found, using defaults");
            }
            let root = std::env::current_dir().unwrap_or_default();
            Ok(Project { config: default_config(), root })
        }
    }
}

fn build_context(args: &BuildArgs) -> Result<BuildContext, ConfigError> {
    let Project { mut config, root } = load_project(args.verbose)?;

    // Apply CLI overrides to config
    let overrides = CliOverrides {
        src: args.src.clone(),
        lib: args.lib.clone(),
        out: args.out.clone(),
        game_versions: None,
    };
    merge_cli_overrides(&mut config, &overrides);

    let context = BuildContext::new(config, root).with_verbose(args.verbose);
    Ok(if args.targets.is_empty() { context } else { context.with_filter(args.targets.clone()) })
}

/// Run one full build with the current configuration.
fn build_once(args: &BuildArgs) -> Result<BuildResult, BuildError> {
    BuildPipeline::new(build_context(args)?).build()
}

fn print_timings(result: &BuildResult) {
    for timing in &result.timings {
        println!("  {:<16} {:?}", timing.stage, timing.duration);
    }
}

/// Run the build command
pub(crate) fn run_build(args: &BuildArgs) -> ExitCode {
    let context = match build_context(args) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut pipeline = BuildPipeline::new(context);
    match pipeline.build() {
        Ok(result) => {
            println!("{}", result.summary());
            if args.verbose {
                print_timings(&result);
                for target in &result.targets {
                    println!("  {}: {}", target.version, target.files.join(", "));
                }
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Build failed: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the build command in watch mode
pub(crate) fn run_watch(args: &BuildArgs) -> ExitCode {
    use crate::watch::{watch_and_rebuild, WatchOptions};

    let context = match build_context(args) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let options = WatchOptions {
        src_dir: context.src_dir(),
        lib_dir: context.lib_dir(),
        project_root: Some(context.project_root().to_path_buf()),
        config: context.config().watch.clone(),
    };

    println!("Starting watch mode...");
    println!("Press Ctrl+C to stop");
    println!();

    // The config is reloaded on every rebuild so wowlua.toml edits apply.
    match watch_and_rebuild(options, || build_once(args)) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Watch error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the init command
pub(crate) fn run_init(path: Option<&Path>, name: Option<&str>) -> ExitCode {
    use crate::init::{init_project, InitError};

    // Determine project path
    let project_path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    // Determine project name
    let project_name = name
        .map(|n| n.to_string())
        .or_else(|| project_path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "MyAddon".to_string());

    match init_project(&project_path, &project_name) {
        Ok(()) => {
            println!("Created add-on '{}' at {}", project_name, project_path.display());
            println!();
            println!("Project structure:");
            println!("  {}/", project_path.display());
            println!("  ├── wowlua.toml");
            println!("  ├── .gitignore");
            println!("  ├── libs/");
            println!("  └── src/");
            println!("      └── Core.lua");
            println!();
            println!("Next steps:");
            println!("  cd {}", project_path.display());
            println!("  wowlua build");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(InitError::DirectoryExists(dir)) => {
            eprintln!("Error: Directory '{}' already exists and is not empty", dir);
            eprintln!("Use an empty directory or specify a different path");
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
