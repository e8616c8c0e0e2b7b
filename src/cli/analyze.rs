//! Analyze command: report symbol sets and resolved order without writing output

use std::process::ExitCode;

use super::build::{load_project, Project};
use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::{BuildContext, BuildPipeline, BuildResult};
use crate::source::SourceFile;
use crate::version::GameVersion;

fn join(names: &indexmap::IndexSet<String>) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn print_file(file: &SourceFile) {
    let kind = if file.is_library { " (library)" } else { "" };
    println!("{}{}", file.file_name, kind);
    if file.is_version_specific {
        let versions: Vec<&str> = file.applicable_versions.iter().map(|v| v.name()).collect();
        println!("  versions: {}", versions.join(", "));
    }
    println!("  used:     {}", join(&file.used_globals));
    println!("  declared: {}", join(&file.declared_globals));
    println!("  imported: {}", join(&file.imported_globals));
}

/// Run the analyze command
pub(crate) fn run_analyze(files: &[String], targets: &[GameVersion]) -> ExitCode {
    let Project { config, root } = match load_project(false) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut context = BuildContext::new(config, root);
    if !targets.is_empty() {
        context = context.with_filter(targets.to_vec());
    }
    let versions = context.target_versions();
    let mut pipeline = BuildPipeline::new(context);

    if let Err(e) = pipeline.prepare(&mut BuildResult::new()) {
        eprintln!("Analysis failed: {}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    let context = pipeline.context();
    for name in files {
        if context.find_file(name).is_none() {
            eprintln!("Error: No source file named '{}'", name);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }

    for file in context.all_files() {
        let selected = if files.is_empty() { !file.is_library } else { files.contains(&file.file_name) };
        if selected {
            print_file(file);
        }
    }

    for version in versions {
        let plan = match pipeline.resolve_target(version) {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("Analysis failed for {}: {}", version, e);
                return ExitCode::from(EXIT_ERROR);
            }
        };

        println!();
        println!("{} (Interface {}):", version, plan.target.interface);
        for (index, file) in plan.files.iter().enumerate() {
            println!("  {:>3}. {}", index + 1, file.file_name);
        }
        for warning in &plan.warnings {
            println!("  warning: {}", warning);
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}
