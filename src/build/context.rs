//! Build context containing configuration and state for a build.

use crate::config::{VariableValue, WowluaConfig};
use crate::source::SourceFile;
use crate::version::GameVersion;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// The unit of work for one build invocation.
///
/// Holds the configuration and project root, plus the files loaded for this
/// build. Files are mutated in place as the pipeline advances; `output_files`
/// holds the ordered set of the target currently being assembled.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: WowluaConfig,
    /// Project root directory (where wowlua.toml is located)
    project_root: PathBuf,
    /// Whether to run in verbose mode
    verbose: bool,
    /// Optional filter to build specific versions only
    target_filter: Option<Vec<GameVersion>>,
    /// Add-on source files
    pub project_files: Vec<SourceFile>,
    /// Library source files
    pub library_files: Vec<SourceFile>,
    /// Build-time substitution variables
    pub variables: IndexMap<String, VariableValue>,
    /// Ordered files of the target being assembled
    pub output_files: Vec<SourceFile>,
}

impl BuildContext {
    /// Create a new build context.
    ///
    /// # Arguments
    /// - `config` - The loaded configuration
    /// - `project_root` - The project root directory
    pub fn new(config: WowluaConfig, project_root: PathBuf) -> Self {
        let variables = config.build_variables();
        Self {
            config,
            project_root,
            verbose: false,
            target_filter: None,
            project_files: Vec::new(),
            library_files: Vec::new(),
            variables,
            output_files: Vec::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &WowluaConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the source directory (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the library directory (resolved to absolute path).
    pub fn lib_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.lib)
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set target filter to build only specific versions.
    pub fn with_filter(mut self, versions: Vec<GameVersion>) -> Self {
        self.target_filter = Some(versions);
        self
    }

    /// Get the target filter.
    pub fn target_filter(&self) -> Option<&[GameVersion]> {
        self.target_filter.as_deref()
    }

    /// Configured versions that pass the target filter, in config order.
    pub fn target_versions(&self) -> Vec<GameVersion> {
        self.config
            .project
            .game_versions
            .iter()
            .copied()
            .filter(|v| self.target_filter.as_ref().map_or(true, |filter| filter.contains(v)))
            .collect()
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// All project and library files, project first.
    pub fn all_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.project_files.iter().chain(self.library_files.iter())
    }

    /// Find a file by its relative name, searching project files first.
    pub fn find_file(&self, file_name: &str) -> Option<&SourceFile> {
        self.all_files().find(|f| f.file_name == file_name)
    }
}
