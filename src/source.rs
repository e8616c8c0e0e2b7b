//! Source registry: Lua files loaded for one build.
//!
//! A [`SourceFile`] is created fresh on every build. Its original lines are
//! immutable once loaded; the processed lines are rewritten by the
//! preprocessor and are what gets parsed and emitted. Both buffers sit behind
//! an `Arc` so version variants can share them with their base file until
//! one side rewrites its copy.

use crate::build::discovery::{discover_lua_files, relative_name, DiscoveryError};
use crate::lua::Chunk;
use crate::variable::Variable;
use crate::version::GameVersion;
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Error loading sources from disk.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

/// One Lua file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Root directory the file was loaded from
    pub path: PathBuf,
    /// Path relative to `path`, `/`-separated
    pub file_name: String,
    pub original_lines: Arc<Vec<String>>,
    pub processed_lines: Arc<Vec<String>>,
    pub used_globals: IndexSet<String>,
    pub declared_globals: IndexSet<String>,
    pub imported_globals: IndexSet<String>,
    pub is_version_specific: bool,
    pub applicable_versions: BTreeSet<GameVersion>,
    /// Version this file is a variant for, if it was cloned from a base file
    pub variant: Option<GameVersion>,
    pub is_library: bool,
    /// Marked by the `Skip` directive; filtered out after preprocessing
    pub excluded: bool,
    pub symbol_table: IndexMap<String, Variable>,
    pub ast: Option<Chunk>,
}

impl SourceFile {
    /// Create a file from its text, normalizing line endings.
    pub fn new(path: impl Into<PathBuf>, file_name: impl Into<String>, contents: &str) -> Self {
        let lines: Vec<String> = contents.replace("\r\n", "\n").split('\n').map(String::from).collect();
        let lines = Arc::new(lines);
        Self {
            path: path.into(),
            file_name: file_name.into(),
            original_lines: Arc::clone(&lines),
            processed_lines: lines,
            used_globals: IndexSet::new(),
            declared_globals: IndexSet::new(),
            imported_globals: IndexSet::new(),
            is_version_specific: false,
            applicable_versions: BTreeSet::new(),
            variant: None,
            is_library: false,
            excluded: false,
            symbol_table: IndexMap::new(),
            ast: None,
        }
    }

    /// Mark as a library file.
    pub fn library(mut self) -> Self {
        self.is_library = true;
        self
    }

    /// Unique key of the file: its root joined with its relative name.
    pub fn id(&self) -> String {
        format!("{}/{}", self.path.display(), self.file_name)
    }

    /// Processed text as handed to the parser.
    pub fn processed_text(&self) -> String {
        self.processed_lines.join("\n")
    }

    /// Replace the processed lines.
    pub fn set_processed(&mut self, lines: Vec<String>) {
        self.processed_lines = Arc::new(lines);
    }

    /// Mutable access to the processed lines, copying them if shared.
    pub fn processed_lines_mut(&mut self) -> &mut Vec<String> {
        Arc::make_mut(&mut self.processed_lines)
    }

    /// Restrict the file to a set of versions.
    pub fn restrict_to(&mut self, versions: impl IntoIterator<Item = GameVersion>) {
        self.is_version_specific = true;
        self.applicable_versions = versions.into_iter().collect();
    }

    /// Whether the file belongs in the output for `version`.
    pub fn is_applicable(&self, version: GameVersion) -> bool {
        !self.is_version_specific || self.applicable_versions.contains(&version)
    }

    /// Name of this file's variant for `version`: `Name.lua` becomes `Name_Version.lua`.
    pub fn variant_name(&self, version: GameVersion) -> String {
        let stem = self.file_name.strip_suffix(".lua").unwrap_or(&self.file_name);
        format!("{}_{}.lua", stem, version.name())
    }

    /// Clone this file into a variant for `version`.
    ///
    /// The clone shares both line buffers with `self`. Analysis results are
    /// not carried over.
    pub fn variant_for(&self, version: GameVersion) -> SourceFile {
        let mut clone = SourceFile {
            path: self.path.clone(),
            file_name: self.variant_name(version),
            original_lines: Arc::clone(&self.original_lines),
            processed_lines: Arc::clone(&self.processed_lines),
            used_globals: IndexSet::new(),
            declared_globals: IndexSet::new(),
            imported_globals: IndexSet::new(),
            is_version_specific: false,
            applicable_versions: BTreeSet::new(),
            variant: Some(version),
            is_library: self.is_library,
            excluded: false,
            symbol_table: IndexMap::new(),
            ast: None,
        };
        clone.restrict_to([version]);
        clone
    }
}

/// Load every Lua file below `root`.
///
/// A missing root yields an empty list; callers decide whether that is fatal.
pub fn load_sources(root: &Path) -> Result<Vec<SourceFile>, SourceError> {
    let mut files = Vec::new();
    for file_path in discover_lua_files(root)? {
        let contents = fs::read_to_string(&file_path)
            .map_err(|source| SourceError::Io { path: file_path.clone(), source })?;
        files.push(SourceFile::new(root, relative_name(root, &file_path), &contents));
    }
    tracing::debug!("loaded {} files from {}", files.len(), root.display());
    Ok(files)
}

/// Load every Lua file below `root` as library files.
pub fn load_libraries(root: &Path) -> Result<Vec<SourceFile>, SourceError> {
    Ok(load_sources(root)?.into_iter().map(SourceFile::library).collect())
}
