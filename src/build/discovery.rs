//! Source file discovery for the build system.
//!
//! Finds `.lua` files under a source or library root.

use glob::glob;
use std::path::{Path, PathBuf};

/// Error during source discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, #[source] glob::PatternError),
    /// IO error during file enumeration
    #[error("IO error during discovery: {0}")]
    Io(#[from] std::io::Error),
}

/// Discover Lua files matching a glob pattern.
///
/// # Arguments
/// - `base_dir` - Base directory to resolve patterns from
/// - `pattern` - Glob pattern to match
///
/// # Returns
/// Matching file paths, sorted. A missing `base_dir` yields no files.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !base_dir.is_dir() {
        return Ok(Vec::new());
    }

    let escaped = glob::Pattern::escape(&base_dir.to_string_lossy());
    let full_pattern = format!("{}/{}", escaped.trim_end_matches('/'), pattern);

    let paths =
        glob(&full_pattern).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() && is_lua_file(&path) {
                    files.push(path);
                }
            }
            Err(e) => {
                // Log but continue on glob errors
                tracing::warn!("error reading path: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Discover every Lua file below a root.
pub fn discover_lua_files(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    discover_files(root, "**/*.lua")
}

/// Check if a path is a Lua source file.
pub fn is_lua_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("lua"))
}

/// Path of `path` relative to `root`, with `/` separators.
pub fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
