//! Built-in globals that never count as imports.
//!
//! Two sources feed this: the Lua language built-ins (version independent)
//! and the per-version table of engine-provided globals, shipped as JSON.

use crate::version::GameVersion;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Lua standard library names available in every game version.
pub const LUA_BUILTINS: &[&str] = &[
    "_G",
    "_VERSION",
    "assert",
    "collectgarbage",
    "coroutine",
    "debug",
    "error",
    "gcinfo",
    "getfenv",
    "getmetatable",
    "ipairs",
    "load",
    "loadstring",
    "math",
    "next",
    "os",
    "pairs",
    "pcall",
    "print",
    "rawequal",
    "rawget",
    "rawlen",
    "rawset",
    "select",
    "setfenv",
    "setmetatable",
    "string",
    "table",
    "tonumber",
    "tostring",
    "type",
    "unpack",
    "xpcall",
];

/// Check if a name is a Lua language built-in.
pub fn is_lua_builtin(name: &str) -> bool {
    LUA_BUILTINS.contains(&name)
}

/// Error loading a known-globals table.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GlobalsError {
    /// File could not be read
    #[error("Failed to read globals file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    /// File is not a JSON object
    #[error("Failed to parse globals file {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    /// JSON parsed but top-level value is not an object
    #[error("Globals file {0} must contain a JSON object")]
    NotAnObject(PathBuf),
}

/// Table of engine-provided global names for one game version.
#[derive(Debug, Clone, Default)]
pub struct KnownGlobals {
    names: HashSet<String>,
}

impl KnownGlobals {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundled table for a game version.
    pub fn bundled(version: GameVersion) -> Self {
        let json = match version {
            GameVersion::Classic => include_str!("../data/globals/classic.json"),
            GameVersion::Wrath => include_str!("../data/globals/wrath.json"),
            GameVersion::Retail => include_str!("../data/globals/retail.json"),
        };
        // Bundled files are checked by the tests below; a broken one yields an empty table.
        Self::from_json(json, Path::new(version.name())).unwrap_or_default()
    }

    /// Load a table from a JSON file. Only the object keys are used.
    pub fn load(path: &Path) -> Result<Self, GlobalsError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| GlobalsError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&contents, path)
    }

    fn from_json(json: &str, origin: &Path) -> Result<Self, GlobalsError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|source| GlobalsError::Json { path: origin.to_path_buf(), source })?;
        let object = value.as_object().ok_or_else(|| GlobalsError::NotAnObject(origin.to_path_buf()))?;
        Ok(Self { names: object.keys().cloned().collect() })
    }

    /// Check if a name is provided by the engine.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Check if a name is built in, either by the engine or by Lua itself.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.contains(name) || is_lua_builtin(name)
    }

    /// Number of names in the table.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table has no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownGlobals {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { names: iter.into_iter().map(Into::into).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_tables_parse() {
        for version in GameVersion::ALL {
            let globals = KnownGlobals::bundled(version);
            assert!(!globals.is_empty(), "bundled table for {} is empty", version);
            assert!(globals.contains("CreateFrame"));
        }
    }

    #[test]
    fn test_bundled_tables_differ() {
        assert!(KnownGlobals::bundled(GameVersion::Retail).contains("C_Container"));
        assert!(!KnownGlobals::bundled(GameVersion::Classic).contains("C_Container"));
    }

    #[test]
    fn test_load_uses_keys_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("globals.json");
        fs::write(&path, r#"{"Foo": 1, "Bar": {"nested": true}}"#).unwrap();

        let globals = KnownGlobals::load(&path).unwrap();
        assert_eq!(globals.len(), 2);
        assert!(globals.contains("Foo"));
        assert!(globals.contains("Bar"));
        assert!(!globals.contains("nested"));
    }

    #[test]
    fn test_load_rejects_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("globals.json");
        fs::write(&path, r#"["Foo"]"#).unwrap();

        assert!(matches!(KnownGlobals::load(&path), Err(GlobalsError::NotAnObject(_))));
    }

    #[test]
    fn test_is_builtin_includes_lua() {
        let globals: KnownGlobals = ["CreateFrame"].into_iter().collect();
        assert!(globals.is_builtin("CreateFrame"));
        assert!(globals.is_builtin("pairs"));
        assert!(!globals.is_builtin("MyAddon"));
    }
}
