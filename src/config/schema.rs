//! Configuration schema types for `wowlua.toml`
//!
//! Defines the structure and validation rules for add-on project configuration.

use crate::version::GameVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Add-on name (required), used as the manifest title and file prefix
    pub name: String,
    /// Add-on version
    #[serde(default = "default_version")]
    pub version: String,
    /// Author written to the manifest
    #[serde(default)]
    pub author: String,
    /// Description written to the manifest notes
    #[serde(default)]
    pub description: String,
    /// Saved variables declared in the manifest
    #[serde(default)]
    pub saved_variables: Vec<String>,
    /// Source directory for .lua files
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Library directory
    #[serde(default = "default_lib")]
    pub lib: PathBuf,
    /// Build output directory
    #[serde(default = "default_out")]
    pub out: PathBuf,
    /// Game versions to build
    #[serde(default = "default_game_versions")]
    pub game_versions: Vec<GameVersion>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_lib() -> PathBuf {
    PathBuf::from("libs")
}

fn default_out() -> PathBuf {
    PathBuf::from("build")
}

fn default_game_versions() -> Vec<GameVersion> {
    vec![GameVersion::Wrath]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "addon".to_string(),
            version: default_version(),
            author: String::new(),
            description: String::new(),
            saved_variables: Vec::new(),
            src: default_src(),
            lib: default_lib(),
            out: default_out(),
            game_versions: default_game_versions(),
        }
    }
}

/// A build variable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl VariableValue {
    /// Render as a Lua literal; strings are quoted.
    pub fn to_lua(&self) -> String {
        match self {
            VariableValue::Boolean(b) => b.to_string(),
            VariableValue::Integer(i) => i.to_string(),
            VariableValue::Float(f) => f.to_string(),
            VariableValue::String(s) => {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n"))
            }
        }
    }
}

/// Per-version overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionConfig {
    /// Interface id written to the manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// JSON file replacing the bundled known-globals table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub globals: Option<PathBuf>,
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear screen between rebuilds
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            clear_screen: true,
        }
    }
}

/// Complete wowlua.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WowluaConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Build-time substitution variables
    #[serde(default)]
    pub variables: BTreeMap<String, VariableValue>,
    /// Per-version overrides
    #[serde(default)]
    pub versions: BTreeMap<GameVersion, VersionConfig>,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "project.game_versions")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wowlua.toml: '{}' {}", self.field, self.message)
    }
}

impl WowluaConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "project.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.project.game_versions.is_empty() {
            errors.push(ConfigValidationError {
                field: "project.game_versions".to_string(),
                message: "must list at least one game version".to_string(),
            });
        }

        for (index, version) in self.project.game_versions.iter().enumerate() {
            if self.project.game_versions[..index].contains(version) {
                errors.push(ConfigValidationError {
                    field: "project.game_versions".to_string(),
                    message: format!("lists {} more than once", version),
                });
            }
        }

        for name in self.variables.keys() {
            if !crate::preprocess::is_identifier(name) {
                errors.push(ConfigValidationError {
                    field: format!("variables.{}", name),
                    message: "must be a valid identifier".to_string(),
                });
            }
        }

        for (version, overrides) in &self.versions {
            if let Some(interface) = &overrides.interface {
                if interface.is_empty() || !interface.chars().all(|c| c.is_ascii_digit()) {
                    errors.push(ConfigValidationError {
                        field: format!("versions.{}.interface", version),
                        message: "must be a numeric interface id".to_string(),
                    });
                }
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Interface id for a version, configured or default
    pub fn interface_for(&self, version: GameVersion) -> &str {
        self.versions
            .get(&version)
            .and_then(|v| v.interface.as_deref())
            .unwrap_or_else(|| version.default_interface())
    }

    /// Build variables, seeded with `ADDON_NAME` and `ADDON_VERSION`
    pub fn build_variables(&self) -> indexmap::IndexMap<String, VariableValue> {
        let mut variables = indexmap::IndexMap::new();
        variables.insert("ADDON_NAME".to_string(), VariableValue::String(self.project.name.clone()));
        variables.insert("ADDON_VERSION".to_string(), VariableValue::String(self.project.version.clone()));
        for (name, value) in &self.variables {
            variables.insert(name.clone(), value.clone());
        }
        variables
    }
}
