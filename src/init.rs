//! Project initialization for wowlua
//!
//! Scaffolds a new add-on project: `wowlua.toml`, a starter `src/Core.lua`,
//! an empty `libs/` directory and a `.gitignore`.

use crate::config::CONFIG_FILE_NAME;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error during project initialization
#[derive(Debug, Error)]
pub enum InitError {
    /// Directory already exists
    #[error("Directory already exists: {0}")]
    DirectoryExists(String),
    /// Failed to create directory
    #[error("Failed to create directory: {0}")]
    CreateDir(std::io::Error),
    /// Failed to write file
    #[error("Failed to write file: {0}")]
    WriteFile(std::io::Error),
    /// Name cannot be used as an add-on name
    #[error("Invalid add-on name '{0}': use letters, digits, '_' or '-'")]
    InvalidName(String),
}

/// Initialize a new add-on project.
///
/// # Arguments
/// - `path` - Directory to create the project in
/// - `name` - Add-on name (used in wowlua.toml and as the manifest prefix)
///
/// # Returns
/// - `Ok(())` on success
/// - `Err(InitError)` if initialization fails
///
/// # Example
/// ```ignore
/// init_project(Path::new("Bagger"), "Bagger")?;
/// ```
pub fn init_project(path: &Path, name: &str) -> Result<(), InitError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(InitError::InvalidName(name.to_string()));
    }

    // Check if directory already exists and is not empty
    if path.exists() {
        let is_empty = path.read_dir().map(|mut d| d.next().is_none()).unwrap_or(false);
        if !is_empty {
            return Err(InitError::DirectoryExists(path.display().to_string()));
        }
    }

    create_dir(path)?;
    create_dir(&path.join("src"))?;
    create_dir(&path.join("libs"))?;

    write_file(&path.join(CONFIG_FILE_NAME), &generate_config(name))?;
    write_file(&path.join(".gitignore"), &generate_gitignore())?;
    write_file(&path.join("src/Core.lua"), &generate_core(name))?;

    Ok(())
}

/// Create a directory and all parent directories.
fn create_dir(path: &Path) -> Result<(), InitError> {
    fs::create_dir_all(path).map_err(InitError::CreateDir)
}

/// Write content to a file.
fn write_file(path: &Path, content: &str) -> Result<(), InitError> {
    fs::write(path, content).map_err(InitError::WriteFile)
}

fn generate_config(name: &str) -> String {
    format!(
        r#"[project]
name = "{}"
version = "0.1.0"
author = ""
description = ""
saved_variables = []
game_versions = ["Classic", "Wrath", "Retail"]

[variables]
DEBUG = false
"#,
        name
    )
}

fn generate_gitignore() -> String {
    r#"# wowlua build output
build/

# OS files
.DS_Store
Thumbs.db
"#
    .to_string()
}

/// Global table name for the starter file: the add-on name without dashes.
fn addon_table(name: &str) -> String {
    let table: String = name.chars().filter(|c| *c != '-').collect();
    match table.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{}", table),
        _ => table,
    }
}

fn generate_core(name: &str) -> String {
    let table = addon_table(name);
    format!(
        r#"local addonName = @ADDON_NAME@

{table} = {{}}
{table}.debug = @DEBUG@

function {table}:OnLoad()
    print(addonName .. " loaded")
end

local frame = CreateFrame("Frame")
frame:RegisterEvent("PLAYER_LOGIN")
frame:SetScript("OnEvent", function()
    {table}:OnLoad()
end)
"#,
        table = table
    )
}
