//! Build target definitions.
//!
//! A build target is one game version: its interface id, its table of
//! engine-provided globals and the names of the manifest pair it produces.

use crate::config::WowluaConfig;
use crate::globals::KnownGlobals;
use crate::source::SourceFile;
use crate::version::GameVersion;

/// A game version to assemble output for.
#[derive(Debug, Clone)]
pub struct BuildTarget {
    /// Version this target builds
    pub version: GameVersion,
    /// Interface id written to the manifest
    pub interface: String,
    /// Engine-provided globals for this version
    pub globals: KnownGlobals,
}

impl BuildTarget {
    /// Create a target for a version.
    pub fn new(version: GameVersion, interface: impl Into<String>, globals: KnownGlobals) -> Self {
        Self { version, interface: interface.into(), globals }
    }

    /// Create a target using the configured interface id.
    pub fn from_config(config: &WowluaConfig, version: GameVersion, globals: KnownGlobals) -> Self {
        Self::new(version, config.interface_for(version), globals)
    }

    /// Unique identifier for this target (e.g., "Classic").
    pub fn id(&self) -> &'static str {
        self.version.name()
    }

    /// Manifest file name, e.g. `Bagger_Mainline.toc`.
    pub fn toc_name(&self, addon_name: &str) -> String {
        format!("{}_{}.toc", addon_name, self.version.toc_suffix())
    }

    /// Import manifest file name, e.g. `sourceMainline.xml`.
    pub fn xml_name(&self) -> String {
        format!("source{}.xml", self.version.toc_suffix())
    }

    /// Check if this target passes a version filter. An empty filter matches all.
    pub fn matches_filter(&self, filter: &[GameVersion]) -> bool {
        filter.is_empty() || filter.contains(&self.version)
    }

    /// Whether a file belongs in this target's output.
    pub fn includes(&self, file: &SourceFile) -> bool {
        file.is_applicable(self.version)
    }

    /// Copy the files applicable to this target, dropping imports the engine
    /// provides in this version.
    pub fn select_files(&self, files: &[SourceFile]) -> Vec<SourceFile> {
        files
            .iter()
            .filter(|f| self.includes(f))
            .map(|f| {
                let mut file = f.clone();
                file.imported_globals.retain(|name| !self.globals.contains(name));
                file
            })
            .collect()
    }
}
