//! Build result types.
//!
//! Contains types for representing the outcome of build operations.

use crate::build::UnknownGlobal;
use crate::version::GameVersion;
use std::path::PathBuf;
use std::time::Duration;

/// Result of building a single target.
#[derive(Debug, Clone)]
pub struct TargetResult {
    /// Version that was built
    pub version: GameVersion,
    /// Output files produced
    pub outputs: Vec<PathBuf>,
    /// Emitted source files in import order
    pub files: Vec<String>,
    /// Build duration
    pub duration: Duration,
    /// Unknown globals found for this target
    pub warnings: Vec<UnknownGlobal>,
}

impl TargetResult {
    /// Create a successful result.
    pub fn success(version: GameVersion, outputs: Vec<PathBuf>, files: Vec<String>, duration: Duration) -> Self {
        Self { version, outputs, files, duration, warnings: vec![] }
    }

    /// Add warnings to the result.
    pub fn with_warnings(mut self, warnings: Vec<UnknownGlobal>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// Time spent in one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    /// Stage label, e.g. "preprocess" or "target Classic"
    pub stage: String,
    pub duration: Duration,
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each target
    pub targets: Vec<TargetResult>,
    /// Per-stage durations, in execution order
    pub timings: Vec<StageTiming>,
    /// Total build duration
    pub total_duration: Duration,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target result.
    pub fn add_result(&mut self, result: TargetResult) {
        self.targets.push(result);
    }

    /// Record a stage duration.
    pub fn add_timing(&mut self, stage: impl Into<String>, duration: Duration) {
        let stage = stage.into();
        tracing::debug!("{} took {:?}", stage, duration);
        self.timings.push(StageTiming { stage, duration });
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    /// Get the result for one version.
    pub fn target(&self, version: GameVersion) -> Option<&TargetResult> {
        self.targets.iter().find(|t| t.version == version)
    }

    /// Get the number of built targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Get the total number of warnings across all targets.
    pub fn warning_count(&self) -> usize {
        self.targets.iter().map(|r| r.warnings.len()).sum()
    }

    /// All output paths.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.targets.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    /// Get all warnings.
    pub fn all_warnings(&self) -> Vec<&UnknownGlobal> {
        self.targets.iter().flat_map(|r| r.warnings.iter()).collect()
    }

    /// Format a summary of the build result.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let versions: Vec<&str> = self.targets.iter().map(|r| r.version.name()).collect();
        lines.push(format!(
            "Built {} target(s) [{}], {} warning(s) in {:.2}s",
            self.target_count(),
            versions.join(", "),
            self.warning_count(),
            self.total_duration.as_secs_f64()
        ));

        let warnings = self.all_warnings();
        for warning in warnings.iter().take(5) {
            lines.push(format!("  - {}", warning));
        }
        if warnings.len() > 5 {
            lines.push(format!("  ... and {} more", warnings.len() - 5));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(symbol: &str) -> UnknownGlobal {
        UnknownGlobal { file: "/src/A.lua".into(), symbol: symbol.into() }
    }

    #[test]
    fn test_target_result_with_warnings() {
        let result = TargetResult::success(
            GameVersion::Classic,
            vec![PathBuf::from("build/A_Classic.toc")],
            vec!["A.lua".into()],
            Duration::from_millis(5),
        )
        .with_warnings(vec![warning("Foo")]);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.files, vec!["A.lua"]);
    }

    #[test]
    fn test_build_result_counts() {
        let mut result = BuildResult::new();
        result.add_result(
            TargetResult::success(GameVersion::Classic, vec![PathBuf::from("a")], vec![], Duration::ZERO)
                .with_warnings(vec![warning("Foo"), warning("Bar")]),
        );
        result.add_result(TargetResult::success(
            GameVersion::Retail,
            vec![PathBuf::from("b"), PathBuf::from("c")],
            vec![],
            Duration::ZERO,
        ));

        assert_eq!(result.target_count(), 2);
        assert_eq!(result.warning_count(), 2);
        assert_eq!(result.all_outputs().len(), 3);
        assert!(result.target(GameVersion::Retail).is_some());
        assert!(result.target(GameVersion::Wrath).is_none());
    }

    #[test]
    fn test_build_result_timings() {
        let mut result = BuildResult::new();
        result.add_timing("load", Duration::from_millis(1));
        result.add_timing("analyze", Duration::from_millis(2));

        assert_eq!(result.timings.len(), 2);
        assert_eq!(result.timings[1].stage, "analyze");
    }

    #[test]
    fn test_build_result_summary() {
        let mut result = BuildResult::new();
        result.add_result(TargetResult::success(GameVersion::Classic, vec![], vec![], Duration::ZERO));
        let result = result.with_duration(Duration::from_millis(1500));

        let summary = result.summary();
        assert!(summary.contains("1 target(s) [Classic]"));
        assert!(summary.contains("0 warning(s)"));
        assert!(summary.contains("1.50s"));
    }
}
