//! Build pipeline orchestration.
//!
//! One build walks `Idle -> Loaded -> Preprocessed -> Analyzed`, then per
//! target `Graphed -> Diagnosed -> Assembled`, and ends in `Done`. Any error
//! moves the pipeline to `Failed` and aborts the remaining targets.

use crate::analyze::{AnalyzeError, Analyzer};
use crate::build::{
    assemble, check_unknown_globals, resolve_order, BuildContext, BuildOrderError, BuildResult, BuildTarget,
    TargetResult, UnknownGlobal,
};
use crate::config::ConfigError;
use crate::globals::{GlobalsError, KnownGlobals};
use crate::lua::{LuaParser, StandardParser};
use crate::preprocess::{PreprocessError, Preprocessor};
use crate::source::{load_libraries, load_sources, SourceError, SourceFile};
use crate::version::GameVersion;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Error during build execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// wowlua.toml could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Source loading error
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The source directory holds no Lua files
    #[error("No source files found in {}", .0.display())]
    NoSourceFiles(PathBuf),
    /// The target filter excludes every configured version
    #[error("No configured game version matches the target filter")]
    NoTargets,
    /// Output directory would remove the project or its sources
    #[error("Refusing to clear output directory {}: it contains the project sources", .0.display())]
    UnsafeOutDir(PathBuf),
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    /// Build order error (circular dependencies)
    #[error("Build order error: {0}")]
    BuildOrder(#[from] BuildOrderError),
    #[error(transparent)]
    Globals(#[from] GlobalsError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a build currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStage {
    Idle,
    Loaded,
    Preprocessed,
    Analyzed,
    Graphed(GameVersion),
    Diagnosed(GameVersion),
    Assembled(GameVersion),
    Done,
    /// Aborted with the given reason
    Failed(String),
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStage::Idle => write!(f, "idle"),
            BuildStage::Loaded => write!(f, "loaded"),
            BuildStage::Preprocessed => write!(f, "preprocessed"),
            BuildStage::Analyzed => write!(f, "analyzed"),
            BuildStage::Graphed(v) => write!(f, "graphed {}", v),
            BuildStage::Diagnosed(v) => write!(f, "diagnosed {}", v),
            BuildStage::Assembled(v) => write!(f, "assembled {}", v),
            BuildStage::Done => write!(f, "done"),
            BuildStage::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Ordered files and diagnostics for one target, before anything is written.
#[derive(Debug, Clone)]
pub struct TargetPlan {
    pub target: BuildTarget,
    /// Files in dependency order
    pub files: Vec<SourceFile>,
    pub warnings: Vec<UnknownGlobal>,
}

/// Build pipeline for executing builds.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
    parser: Box<dyn LuaParser>,
    preprocessor: Preprocessor,
    /// Known-globals tables replacing the configured or bundled ones
    globals: BTreeMap<GameVersion, KnownGlobals>,
    stage: BuildStage,
}

impl BuildPipeline {
    /// Create a new build pipeline with the standard parser and directives.
    pub fn new(context: BuildContext) -> Self {
        Self {
            context,
            parser: Box::new(StandardParser),
            preprocessor: Preprocessor::default(),
            globals: BTreeMap::new(),
            stage: BuildStage::Idle,
        }
    }

    /// Use a different Lua parser.
    pub fn with_parser(mut self, parser: Box<dyn LuaParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Use a different preprocessor (e.g. with extra directives).
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Use a fixed known-globals table for a version.
    pub fn with_globals(mut self, version: GameVersion, globals: KnownGlobals) -> Self {
        self.globals.insert(version, globals);
        self
    }

    /// Current stage.
    pub fn stage(&self) -> &BuildStage {
        &self.stage
    }

    /// Build context, with the files of the last run.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Run the build pipeline.
    ///
    /// Loads, preprocesses and analyzes every file, then resolves and
    /// assembles each target. The build directory is cleared once analysis
    /// succeeded; a later failure leaves it as is.
    pub fn build(&mut self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let mut result = BuildResult::new();

        match self.execute(&mut result) {
            Ok(()) => {
                self.stage = BuildStage::Done;
                Ok(result.with_duration(start.elapsed()))
            }
            Err(e) => {
                tracing::debug!("build aborted after stage: {}", self.stage);
                self.stage = BuildStage::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn execute(&mut self, result: &mut BuildResult) -> Result<(), BuildError> {
        let versions = self.context.target_versions();
        if versions.is_empty() {
            return Err(BuildError::NoTargets);
        }

        self.prepare(result)?;
        self.clean_out_dir()?;

        let out_dir = self.context.out_dir();
        for version in versions {
            let start = Instant::now();
            let plan = self.resolve_target(version)?;

            self.context.output_files = plan.files;
            let outputs = assemble(self.context.config(), &plan.target, &self.context.output_files, &out_dir)?;
            self.stage = BuildStage::Assembled(version);

            let files = self
                .context
                .output_files
                .iter()
                .filter(|f| plan.target.includes(f))
                .map(|f| f.file_name.clone())
                .collect();
            let duration = start.elapsed();
            result.add_timing(format!("target {}", version), duration);
            result.add_result(TargetResult::success(version, outputs, files, duration).with_warnings(plan.warnings));
        }

        Ok(())
    }

    /// Load, preprocess and analyze all files.
    ///
    /// Leaves the pipeline in `Analyzed`; nothing is written.
    pub fn prepare(&mut self, result: &mut BuildResult) -> Result<(), BuildError> {
        let start = Instant::now();
        let src_dir = self.context.src_dir();
        self.context.project_files = load_sources(&src_dir)?;
        if self.context.project_files.is_empty() {
            return Err(BuildError::NoSourceFiles(src_dir));
        }
        self.context.library_files = load_libraries(&self.context.lib_dir())?;
        self.context.output_files.clear();
        self.stage = BuildStage::Loaded;
        result.add_timing("load", start.elapsed());

        let start = Instant::now();
        self.preprocessor.run(&mut self.context)?;
        self.stage = BuildStage::Preprocessed;
        result.add_timing("preprocess", start.elapsed());

        let start = Instant::now();
        let analyzer = Analyzer::new(self.parser.as_ref());
        for files in [&mut self.context.project_files, &mut self.context.library_files] {
            files.par_iter_mut().try_for_each(|file| analyzer.analyze(file))?;
        }
        self.stage = BuildStage::Analyzed;
        result.add_timing("analyze", start.elapsed());

        Ok(())
    }

    /// Build the dependency graph and diagnostics for one version.
    ///
    /// Requires [`prepare`](Self::prepare) to have run.
    pub fn resolve_target(&mut self, version: GameVersion) -> Result<TargetPlan, BuildError> {
        let target = BuildTarget::from_config(self.context.config(), version, self.known_globals(version)?);
        let project = target.select_files(&self.context.project_files);
        let libraries = target.select_files(&self.context.library_files);

        let files = resolve_order(&project, &libraries)?;
        self.stage = BuildStage::Graphed(version);

        let warnings = check_unknown_globals(project.iter().chain(libraries.iter()));
        self.stage = BuildStage::Diagnosed(version);

        Ok(TargetPlan { target, files, warnings })
    }

    fn known_globals(&self, version: GameVersion) -> Result<KnownGlobals, BuildError> {
        if let Some(globals) = self.globals.get(&version) {
            return Ok(globals.clone());
        }
        let configured = self.context.config().versions.get(&version).and_then(|v| v.globals.as_ref());
        match configured {
            Some(path) => Ok(KnownGlobals::load(&self.context.resolve_path(path))?),
            None => Ok(KnownGlobals::bundled(version)),
        }
    }

    fn clean_out_dir(&self) -> Result<(), BuildError> {
        let out_dir = self.context.out_dir();
        let out = normalize_path(&out_dir);
        let root = normalize_path(self.context.project_root());
        let inputs = [normalize_path(&self.context.src_dir()), normalize_path(&self.context.lib_dir())];

        let overlaps_input = inputs.iter().any(|input| input.starts_with(&out) || out.starts_with(input));
        if root.starts_with(&out) || overlaps_input {
            return Err(BuildError::UnsafeOutDir(out_dir));
        }
        if out_dir.exists() {
            fs::remove_dir_all(&out_dir)?;
        }
        fs::create_dir_all(&out_dir)?;
        Ok(())
    }
}

/// `path` with `.` and `..` removed and symlinks resolved for the part that
/// exists.
fn normalize_path(path: &Path) -> PathBuf {
    let mut lexical = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(resolved) = existing.canonicalize() {
            return missing.iter().rev().fold(resolved, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return lexical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WowluaConfig;
    use tempfile::TempDir;

    fn create_test_context(files: &[(&str, &str)]) -> (TempDir, BuildContext) {
        let temp = TempDir::new().unwrap();
        let mut config = WowluaConfig::default();
        config.project.name = "Bagger".to_string();
        config.project.game_versions = vec![GameVersion::Classic, GameVersion::Retail];

        for (name, contents) in files {
            create_test_file(&temp.path().join("src"), name, contents);
        }

        let ctx = BuildContext::new(config, temp.path().to_path_buf());
        (temp, ctx)
    }

    fn create_test_file(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_build_pipeline_new() {
        let (_temp, ctx) = create_test_context(&[]);
        let pipeline = BuildPipeline::new(ctx);
        assert_eq!(pipeline.stage(), &BuildStage::Idle);
    }

    #[test]
    fn test_build_without_sources_fails() {
        let (_temp, ctx) = create_test_context(&[]);
        let mut pipeline = BuildPipeline::new(ctx);

        let result = pipeline.build();
        assert!(matches!(result, Err(BuildError::NoSourceFiles(_))));
        assert!(matches!(pipeline.stage(), BuildStage::Failed(_)));
    }

    #[test]
    fn test_build_orders_and_assembles() {
        let (temp, ctx) = create_test_context(&[("B.lua", "Foo()"), ("A.lua", "function Foo() end")]);
        let mut pipeline = BuildPipeline::new(ctx);

        let result = pipeline.build().unwrap();
        assert_eq!(pipeline.stage(), &BuildStage::Done);
        assert_eq!(result.target_count(), 2);
        assert_eq!(result.target(GameVersion::Classic).unwrap().files, vec!["A.lua", "B.lua"]);
        assert_eq!(result.warning_count(), 0);

        let toc = fs::read_to_string(temp.path().join("build/Bagger_Mainline.toc")).unwrap();
        assert!(toc.starts_with("## Interface: 90005\n"));
        assert!(temp.path().join("build/src/A.lua").exists());
        assert!(result.timings.iter().any(|t| t.stage == "analyze"));
    }

    #[test]
    fn test_target_filter() {
        let (temp, ctx) = create_test_context(&[("Core.lua", "x = 1")]);
        let mut pipeline = BuildPipeline::new(ctx.with_filter(vec![GameVersion::Retail]));

        let result = pipeline.build().unwrap();
        assert_eq!(result.target_count(), 1);
        assert!(!temp.path().join("build/Bagger_Classic.toc").exists());
    }

    #[test]
    fn test_target_filter_matching_nothing() {
        let (_temp, ctx) = create_test_context(&[("Core.lua", "x = 1")]);
        let mut pipeline = BuildPipeline::new(ctx.with_filter(vec![GameVersion::Wrath]));
        assert!(matches!(pipeline.build(), Err(BuildError::NoTargets)));
    }

    #[test]
    fn test_syntax_error_keeps_build_dir() {
        let (temp, ctx) = create_test_context(&[("Broken.lua", "function (")]);
        create_test_file(&temp.path().join("build"), "old.txt", "previous build");
        let mut pipeline = BuildPipeline::new(ctx);

        let err = pipeline.build().unwrap_err();
        assert!(matches!(err, BuildError::Analyze(_)));
        assert!(err.to_string().contains("Broken.lua"));
        assert!(temp.path().join("build/old.txt").exists());
    }

    #[test]
    fn test_cycle_is_fatal() {
        let (_temp, ctx) = create_test_context(&[("A.lua", "A = B"), ("B.lua", "B = A")]);
        let mut pipeline = BuildPipeline::new(ctx);
        assert!(matches!(pipeline.build(), Err(BuildError::BuildOrder(_))));
    }

    #[test]
    fn test_unknown_globals_are_warnings() {
        let (_temp, ctx) = create_test_context(&[("Core.lua", "Missing()\nMissing()\nCreateFrame('Frame')")]);
        let mut pipeline = BuildPipeline::new(ctx)
            .with_globals(GameVersion::Classic, ["CreateFrame"].into_iter().collect())
            .with_globals(GameVersion::Retail, KnownGlobals::new());

        let result = pipeline.build().unwrap();
        let classic = result.target(GameVersion::Classic).unwrap();
        assert_eq!(classic.warnings.len(), 1);
        assert_eq!(classic.warnings[0].symbol, "Missing");
        assert_eq!(result.target(GameVersion::Retail).unwrap().warnings.len(), 2);
    }

    #[test]
    fn test_configured_globals_file() {
        let (temp, mut ctx) = create_test_context(&[("Core.lua", "MyEngineThing()")]);
        create_test_file(temp.path(), "globals.json", r#"{"MyEngineThing": true}"#);

        let mut config = ctx.config().clone();
        config.project.game_versions = vec![GameVersion::Classic];
        config.versions.entry(GameVersion::Classic).or_default().globals = Some(PathBuf::from("globals.json"));
        ctx = BuildContext::new(config, temp.path().to_path_buf());

        let result = BuildPipeline::new(ctx).build().unwrap();
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_library_pulled_in_when_used() {
        let (temp, ctx) = create_test_context(&[("Core.lua", "local L = LibStub('x')")]);
        create_test_file(&temp.path().join("libs"), "LibStub/LibStub.lua", "LibStub = {}");
        create_test_file(&temp.path().join("libs"), "Unused/Unused.lua", "Unused = {}");

        let result = BuildPipeline::new(ctx).build().unwrap();
        assert_eq!(
            result.target(GameVersion::Classic).unwrap().files,
            vec!["LibStub/LibStub.lua", "Core.lua"]
        );
        assert!(temp.path().join("build/src/LibStub/LibStub.lua").exists());
    }

    #[test]
    fn test_unused_library_imports_are_reported() {
        let (temp, ctx) = create_test_context(&[("Core.lua", "Core = {}")]);
        create_test_file(&temp.path().join("libs"), "Unused/Unused.lua", "Unused = Missing");
        let mut pipeline = BuildPipeline::new(ctx)
            .with_globals(GameVersion::Classic, KnownGlobals::new())
            .with_globals(GameVersion::Retail, KnownGlobals::new());

        let result = pipeline.build().unwrap();
        let classic = result.target(GameVersion::Classic).unwrap();
        assert_eq!(classic.files, vec!["Core.lua"]);
        assert_eq!(classic.warnings.len(), 1);
        assert_eq!(classic.warnings[0].symbol, "Missing");
        assert!(classic.warnings[0].file.ends_with("Unused/Unused.lua"));
    }

    #[test]
    fn test_out_dir_containing_sources_rejected() {
        let (temp, mut ctx) = create_test_context(&[("Core.lua", "x = 1")]);
        let mut config = ctx.config().clone();
        config.project.out = PathBuf::from(".");
        ctx = BuildContext::new(config, temp.path().to_path_buf());

        assert!(matches!(BuildPipeline::new(ctx).build(), Err(BuildError::UnsafeOutDir(_))));
    }

    fn with_out(temp: &TempDir, ctx: &BuildContext, out: &str) -> BuildContext {
        let mut config = ctx.config().clone();
        config.project.out = PathBuf::from(out);
        BuildContext::new(config, temp.path().to_path_buf())
    }

    #[test]
    fn test_out_dir_above_project_rejected() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("Bagger");
        create_test_file(&root.join("src"), "Core.lua", "x = 1");
        create_test_file(outer.path(), "Other/keep.txt", "untouched");

        let mut config = WowluaConfig::default();
        config.project.out = PathBuf::from("..");
        let ctx = BuildContext::new(config, root.clone());

        assert!(matches!(BuildPipeline::new(ctx).build(), Err(BuildError::UnsafeOutDir(_))));
        assert!(root.join("src/Core.lua").exists());
        assert!(outer.path().join("Other/keep.txt").exists());
    }

    #[test]
    fn test_out_dir_equal_to_libs_rejected() {
        let (temp, ctx) = create_test_context(&[("Core.lua", "x = LibStub")]);
        create_test_file(&temp.path().join("libs"), "LibStub/LibStub.lua", "LibStub = {}");
        let ctx = with_out(&temp, &ctx, "libs");

        assert!(matches!(BuildPipeline::new(ctx).build(), Err(BuildError::UnsafeOutDir(_))));
        assert!(temp.path().join("libs/LibStub/LibStub.lua").exists());
    }

    #[test]
    fn test_out_dir_inside_sources_rejected() {
        let (temp, ctx) = create_test_context(&[("Core.lua", "x = 1")]);
        let ctx = with_out(&temp, &ctx, "src/../src/build");
        assert!(matches!(BuildPipeline::new(ctx).build(), Err(BuildError::UnsafeOutDir(_))));
        assert!(temp.path().join("src/Core.lua").exists());
    }

    #[test]
    fn test_out_dir_with_dots_inside_project_allowed() {
        let (temp, ctx) = create_test_context(&[("Core.lua", "x = 1")]);
        let ctx = with_out(&temp, &ctx, "./dist/../dist");
        BuildPipeline::new(ctx).build().unwrap();
        assert!(temp.path().join("dist/Bagger_Classic.toc").exists());
    }

    #[test]
    fn test_normalize_path_resolves_parent_of_missing_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        assert_eq!(normalize_path(&temp.path().join("a/../b/./c")), root.join("b/c"));
        assert_eq!(normalize_path(&temp.path().join("x/..")), root);
    }
}
