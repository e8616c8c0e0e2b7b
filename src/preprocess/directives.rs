//! Compiler flags, line macros and block macros.
//!
//! All three syntaxes dispatch to one [`DirectiveRegistry`]:
//!
//! ```text
//! --$FileGameVersion Retail        compiler flag
//! --@Skip                          line macro
//! --{@GameVersion Retail           block macro, may nest
//! ...
//! --}@GameVersion
//! ```
//!
//! Expansion builds a fresh output buffer while scanning the input by index.
//! The output of a block handler is scanned again, so blocks nest.

use super::PreprocessError;
use crate::source::SourceFile;
use crate::version::GameVersion;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Prefix of a single-line compiler flag.
pub const FLAG_PREFIX: &str = "--$";
/// Prefix of a single-line macro.
pub const LINE_MACRO_PREFIX: &str = "--@";
/// Opening fence of a block macro.
pub const BLOCK_OPEN_PREFIX: &str = "--{@";
/// Closing fence of a block macro.
pub const BLOCK_CLOSE_PREFIX: &str = "--}@";

/// Syntax a directive was invoked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveSyntax {
    Flag,
    LineMacro,
    Block,
}

/// One directive invocation.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub name: &'a str,
    pub syntax: DirectiveSyntax,
    pub args: &'a [String],
    /// 1-based first line (the directive or opening fence)
    pub line_start: usize,
    /// 1-based last line (same as `line_start` unless a block)
    pub line_end: usize,
    /// Lines between the fences of a block, empty otherwise
    pub body: &'a [String],
}

/// State shared by the directives expanded in one file.
pub struct DirectiveContext<'a> {
    pub file: &'a mut SourceFile,
    /// Versions configured for the build
    pub game_versions: &'a [GameVersion],
    /// Version whose variant is being expanded, `None` for the base file
    pub active_variant: Option<GameVersion>,
    /// Variants requested by block macros in the base file
    pub requested_variants: BTreeSet<GameVersion>,
}

impl DirectiveContext<'_> {
    pub fn argument_count(
        &self,
        invocation: &Invocation<'_>,
        expected: &str,
    ) -> PreprocessError {
        PreprocessError::ArgumentCount {
            file: self.file.file_name.clone(),
            line: invocation.line_start,
            directive: invocation.name.to_string(),
            found: invocation.args.len(),
            expected: expected.to_string(),
        }
    }

    /// Parse every argument as a game version.
    pub fn parse_versions(&self, invocation: &Invocation<'_>) -> Result<Vec<GameVersion>, PreprocessError> {
        invocation
            .args
            .iter()
            .map(|arg| {
                arg.parse().map_err(|source| PreprocessError::InvalidVersion {
                    file: self.file.file_name.clone(),
                    line: invocation.line_start,
                    source,
                })
            })
            .collect()
    }
}

/// A directive handler.
///
/// Returns the lines replacing the invocation (the whole fenced range for a
/// block).
pub trait Directive: Send + Sync {
    /// Name used after the prefix.
    fn name(&self) -> &'static str;

    fn expand(
        &self,
        ctx: &mut DirectiveContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<String>, PreprocessError>;
}

/// Restricts a file to the listed versions.
pub struct FileGameVersion;

impl Directive for FileGameVersion {
    fn name(&self) -> &'static str {
        "FileGameVersion"
    }

    fn expand(
        &self,
        ctx: &mut DirectiveContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<String>, PreprocessError> {
        if invocation.args.is_empty() {
            return Err(ctx.argument_count(invocation, ">=1"));
        }
        let versions = ctx.parse_versions(invocation)?;
        // A variant already carries its single version
        if ctx.active_variant.is_none() {
            ctx.file.restrict_to(versions.iter().copied());
        }
        let names: Vec<&str> = versions.iter().map(|v| v.name()).collect();
        Ok(vec![format!("-- This file is for {} only.", names.join(", "))])
    }
}

/// Removes the file from the build.
pub struct Skip;

impl Directive for Skip {
    fn name(&self) -> &'static str {
        "Skip"
    }

    fn expand(
        &self,
        ctx: &mut DirectiveContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<String>, PreprocessError> {
        if !invocation.args.is_empty() {
            return Err(ctx.argument_count(invocation, "0"));
        }
        ctx.file.excluded = true;
        Ok(Vec::new())
    }
}

/// Keeps a block only in per-version variants of the file.
pub struct GameVersionBlock;

impl Directive for GameVersionBlock {
    fn name(&self) -> &'static str {
        "GameVersion"
    }

    fn expand(
        &self,
        ctx: &mut DirectiveContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<String>, PreprocessError> {
        if invocation.args.is_empty() {
            return Err(ctx.argument_count(invocation, ">=1"));
        }
        let versions = ctx.parse_versions(invocation)?;
        match ctx.active_variant {
            Some(active) if versions.contains(&active) => Ok(invocation.body.to_vec()),
            Some(_) => Ok(Vec::new()),
            None => {
                ctx.requested_variants.extend(versions);
                Ok(Vec::new())
            }
        }
    }
}

/// Directive handlers by name.
pub struct DirectiveRegistry {
    directives: HashMap<String, Box<dyn Directive>>,
}

impl DirectiveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { directives: HashMap::new() }
    }

    /// Registry with `FileGameVersion`, `Skip` and `GameVersion`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(FileGameVersion));
        registry.register(Box::new(Skip));
        registry.register(Box::new(GameVersionBlock));
        registry
    }

    /// Add a handler, replacing any with the same name.
    pub fn register(&mut self, directive: Box<dyn Directive>) {
        self.directives.insert(directive.name().to_string(), directive);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Directive> {
        self.directives.get(name).map(|d| d.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.directives.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A directive line split into its parts.
#[derive(Debug, PartialEq)]
enum DirectiveLine {
    Single { syntax: DirectiveSyntax, name: String, args: Vec<String> },
    Open { name: String, args: Vec<String> },
    Close { name: String },
}

fn split_directive(rest: &str) -> (String, Vec<String>) {
    let mut parts = rest.split_whitespace().map(String::from);
    let name = parts.next().unwrap_or_default();
    (name, parts.collect())
}

fn classify(line: &str) -> Option<DirectiveLine> {
    if let Some(rest) = line.strip_prefix(FLAG_PREFIX) {
        let (name, args) = split_directive(rest);
        return Some(DirectiveLine::Single { syntax: DirectiveSyntax::Flag, name, args });
    }
    if let Some(rest) = line.strip_prefix(LINE_MACRO_PREFIX) {
        let (name, args) = split_directive(rest);
        return Some(DirectiveLine::Single { syntax: DirectiveSyntax::LineMacro, name, args });
    }
    if let Some(rest) = line.strip_prefix(BLOCK_OPEN_PREFIX) {
        let (name, args) = split_directive(rest);
        return Some(DirectiveLine::Open { name, args });
    }
    if let Some(rest) = line.strip_prefix(BLOCK_CLOSE_PREFIX) {
        let (name, _) = split_directive(rest);
        return Some(DirectiveLine::Close { name });
    }
    None
}

/// Index of the fence closing the block opened at `open`, honouring
/// same-name nesting.
fn find_block_end(lines: &[String], open: usize, name: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, line) in lines.iter().enumerate().skip(open + 1) {
        match classify(line) {
            Some(DirectiveLine::Open { name: inner, .. }) if inner == name => depth += 1,
            Some(DirectiveLine::Close { name: inner }) if inner == name => {
                if depth == 0 {
                    return Some(index);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Expand every directive in `lines`.
///
/// `first_line` is the 1-based line number of `lines[0]` in the file.
pub fn expand_lines(
    registry: &DirectiveRegistry,
    lines: &[String],
    ctx: &mut DirectiveContext<'_>,
    first_line: usize,
) -> Result<Vec<String>, PreprocessError> {
    let mut output = Vec::with_capacity(lines.len());
    let mut index = 0;

    while index < lines.len() {
        let line = &lines[index];
        let line_number = first_line + index;

        match classify(line) {
            Some(DirectiveLine::Single { syntax, name, args }) => match registry.get(&name) {
                Some(directive) => {
                    let invocation = Invocation {
                        name: &name,
                        syntax,
                        args: &args,
                        line_start: line_number,
                        line_end: line_number,
                        body: &[],
                    };
                    output.extend(directive.expand(ctx, &invocation)?);
                }
                None => {
                    tracing::debug!("{}:{}: unknown directive '{}'", ctx.file.file_name, line_number, name);
                    output.push(line.clone());
                }
            },
            Some(DirectiveLine::Open { name, args }) => {
                let Some(directive) = registry.get(&name) else {
                    tracing::debug!("{}:{}: unknown block macro '{}'", ctx.file.file_name, line_number, name);
                    output.push(line.clone());
                    index += 1;
                    continue;
                };
                let end = find_block_end(lines, index, &name).ok_or_else(|| PreprocessError::UnterminatedBlock {
                    file: ctx.file.file_name.clone(),
                    line: line_number,
                    name: name.clone(),
                })?;
                let invocation = Invocation {
                    name: &name,
                    syntax: DirectiveSyntax::Block,
                    args: &args,
                    line_start: line_number,
                    line_end: first_line + end,
                    body: &lines[index + 1..end],
                };
                let replacement = directive.expand(ctx, &invocation)?;
                output.extend(expand_lines(registry, &replacement, ctx, line_number + 1)?);
                index = end + 1;
                continue;
            }
            Some(DirectiveLine::Close { .. }) | None => output.push(line.clone()),
        }
        index += 1;
    }

    Ok(output)
}

/// Expand the directives of one file and build its version variants.
///
/// The file's processed lines are replaced. Returned variants share the
/// file's pre-expansion buffers and have already been expanded themselves.
pub fn expand_file(
    registry: &DirectiveRegistry,
    file: &mut SourceFile,
    game_versions: &[GameVersion],
) -> Result<Vec<SourceFile>, PreprocessError> {
    let input = Arc::clone(&file.processed_lines);

    let (output, requested) = {
        let mut ctx = DirectiveContext {
            file: &mut *file,
            game_versions,
            active_variant: None,
            requested_variants: BTreeSet::new(),
        };
        let output = expand_lines(registry, &input, &mut ctx, 1)?;
        (output, ctx.requested_variants)
    };

    if requested.is_empty() {
        file.set_processed(output);
        return Ok(Vec::new());
    }

    let allowed: BTreeSet<GameVersion> = if file.is_version_specific {
        file.applicable_versions.clone()
    } else {
        game_versions.iter().copied().collect()
    };

    let mut variants = Vec::new();
    for &version in requested.intersection(&allowed) {
        // Clone before the base's buffer is replaced
        let mut variant = file.variant_for(version);
        variant.excluded = file.excluded;
        let variant_output = {
            let mut ctx = DirectiveContext {
                file: &mut variant,
                game_versions,
                active_variant: Some(version),
                requested_variants: BTreeSet::new(),
            };
            expand_lines(registry, &input, &mut ctx, 1)?
        };
        variant.set_processed(variant_output);
        tracing::debug!("created variant {} of {}", variant.file_name, file.file_name);
        variants.push(variant);
    }

    file.restrict_to(allowed.difference(&requested).copied().collect::<Vec<_>>());
    file.set_processed(output);
    Ok(variants)
}
