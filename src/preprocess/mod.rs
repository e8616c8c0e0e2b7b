//! Line-oriented preprocessing of Lua sources.
//!
//! Three stages run over the whole file set, each finishing for every file
//! before the next starts:
//!
//! 1. [`variables`]: `@NAME@` build-variable substitution
//! 2. [`directives`]: compiler flags (`--$Name`), line macros (`--@Name`) and
//!    block macros (`--{@Name` … `--}@Name`)
//! 3. [`decorators`]: `@name(args` lines bound to the following method
//!
//! Files inside a stage are independent and processed in parallel.

pub mod decorators;
pub mod directives;
pub mod variables;

pub use directives::{Directive, DirectiveContext, DirectiveRegistry, Invocation};

use crate::build::BuildContext;
use crate::source::SourceFile;
use crate::version::UnknownVersion;
use rayon::prelude::*;
use std::time::Instant;

/// Fatal preprocessing error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreprocessError {
    #[error("Could not find replacement for variable: {name} in file: {file} at line: {line}")]
    UndefinedVariable { file: String, line: usize, name: String },

    #[error("Invalid number of arguments for {directive}: {found} (expected {expected}) in file: {file} at line: {line}")]
    ArgumentCount {
        file: String,
        line: usize,
        directive: String,
        found: usize,
        expected: String,
    },

    #[error("{source} (in file: {file} at line: {line})")]
    InvalidVersion {
        file: String,
        line: usize,
        #[source]
        source: UnknownVersion,
    },

    #[error("Unterminated block macro {name} in file: {file} starting at line: {line}")]
    UnterminatedBlock { file: String, line: usize, name: String },

    #[error("Unexpected newline after decorator: {decorator} in file: {file} at line: {line}")]
    DecoratorBlankLine { file: String, line: usize, decorator: String },

    #[error("Decorator {decorator} in file: {file} at line: {line} is not followed by a method declaration")]
    DecoratorWithoutTarget { file: String, line: usize, decorator: String },
}

/// Runs the preprocessing stages over a build context.
pub struct Preprocessor {
    registry: DirectiveRegistry,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DirectiveRegistry::builtin())
    }
}

impl Preprocessor {
    pub fn new(registry: DirectiveRegistry) -> Self {
        Self { registry }
    }

    /// Directive handlers in use.
    pub fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    /// Run all stages over the project and library files of `ctx`.
    ///
    /// Variants produced by block macros are appended to the set their base
    /// file belongs to; files marked by `Skip` are removed.
    pub fn run(&self, ctx: &mut BuildContext) -> Result<(), PreprocessError> {
        let values = ctx.variables.clone();
        let versions = ctx.config().project.game_versions.clone();

        let start = Instant::now();
        for files in [&mut ctx.project_files, &mut ctx.library_files] {
            files.par_iter_mut().try_for_each(|file| variables::substitute(file, &values))?;
        }
        tracing::debug!("variable substitution took {:?}", start.elapsed());

        let start = Instant::now();
        for files in [&mut ctx.project_files, &mut ctx.library_files] {
            let variants: Vec<Vec<SourceFile>> = files
                .par_iter_mut()
                .map(|file| directives::expand_file(&self.registry, file, &versions))
                .collect::<Result<_, _>>()?;
            files.extend(variants.into_iter().flatten());

            let before = files.len();
            files.retain(|file| !file.excluded);
            if files.len() != before {
                tracing::debug!("skipped {} file(s)", before - files.len());
            }
        }
        tracing::debug!("directives took {:?}", start.elapsed());

        let start = Instant::now();
        for files in [&mut ctx.project_files, &mut ctx.library_files] {
            files.par_iter_mut().try_for_each(decorators::rewrite)?;
        }
        tracing::debug!("decorators took {:?}", start.elapsed());

        Ok(())
    }
}

/// Whether `text` is a Lua identifier.
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
