//! Unknown-global diagnostic.
//!
//! Read-only pass over a target's file set. An imported global that no file
//! declares is reported once per file, never failing the build.

use crate::source::SourceFile;
use std::collections::HashSet;
use std::fmt;

/// An imported global with no declaring file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGlobal {
    /// Id of the importing file
    pub file: String,
    /// The global's name
    pub symbol: String,
}

impl fmt::Display for UnknownGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Using potentially undefined global: {} in file: {}", self.symbol, self.file)
    }
}

/// Report every imported global that no file in `files` declares.
pub fn check_unknown_globals<'a>(files: impl IntoIterator<Item = &'a SourceFile> + Clone) -> Vec<UnknownGlobal> {
    let declared: HashSet<&str> = files
        .clone()
        .into_iter()
        .flat_map(|f| f.declared_globals.iter().map(String::as_str))
        .collect();

    let mut unknown = Vec::new();
    for file in files {
        for symbol in &file.imported_globals {
            if declared.contains(symbol.as_str()) {
                continue;
            }
            let diagnostic = UnknownGlobal { file: file.id(), symbol: symbol.clone() };
            tracing::warn!("{}", diagnostic);
            unknown.push(diagnostic);
        }
    }
    unknown
}
