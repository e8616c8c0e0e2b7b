//! Build-variable substitution.
//!
//! `@NAME@` is replaced with the value of build variable `NAME`; text values
//! are emitted as Lua string literals. Spans whose enclosed text is not an
//! identifier are left alone, and comment lines are never touched so
//! packager markers like `--@debug@` survive.

use super::{is_identifier, PreprocessError};
use crate::config::VariableValue;
use crate::source::SourceFile;
use indexmap::IndexMap;

/// Substitute one line. `Ok(None)` means the line has no substitutions.
pub fn substitute_line(
    line: &str,
    variables: &IndexMap<String, VariableValue>,
) -> Result<Option<String>, String> {
    if line.trim_start().starts_with("--") || line.matches('@').count() < 2 {
        return Ok(None);
    }

    let mut output = String::with_capacity(line.len());
    let mut rest = line;
    let mut changed = false;

    while let Some(start) = rest.find('@') {
        let Some(len) = rest[start + 1..].find('@') else {
            break;
        };
        let end = start + 1 + len;
        let name = &rest[start + 1..end];

        if is_identifier(name) {
            let value = variables.get(name).ok_or_else(|| name.to_string())?;
            output.push_str(&rest[..start]);
            output.push_str(&value.to_lua());
            rest = &rest[end + 1..];
            changed = true;
        } else {
            output.push_str(&rest[..=start]);
            rest = &rest[start + 1..];
        }
    }
    output.push_str(rest);

    Ok(changed.then_some(output))
}

/// Substitute every line of a file's processed buffer.
pub fn substitute(
    file: &mut SourceFile,
    variables: &IndexMap<String, VariableValue>,
) -> Result<(), PreprocessError> {
    let mut replacements = Vec::new();
    for (index, line) in file.processed_lines.iter().enumerate() {
        let substituted = substitute_line(line, variables).map_err(|name| PreprocessError::UndefinedVariable {
            file: file.file_name.clone(),
            line: index + 1,
            name,
        })?;
        if let Some(substituted) = substituted {
            replacements.push((index, substituted));
        }
    }

    if !replacements.is_empty() {
        let lines = file.processed_lines_mut();
        for (index, line) in replacements {
            lines[index] = line;
        }
    }
    Ok(())
}
