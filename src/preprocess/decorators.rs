//! Method decorators.
//!
//! ```text
//! @Throttle(0.5)
//! function Addon:OnUpdate(elapsed)
//! ```
//!
//! becomes
//!
//! ```text
//! Throttle(Addon, "OnUpdate", 0.5)
//! function Addon:OnUpdate(elapsed)
//! ```
//!
//! Decorators may stack. A blank line between a decorator and its method is
//! an error.

use super::PreprocessError;
use crate::source::SourceFile;
use regex::Regex;
use std::sync::OnceLock;

fn method_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*function\s+([A-Za-z_][\w.]*?)[:.]([A-Za-z_]\w*)\s*\(")
            .expect("method declaration pattern is valid")
    })
}

/// Class and method named by a `function Class:Method(` line.
pub fn method_target(line: &str) -> Option<(String, String)> {
    method_pattern().captures(line).map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// A parsed `@name(args` line.
#[derive(Debug, PartialEq)]
struct Decorator<'a> {
    name: &'a str,
    /// Text after the opening parenthesis, including the closing one
    args: Option<&'a str>,
}

fn parse_decorator(line: &str) -> Option<Decorator<'_>> {
    let rest = line.trim_start().strip_prefix('@')?;
    match rest.split_once('(') {
        Some((name, args)) => Some(Decorator { name: name.trim(), args: Some(args) }),
        None => Some(Decorator { name: rest.trim(), args: None }),
    }
}

fn render(decorator: &Decorator<'_>, class: &str, method: &str) -> String {
    match decorator.args {
        Some(args) if args.trim_start().starts_with(')') || args.trim().is_empty() => {
            format!("{}({}, \"{}\")", decorator.name, class, method)
        }
        Some(args) => format!("{}({}, \"{}\", {}", decorator.name, class, method, args),
        None => format!("{}({}, \"{}\")", decorator.name, class, method),
    }
}

/// Rewrite every decorator line of a file.
pub fn rewrite(file: &mut SourceFile) -> Result<(), PreprocessError> {
    let lines = &file.processed_lines;
    let mut rewrites = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let Some(decorator) = parse_decorator(line) else {
            continue;
        };

        let mut target = None;
        for following in &lines[index + 1..] {
            if following.trim().is_empty() {
                return Err(PreprocessError::DecoratorBlankLine {
                    file: file.file_name.clone(),
                    line: index + 1,
                    decorator: decorator.name.to_string(),
                });
            }
            if let Some(found) = method_target(following) {
                target = Some(found);
                break;
            }
        }

        let (class, method) = target.ok_or_else(|| PreprocessError::DecoratorWithoutTarget {
            file: file.file_name.clone(),
            line: index + 1,
            decorator: decorator.name.to_string(),
        })?;
        rewrites.push((index, render(&decorator, &class, &method)));
    }

    if !rewrites.is_empty() {
        let lines = file.processed_lines_mut();
        for (index, replacement) in rewrites {
            lines[index] = replacement;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewritten(text: &str) -> Result<String, PreprocessError> {
        let mut file = SourceFile::new("/src", "Core.lua", text);
        rewrite(&mut file)?;
        Ok(file.processed_text())
    }

    #[test]
    fn test_method_target() {
        assert_eq!(method_target("function Addon:Load(x)"), Some(("Addon".into(), "Load".into())));
        assert_eq!(method_target("function A.b.c ()"), Some(("A.b".into(), "c".into())));
        assert_eq!(method_target("function Load()"), None);
        assert_eq!(method_target("local function f()"), None);
    }

    #[test]
    fn test_decorator_with_arguments() {
        assert_eq!(
            rewritten("@Throttle(0.5)\nfunction Addon:OnUpdate(elapsed)\nend").unwrap(),
            "Throttle(Addon, \"OnUpdate\", 0.5)\nfunction Addon:OnUpdate(elapsed)\nend"
        );
    }

    #[test]
    fn test_decorator_without_arguments() {
        assert_eq!(
            rewritten("@Event()\nfunction Addon:PLAYER_LOGIN()\nend").unwrap(),
            "Event(Addon, \"PLAYER_LOGIN\")\nfunction Addon:PLAYER_LOGIN()\nend"
        );
        assert_eq!(
            rewritten("@Event\nfunction Addon:Ready()\nend").unwrap(),
            "Event(Addon, \"Ready\")\nfunction Addon:Ready()\nend"
        );
    }

    #[test]
    fn test_stacked_decorators() {
        assert_eq!(
            rewritten("@A(1)\n@B()\nfunction M:f()\nend").unwrap(),
            "A(M, \"f\", 1)\nB(M, \"f\")\nfunction M:f()\nend"
        );
    }

    #[test]
    fn test_blank_line_after_decorator() {
        let err = rewritten("@Throttle(1)\n\nfunction Addon:OnUpdate()\nend").unwrap_err();
        assert_eq!(
            err,
            PreprocessError::DecoratorBlankLine { file: "Core.lua".into(), line: 1, decorator: "Throttle".into() }
        );
    }

    #[test]
    fn test_decorator_at_end_of_file() {
        let err = rewritten("x = 1\n@Throttle(1)").unwrap_err();
        assert!(matches!(err, PreprocessError::DecoratorWithoutTarget { line: 2, .. }));
    }

    #[test]
    fn test_untouched_file_keeps_shared_buffer() {
        let mut file = SourceFile::new("/src", "Core.lua", "x = 1");
        rewrite(&mut file).unwrap();
        assert!(std::sync::Arc::ptr_eq(&file.original_lines, &file.processed_lines));
    }
}
