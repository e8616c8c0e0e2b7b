//! Symbol analysis: which globals a file uses, declares and imports.
//!
//! Runs on the processed text of a file. Used globals come straight from the
//! parser. Declared globals are top-level non-local assignments and function
//! declarations, plus any `_G` index assignment anywhere in the file whose key
//! resolves to a literal name. Imported globals are the used ones minus
//! declared ones and Lua built-ins; the per-version engine table is applied
//! when a target is built.

use crate::globals::is_lua_builtin;
use crate::lua::ast::{BinOp, Block, Expr, Field, FunctionName, StmtKind, UnOp};
use crate::lua::{LuaParser, SyntaxError};
use crate::source::SourceFile;
use crate::variable::{Value, Variable};
use indexmap::{IndexMap, IndexSet};

/// A file failed to parse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Syntax error in file: {file} {source}")]
pub struct AnalyzeError {
    pub file: String,
    #[source]
    pub source: SyntaxError,
}

/// Derives global symbol sets for source files.
pub struct Analyzer<'p> {
    parser: &'p dyn LuaParser,
}

impl<'p> Analyzer<'p> {
    pub fn new(parser: &'p dyn LuaParser) -> Self {
        Self { parser }
    }

    /// Parse and analyze one file, filling its symbol sets.
    pub fn analyze(&self, file: &mut SourceFile) -> Result<(), AnalyzeError> {
        let chunk = self.parser.parse(&file.processed_text()).map_err(|source| {
            tracing::error!(
                "{} [{}:{}] {}",
                file.file_name,
                source.line,
                source.column,
                source.message
            );
            AnalyzeError { file: file.file_name.clone(), source }
        })?;

        let mut walker = SymbolWalker::default();
        walker.walk_block(&chunk.body, 0);

        file.used_globals = chunk.globals.iter().cloned().collect();
        file.imported_globals = file
            .used_globals
            .iter()
            .filter(|name| !is_lua_builtin(name) && !walker.declared.contains(*name))
            .cloned()
            .collect();
        file.declared_globals = walker.declared;
        file.symbol_table = walker.symbols;
        file.ast = Some(chunk);
        Ok(())
    }
}

/// Walks statements in source order, recording declarations.
#[derive(Default)]
struct SymbolWalker {
    declared: IndexSet<String>,
    symbols: IndexMap<String, Variable>,
}

impl SymbolWalker {
    fn walk_block(&mut self, block: &Block, depth: usize) {
        for stmt in block {
            match &stmt.kind {
                StmtKind::Local { names, values } => {
                    for (index, name) in names.iter().enumerate() {
                        let value = values.get(index).map(|v| self.evaluate(v)).unwrap_or(Value::Nil);
                        self.record(Variable::new(name.clone(), false, value));
                    }
                }
                StmtKind::Assign { targets, values } => {
                    for (index, target) in targets.iter().enumerate() {
                        let value = values.get(index).map(|v| self.evaluate(v)).unwrap_or(Value::Nil);
                        self.assign(target, value, depth);
                    }
                }
                StmtKind::Function { name, .. } => self.declare_function(name, depth),
                StmtKind::LocalFunction { name, .. } => {
                    self.record(Variable::new(name.clone(), false, Value::Function));
                }
                _ => {}
            }
            for nested in stmt.kind.blocks() {
                self.walk_block(nested, depth + 1);
            }
            for expr in stmt.kind.exprs() {
                self.walk_expr(expr, depth);
            }
        }
    }

    /// Walk the bodies of function literals inside an expression.
    fn walk_expr(&mut self, expr: &Expr, depth: usize) {
        if let Expr::Function(function) = expr {
            self.walk_block(&function.body, depth + 1);
            return;
        }
        for child in expr.children() {
            self.walk_expr(child, depth);
        }
    }

    fn assign(&mut self, target: &Expr, value: Value, depth: usize) {
        match target {
            Expr::Name(name) => {
                let is_global = !name.is_local;
                if is_global && depth == 0 {
                    self.declared.insert(name.name.clone());
                }
                self.record(Variable::new(name.name.clone(), is_global, value));
            }
            Expr::Member { base, name } => {
                if is_global_table(base) {
                    self.declared.insert(name.clone());
                    self.record(Variable::new(name.clone(), true, value));
                } else if let Some(parent) = qualified_name(base) {
                    self.record(Variable::new(name.clone(), false, value).with_parent(parent));
                }
            }
            Expr::Index { base, key } => {
                if !is_global_table(base) {
                    return;
                }
                match self.resolve_key(key) {
                    Some(name) => {
                        self.declared.insert(name.clone());
                        self.record(Variable::new(name, true, value));
                    }
                    None => tracing::debug!("unresolved _G index assignment"),
                }
            }
            _ => {}
        }
    }

    fn declare_function(&mut self, name: &FunctionName, depth: usize) {
        if name.is_identifier() {
            let is_global = !name.base.is_local;
            if is_global && depth == 0 {
                self.declared.insert(name.base.name.clone());
            }
            self.record(Variable::new(name.base.name.clone(), is_global, Value::Function));
            return;
        }

        let mut segments: Vec<&str> = vec![name.base.name.as_str()];
        segments.extend(name.path.iter().map(String::as_str));
        if let Some(method) = &name.method {
            segments.push(method);
        }
        if let Some((leaf, parents)) = segments.split_last() {
            self.record(Variable::new(*leaf, false, Value::Function).with_parent(parents.join(":")));
        }
    }

    /// Name a `_G` index key resolves to.
    fn resolve_key(&self, key: &Expr) -> Option<String> {
        match key {
            Expr::String(s) => Some(s.clone()),
            Expr::Number { value, .. } => Value::Num(*value).as_key(),
            Expr::Name(name) => self.symbols.get(&name.name).and_then(|v| v.value.as_key()),
            Expr::Paren(inner) => self.resolve_key(inner),
            other => self.evaluate(other).as_key(),
        }
    }

    /// Insert a variable and, for tables, each field under its qualified name.
    fn record(&mut self, variable: Variable) {
        let full_name = variable.full_name();
        let mut variable = variable;
        if let Value::Table(fields) = &mut variable.value {
            for field in fields.iter_mut() {
                field.parent = Some(full_name.clone());
            }
            let fields = fields.clone();
            self.symbols.insert(full_name, variable);
            for field in fields {
                self.record(field);
            }
        } else {
            self.symbols.insert(full_name, variable);
        }
    }

    /// Best-effort symbolic value of an expression.
    fn evaluate(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Nil => Value::Nil,
            Expr::Boolean(b) => Value::Bool(*b),
            Expr::Number { value, .. } => Value::Num(*value),
            Expr::String(s) => Value::Str(s.clone()),
            Expr::Function(_) => Value::Function,
            Expr::Paren(inner) => self.evaluate(inner),
            Expr::Name(name) => {
                self.symbols.get(&name.name).map(|v| v.value.clone()).unwrap_or(Value::Unknown)
            }
            Expr::Table(fields) => {
                let mut positional = 0usize;
                let children = fields
                    .iter()
                    .filter_map(|field| match field {
                        Field::Named(key, value) => Some(Variable::new(key.clone(), false, self.evaluate(value))),
                        Field::Keyed(key, value) => self
                            .evaluate(key)
                            .as_key()
                            .map(|key| Variable::new(key, false, self.evaluate(value))),
                        Field::Positional(value) => {
                            positional += 1;
                            Some(Variable::new(positional.to_string(), false, self.evaluate(value)))
                        }
                    })
                    .collect();
                Value::Table(children)
            }
            Expr::Unary { op: UnOp::Neg, operand } => match self.evaluate(operand) {
                Value::Num(n) => Value::Num(-n),
                _ => Value::Unknown,
            },
            Expr::Unary { op: UnOp::Not, operand } => match self.evaluate(operand) {
                Value::Bool(b) => Value::Bool(!b),
                Value::Nil => Value::Bool(true),
                Value::Unknown => Value::Unknown,
                _ => Value::Bool(false),
            },
            Expr::Binary { op, lhs, rhs } => fold_binary(*op, self.evaluate(lhs), self.evaluate(rhs)),
            _ => Value::Unknown,
        }
    }
}

fn fold_binary(op: BinOp, lhs: Value, rhs: Value) -> Value {
    match (op, lhs, rhs) {
        (BinOp::Add, Value::Num(a), Value::Num(b)) => Value::Num(a + b),
        (BinOp::Sub, Value::Num(a), Value::Num(b)) => Value::Num(a - b),
        (BinOp::Mul, Value::Num(a), Value::Num(b)) => Value::Num(a * b),
        (BinOp::Div, Value::Num(a), Value::Num(b)) => Value::Num(a / b),
        (BinOp::Mod, Value::Num(a), Value::Num(b)) => Value::Num(a - (a / b).floor() * b),
        (BinOp::Pow, Value::Num(a), Value::Num(b)) => Value::Num(a.powf(b)),
        (BinOp::Concat, a, b) => match (a.as_key(), b.as_key()) {
            (Some(a), Some(b)) => Value::Str(a + &b),
            _ => Value::Unknown,
        },
        _ => Value::Unknown,
    }
}

fn is_global_table(expr: &Expr) -> bool {
    matches!(expr, Expr::Name(name) if name.name == "_G" && !name.is_local)
}

/// `A.b.c` as `A:b:c`.
fn qualified_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.name.clone()),
        Expr::Member { base, name } => qualified_name(base).map(|parent| format!("{}:{}", parent, name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::StandardParser;
    use crate::variable::VariableKind;

    fn analyzed(text: &str) -> SourceFile {
        let mut file = SourceFile::new("/src", "Core.lua", text);
        Analyzer::new(&StandardParser).analyze(&mut file).unwrap();
        file
    }

    fn set(items: &IndexSet<String>) -> Vec<&str> {
        items.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_declared_top_level_globals() {
        let file = analyzed("Foo = 1\nlocal bar = 2\nfunction Baz() end\nlocal function qux() end");
        assert_eq!(set(&file.declared_globals), vec!["Foo", "Baz"]);
    }

    #[test]
    fn test_all_assignment_targets_declared() {
        let file = analyzed("A, B = 1, 2");
        assert_eq!(set(&file.declared_globals), vec!["A", "B"]);
    }

    #[test]
    fn test_nested_assignments_not_declared() {
        let file = analyzed("function Init()\n  Lazy = true\nend");
        assert_eq!(set(&file.declared_globals), vec!["Init"]);
    }

    #[test]
    fn test_member_functions_not_declared() {
        let file = analyzed("Addon = {}\nfunction Addon:Load() end\nfunction Addon.util.f() end");
        assert_eq!(set(&file.declared_globals), vec!["Addon"]);
        assert!(file.symbol_table.contains_key("Addon:Load"));
        assert!(file.symbol_table.contains_key("Addon:util:f"));
    }

    #[test]
    fn test_g_string_index_declares() {
        let file = analyzed("_G[\"Bagger\"] = {}\n_G.Other = 1");
        assert_eq!(set(&file.declared_globals), vec!["Bagger", "Other"]);
    }

    #[test]
    fn test_g_identifier_index_uses_literal() {
        let file = analyzed("local name = \"Bagger\"\n_G[name] = {}");
        assert_eq!(set(&file.declared_globals), vec!["Bagger"]);
    }

    #[test]
    fn test_g_identifier_uses_most_recent_value() {
        let file = analyzed("local name = \"First\"\nname = \"Second\"\n_G[name] = 1");
        assert!(file.declared_globals.contains("Second"));
        assert!(!file.declared_globals.contains("First"));
    }

    #[test]
    fn test_g_numeric_and_nested() {
        let file = analyzed("function Setup()\n  _G[3] = true\nend");
        assert!(file.declared_globals.contains("3"));
    }

    #[test]
    fn test_g_inside_function_literals() {
        let file = analyzed(
            "frame:SetScript('OnEvent', function()\n  _G[\"Bagger\"] = {}\nend)\n\
             local init = function() _G.Other = 1 end\n\
             Handlers = { load = function() _G.FromTable = true end }\n\
             return function() _G.FromReturn = 1 end",
        );
        assert_eq!(set(&file.declared_globals), vec!["Bagger", "Other", "Handlers", "FromTable", "FromReturn"]);
    }

    #[test]
    fn test_plain_assignment_in_function_literal_not_declared() {
        let file = analyzed("local init = function() Lazy = true end");
        assert_eq!(set(&file.declared_globals), Vec::<&str>::new());
    }

    #[test]
    fn test_g_unresolved_index_ignored() {
        let file = analyzed("_G[GetName()] = 1");
        assert_eq!(set(&file.declared_globals), Vec::<&str>::new());
    }

    #[test]
    fn test_imported_excludes_builtins_and_declared() {
        let file = analyzed("Foo = {}\nprint(Foo, Bar, string.format(\"%d\", 1))\nCreateFrame(\"Frame\")");
        assert_eq!(set(&file.used_globals), vec!["Foo", "print", "Bar", "string", "CreateFrame"]);
        assert_eq!(set(&file.imported_globals), vec!["Bar", "CreateFrame"]);
    }

    #[test]
    fn test_g_declaration_same_as_plain() {
        let plain = analyzed("X = 1");
        let indirect = analyzed("_G[\"X\"] = 1");
        assert_eq!(plain.declared_globals, indirect.declared_globals);
    }

    #[test]
    fn test_symbol_table_values() {
        let file = analyzed("local max = 10 + 5\nConfig = { size = max, name = \"bags\", { 1 } }\nlocal copy = Config");
        assert_eq!(file.symbol_table["max"].value, Value::Num(15.0));
        assert_eq!(file.symbol_table["Config"].kind, VariableKind::Table);
        assert_eq!(file.symbol_table["Config:size"].value, Value::Num(15.0));
        assert_eq!(file.symbol_table["Config:name"].parent.as_deref(), Some("Config"));
        assert_eq!(file.symbol_table["Config:1:1"].value, Value::Num(1.0));
        assert_eq!(file.symbol_table["copy"].kind, VariableKind::Table);
    }

    #[test]
    fn test_member_assignment_recorded_with_parent() {
        let file = analyzed("Addon = {}\nAddon.db = nil\nAddon.db.profile = 1");
        assert_eq!(file.symbol_table["Addon:db"].kind, VariableKind::Nil);
        assert_eq!(file.symbol_table["Addon:db:profile"].full_name(), "Addon:db:profile");
    }

    #[test]
    fn test_syntax_error_is_reported_with_file() {
        let mut file = SourceFile::new("/src", "Broken.lua", "function f(\n");
        let err = Analyzer::new(&StandardParser).analyze(&mut file).unwrap_err();
        assert_eq!(err.file, "Broken.lua");
        assert!(err.to_string().starts_with("Syntax error in file: Broken.lua ["));
    }
}
