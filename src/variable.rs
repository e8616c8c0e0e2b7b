//! Symbolic values for declarations found while analyzing a file.
//!
//! The model is intentionally shallow: enough to know what kind of thing a
//! name was last assigned, and the literal when there is one.

use std::fmt;

/// Kind of value a variable holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    String,
    Number,
    Boolean,
    Table,
    Function,
    Nil,
    Any,
}

/// Known value of a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
    Nil,
    /// Table fields, each with the table as parent
    Table(Vec<Variable>),
    Function,
    Unknown,
}

impl Value {
    /// The kind matching this value.
    pub fn kind(&self) -> VariableKind {
        match self {
            Value::Str(_) => VariableKind::String,
            Value::Num(_) => VariableKind::Number,
            Value::Bool(_) => VariableKind::Boolean,
            Value::Nil => VariableKind::Nil,
            Value::Table(_) => VariableKind::Table,
            Value::Function => VariableKind::Function,
            Value::Unknown => VariableKind::Any,
        }
    }

    /// The value as a global name, if it is a literal that can name one.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Num(n) => Some(format_number(*n)),
            _ => None,
        }
    }
}

/// Format a number the way Lua prints it (integers without a fraction).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub is_global: bool,
    pub kind: VariableKind,
    pub value: Value,
    /// Qualified name of the enclosing table, if any
    pub parent: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>, is_global: bool, value: Value) -> Self {
        Self { name: name.into(), is_global, kind: value.kind(), value, parent: None }
    }

    /// Attach this variable to a parent table.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Name qualified by its parent chain, joined with `:`.
    pub fn full_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}:{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.full_name(), self.kind)
    }
}
