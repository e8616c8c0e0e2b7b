//! Lua parsing.
//!
//! The build consumes Lua through the [`LuaParser`] trait: source text in,
//! a [`Chunk`](ast::Chunk) with resolved global references out. The bundled
//! [`StandardParser`] covers Lua 5.1 plus `goto` and labels.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::Chunk;

use std::fmt;

/// A syntax error with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// Parses Lua source into a syntax tree.
pub trait LuaParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Chunk, SyntaxError>;
}

/// Built-in recursive-descent parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardParser;

impl LuaParser for StandardParser {
    fn parse(&self, source: &str) -> Result<Chunk, SyntaxError> {
        let tokens = lexer::tokenize(source)?;
        parser::Parser::new(source, tokens).parse_chunk()
    }
}
