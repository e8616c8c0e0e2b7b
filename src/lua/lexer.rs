//! Logos-based lexer for Lua source.
//!
//! Comments are emitted as tokens and dropped by [`tokenize`], so the parser
//! only ever sees significant tokens.

use super::SyntaxError;
use logos::Logos;
use std::ops::Range;

/// A significant token with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Lua tokens.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f\v]+")]
pub enum Token {
    // Keywords
    #[token("and")]
    And,
    #[token("break")]
    Break,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("elseif")]
    ElseIf,
    #[token("end")]
    End,
    #[token("false")]
    False,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("in")]
    In,
    #[token("local")]
    Local,
    #[token("nil")]
    Nil,
    #[token("not")]
    Not,
    #[token("or")]
    Or,
    #[token("repeat")]
    Repeat,
    #[token("return")]
    Return,
    #[token("then")]
    Then,
    #[token("true")]
    True,
    #[token("until")]
    Until,
    #[token("while")]
    While,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),

    #[regex(r"0[xX][0-9a-fA-F]*(\.[0-9a-fA-F]*)?([pP][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    /// Quoted string, raw text including quotes
    #[regex(r#""([^"\\\n]|\\(.|\n))*""#, |lex| lex.slice().to_string())]
    #[regex(r#"'([^'\\\n]|\\(.|\n))*'"#, |lex| lex.slice().to_string())]
    QuotedString(String),

    /// Long bracket string, contents only
    #[regex(r"\[=*\[", lex_long_string)]
    LongString(String),

    #[token("--", lex_comment)]
    Comment,

    // Punctuation, longest first
    #[token("...")]
    Ellipsis,
    #[token("..")]
    Concat,
    #[token("::")]
    DoubleColon,
    #[token("==")]
    Eq,
    #[token("~=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("#")]
    Hash,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
}

impl Token {
    /// Text used when quoting the token in an error message.
    pub fn describe(&self) -> String {
        match self {
            Token::Name(s) | Token::Number(s) | Token::QuotedString(s) => s.clone(),
            Token::LongString(_) => "[[...]]".to_string(),
            Token::Comment => "--".to_string(),
            other => punct_text(other).to_string(),
        }
    }
}

fn punct_text(token: &Token) -> &'static str {
    match token {
        Token::And => "and",
        Token::Break => "break",
        Token::Do => "do",
        Token::Else => "else",
        Token::ElseIf => "elseif",
        Token::End => "end",
        Token::False => "false",
        Token::For => "for",
        Token::Function => "function",
        Token::If => "if",
        Token::In => "in",
        Token::Local => "local",
        Token::Nil => "nil",
        Token::Not => "not",
        Token::Or => "or",
        Token::Repeat => "repeat",
        Token::Return => "return",
        Token::Then => "then",
        Token::True => "true",
        Token::Until => "until",
        Token::While => "while",
        Token::Ellipsis => "...",
        Token::Concat => "..",
        Token::DoubleColon => "::",
        Token::Eq => "==",
        Token::NotEq => "~=",
        Token::LtEq => "<=",
        Token::GtEq => ">=",
        Token::Plus => "+",
        Token::Minus => "-",
        Token::Star => "*",
        Token::Slash => "/",
        Token::Percent => "%",
        Token::Caret => "^",
        Token::Hash => "#",
        Token::Lt => "<",
        Token::Gt => ">",
        Token::Assign => "=",
        Token::LParen => "(",
        Token::RParen => ")",
        Token::LBrace => "{",
        Token::RBrace => "}",
        Token::LBracket => "[",
        Token::RBracket => "]",
        Token::Semicolon => ";",
        Token::Colon => ":",
        Token::Comma => ",",
        Token::Dot => ".",
        Token::Name(_) | Token::Number(_) | Token::QuotedString(_) | Token::LongString(_) | Token::Comment => "",
    }
}

/// Find the closing bracket of a long string or comment opened with `level` equals signs.
///
/// Returns the byte length of the contents and the total length consumed.
fn find_long_close(rest: &str, level: usize) -> Option<(usize, usize)> {
    let close = format!("]{}]", "=".repeat(level));
    rest.find(&close).map(|pos| (pos, pos + close.len()))
}

fn lex_long_string(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let level = lex.slice().len() - 2;
    let (content_len, consumed) = find_long_close(lex.remainder(), level)?;
    let content = &lex.remainder()[..content_len];
    // A newline directly after the opening bracket is not part of the string
    let content = content
        .strip_prefix("\r\n")
        .or_else(|| content.strip_prefix('\n'))
        .unwrap_or(content)
        .to_string();
    lex.bump(consumed);
    Some(content)
}

fn lex_comment(lex: &mut logos::Lexer<Token>) -> bool {
    let rest = lex.remainder();
    if let Some(after) = rest.strip_prefix('[') {
        let level = after.chars().take_while(|&c| c == '=').count();
        if after[level..].starts_with('[') {
            return match find_long_close(&after[level + 1..], level) {
                Some((_, consumed)) => {
                    lex.bump(1 + level + 1 + consumed);
                    true
                }
                None => false,
            };
        }
    }
    let line_len = rest.find('\n').unwrap_or(rest.len());
    lex.bump(line_len);
    true
}

/// Tokenize a source string, dropping comments.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(Token::Comment) => {}
            Ok(token) => tokens.push(Spanned { token, span }),
            Err(()) => {
                let (line, column) = line_column(source, span.start);
                let text = &source[span.clone()];
                let message = if text.starts_with('"') || text.starts_with('\'') {
                    format!("unfinished string near '{}'", text)
                } else if text.starts_with("--") || text.starts_with('[') {
                    "unfinished long string or comment".to_string()
                } else {
                    format!("unexpected symbol near '{}'", text)
                };
                return Err(SyntaxError { line, column, message });
            }
        }
    }

    Ok(tokens)
}

/// Compute 1-based line and column for a byte offset.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|p| p + 1).unwrap_or(0);
    (line, before[line_start..].chars().count() + 1)
}
