//! Recursive-descent parser for Lua.
//!
//! Keeps a stack of lexical scopes while parsing so every [`Name`] knows
//! whether it refers to a local, and every free name lands in
//! [`Chunk::globals`] in first-use order.

use super::ast::*;
use super::lexer::{Spanned, Token};
use super::SyntaxError;
use indexmap::IndexSet;

type ParseResult<T> = Result<T, SyntaxError>;

/// Parser over a token stream.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    line_starts: Vec<usize>,
    scopes: Vec<Vec<String>>,
    globals: IndexSet<String>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Spanned>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            tokens,
            pos: 0,
            line_starts,
            scopes: vec![Vec::new()],
            globals: IndexSet::new(),
        }
    }

    /// Parse the whole token stream as a chunk.
    pub fn parse_chunk(mut self) -> ParseResult<Chunk> {
        let body = self.parse_block()?;
        if self.peek().is_some() {
            return Err(self.error("'<eof>' expected"));
        }
        Ok(Chunk { body, globals: self.globals.into_iter().collect() })
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|s| &s.token)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error(&format!("'{}' expected", token.describe())))
        }
    }

    /// Expect a closing token, naming the opener when it sits on another line.
    fn expect_closing(&mut self, close: Token, open: &str, open_line: usize) -> ParseResult<()> {
        if self.eat(&close) {
            return Ok(());
        }
        if open_line == self.current_line() {
            Err(self.error(&format!("'{}' expected", close.describe())))
        } else {
            Err(self.error(&format!(
                "'{}' expected (to close '{}' at line {})",
                close.describe(),
                open,
                open_line
            )))
        }
    }

    fn expect_name(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Name(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("<name> expected")),
        }
    }

    fn current_offset(&self) -> usize {
        self.tokens.get(self.pos).map(|s| s.span.start).unwrap_or(self.source.len())
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset).max(1);
        let line_start = self.line_starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        (line, column)
    }

    fn current_line(&self) -> usize {
        self.position(self.current_offset()).0
    }

    fn error(&self, message: &str) -> SyntaxError {
        let (line, column) = self.position(self.current_offset());
        let near = self.peek().map(Token::describe).unwrap_or_else(|| "<eof>".to_string());
        SyntaxError { line, column, message: format!("{} near '{}'", message, near) }
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(name.to_string());
        }
    }

    fn resolve(&mut self, name: String) -> Name {
        let is_local = self.scopes.iter().rev().any(|scope| scope.iter().any(|n| *n == name));
        if !is_local {
            self.globals.insert(name.clone());
        }
        Name { name, is_local }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block_follows(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(Token::End) | Some(Token::Else) | Some(Token::ElseIf) | Some(Token::Until)
        )
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let mut block = Vec::new();
        loop {
            while self.eat(&Token::Semicolon) {}
            if self.block_follows() {
                break;
            }
            if self.check(&Token::Return) {
                let line = self.current_line();
                self.pos += 1;
                let values = if self.block_follows() || self.check(&Token::Semicolon) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                self.eat(&Token::Semicolon);
                block.push(Stmt { kind: StmtKind::Return(values), line });
                if !self.block_follows() {
                    return Err(self.error("'end' expected"));
                }
                break;
            }
            block.push(self.parse_statement()?);
        }
        Ok(block)
    }

    fn parse_scoped_block(&mut self) -> ParseResult<Block> {
        self.push_scope();
        let block = self.parse_block();
        self.pop_scope();
        block
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let kind = match self.peek() {
            Some(Token::Local) => {
                self.pos += 1;
                if self.eat(&Token::Function) {
                    let name = self.expect_name()?;
                    self.declare(&name);
                    let body = self.parse_function_body(false, line)?;
                    StmtKind::LocalFunction { name, body }
                } else {
                    let mut names = vec![self.expect_name()?];
                    while self.eat(&Token::Comma) {
                        names.push(self.expect_name()?);
                    }
                    let values = if self.eat(&Token::Assign) { self.parse_expr_list()? } else { Vec::new() };
                    for name in &names {
                        self.declare(name);
                    }
                    StmtKind::Local { names, values }
                }
            }
            Some(Token::Function) => {
                self.pos += 1;
                let base = self.expect_name()?;
                let base = self.resolve(base);
                let mut path = Vec::new();
                while self.eat(&Token::Dot) {
                    path.push(self.expect_name()?);
                }
                let method = if self.eat(&Token::Colon) { Some(self.expect_name()?) } else { None };
                let body = self.parse_function_body(method.is_some(), line)?;
                StmtKind::Function { name: FunctionName { base, path, method }, body }
            }
            Some(Token::Do) => {
                self.pos += 1;
                let body = self.parse_scoped_block()?;
                self.expect_closing(Token::End, "do", line)?;
                StmtKind::Do(body)
            }
            Some(Token::While) => {
                self.pos += 1;
                let condition = self.parse_expr()?;
                self.expect(Token::Do)?;
                let body = self.parse_scoped_block()?;
                self.expect_closing(Token::End, "while", line)?;
                StmtKind::While { condition, body }
            }
            Some(Token::Repeat) => {
                self.pos += 1;
                // The condition can see the body's locals
                self.push_scope();
                let body = self.parse_block();
                let result = body.and_then(|body| {
                    self.expect_closing(Token::Until, "repeat", line)?;
                    Ok((body, self.parse_expr()?))
                });
                self.pop_scope();
                let (body, condition) = result?;
                StmtKind::Repeat { body, condition }
            }
            Some(Token::If) => self.parse_if(line)?,
            Some(Token::For) => self.parse_for(line)?,
            Some(Token::Break) => {
                self.pos += 1;
                StmtKind::Break
            }
            // `goto` is only a keyword when a label name follows
            Some(Token::Name(word)) if word == "goto" && matches!(self.peek_nth(1), Some(Token::Name(_))) => {
                self.pos += 1;
                StmtKind::Goto(self.expect_name()?)
            }
            Some(Token::DoubleColon) => {
                self.pos += 1;
                let label = self.expect_name()?;
                self.expect(Token::DoubleColon)?;
                StmtKind::Label(label)
            }
            _ => self.parse_expr_statement()?,
        };
        Ok(Stmt { kind, line })
    }

    fn parse_if(&mut self, line: usize) -> ParseResult<StmtKind> {
        self.pos += 1;
        let mut clauses = Vec::new();
        let condition = self.parse_expr()?;
        self.expect(Token::Then)?;
        clauses.push((condition, self.parse_scoped_block()?));

        let mut otherwise = None;
        loop {
            if self.eat(&Token::ElseIf) {
                let condition = self.parse_expr()?;
                self.expect(Token::Then)?;
                clauses.push((condition, self.parse_scoped_block()?));
            } else if self.eat(&Token::Else) {
                otherwise = Some(self.parse_scoped_block()?);
                self.expect_closing(Token::End, "if", line)?;
                break;
            } else {
                self.expect_closing(Token::End, "if", line)?;
                break;
            }
        }
        Ok(StmtKind::If { clauses, otherwise })
    }

    fn parse_for(&mut self, line: usize) -> ParseResult<StmtKind> {
        self.pos += 1;
        let first = self.expect_name()?;

        if self.eat(&Token::Assign) {
            let start = self.parse_expr()?;
            self.expect(Token::Comma)?;
            let limit = self.parse_expr()?;
            let step = if self.eat(&Token::Comma) { Some(self.parse_expr()?) } else { None };
            self.expect(Token::Do)?;
            self.push_scope();
            self.declare(&first);
            let body = self.parse_block();
            self.pop_scope();
            let body = body?;
            self.expect_closing(Token::End, "for", line)?;
            return Ok(StmtKind::NumericFor { var: first, start, limit, step, body });
        }

        let mut names = vec![first];
        while self.eat(&Token::Comma) {
            names.push(self.expect_name()?);
        }
        self.expect(Token::In)?;
        let exprs = self.parse_expr_list()?;
        self.expect(Token::Do)?;
        self.push_scope();
        for name in &names {
            self.declare(name);
        }
        let body = self.parse_block();
        self.pop_scope();
        let body = body?;
        self.expect_closing(Token::End, "for", line)?;
        Ok(StmtKind::GenericFor { names, exprs, body })
    }

    fn parse_expr_statement(&mut self) -> ParseResult<StmtKind> {
        let first = self.parse_suffixed_expr()?;

        if self.check(&Token::Assign) || self.check(&Token::Comma) {
            let mut targets = vec![first];
            while self.eat(&Token::Comma) {
                targets.push(self.parse_suffixed_expr()?);
            }
            if !targets.iter().all(is_assignable) {
                return Err(self.error("syntax error"));
            }
            self.expect(Token::Assign)?;
            let values = self.parse_expr_list()?;
            return Ok(StmtKind::Assign { targets, values });
        }

        match first {
            Expr::Call { .. } | Expr::MethodCall { .. } => Ok(StmtKind::Call(first)),
            _ => Err(self.error("syntax error")),
        }
    }

    fn parse_function_body(&mut self, is_method: bool, line: usize) -> ParseResult<FunctionBody> {
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        let mut is_vararg = false;
        if !self.check(&Token::RParen) {
            loop {
                if self.eat(&Token::Ellipsis) {
                    is_vararg = true;
                    break;
                }
                params.push(self.expect_name()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        self.push_scope();
        if is_method {
            self.declare("self");
        }
        for param in &params {
            self.declare(param);
        }
        let body = self.parse_block();
        self.pop_scope();
        let body = body?;
        self.expect_closing(Token::End, "function", line)?;
        Ok(FunctionBody { params, is_vararg, body })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expr_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(&Token::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_subexpr(0)
    }

    fn parse_subexpr(&mut self, limit: u8) -> ParseResult<Expr> {
        let mut lhs = match self.peek().and_then(unary_op) {
            Some(op) => {
                self.pos += 1;
                let operand = self.parse_subexpr(UNARY_PRECEDENCE)?;
                Expr::Unary { op, operand: Box::new(operand) }
            }
            None => self.parse_simple_expr()?,
        };

        while let Some(op) = self.peek().and_then(binary_op) {
            let (left, right) = op.precedence();
            if left <= limit {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_subexpr(right)?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_simple_expr(&mut self) -> ParseResult<Expr> {
        let expr = match self.peek() {
            Some(Token::Nil) => Expr::Nil,
            Some(Token::True) => Expr::Boolean(true),
            Some(Token::False) => Expr::Boolean(false),
            Some(Token::Ellipsis) => Expr::Vararg,
            Some(Token::Number(raw)) => {
                let raw = raw.clone();
                let value = parse_number(&raw).ok_or_else(|| self.error("malformed number"))?;
                Expr::Number { value, raw }
            }
            Some(Token::QuotedString(raw)) => Expr::String(unescape(raw)),
            Some(Token::LongString(s)) => Expr::String(s.clone()),
            Some(Token::LBrace) => return self.parse_table(),
            Some(Token::Function) => {
                let line = self.current_line();
                self.pos += 1;
                let body = self.parse_function_body(false, line)?;
                return Ok(Expr::Function(Box::new(body)));
            }
            _ => return self.parse_suffixed_expr(),
        };
        self.pos += 1;
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Some(Token::Name(_)) => {
                let name = self.expect_name()?;
                Ok(Expr::Name(self.resolve(name)))
            }
            Some(Token::LParen) => {
                let line = self.current_line();
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect_closing(Token::RParen, "(", line)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            _ => Err(self.error("unexpected symbol")),
        }
    }

    fn parse_suffixed_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.expect_name()?;
                    expr = Expr::Member { base: Box::new(expr), name };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let key = self.parse_expr()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index { base: Box::new(expr), key: Box::new(key) };
                }
                Some(Token::Colon) => {
                    self.pos += 1;
                    let method = self.expect_name()?;
                    let args = self.parse_call_args()?;
                    expr = Expr::MethodCall { receiver: Box::new(expr), method, args };
                }
                Some(Token::LParen) | Some(Token::QuotedString(_)) | Some(Token::LongString(_)) | Some(Token::LBrace) => {
                    let args = self.parse_call_args()?;
                    expr = Expr::Call { callee: Box::new(expr), args };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        match self.peek() {
            Some(Token::QuotedString(_)) | Some(Token::LongString(_)) => Ok(vec![self.parse_simple_expr()?]),
            Some(Token::LBrace) => Ok(vec![self.parse_table()?]),
            Some(Token::LParen) => {
                let line = self.current_line();
                self.pos += 1;
                if self.eat(&Token::RParen) {
                    return Ok(Vec::new());
                }
                let args = self.parse_expr_list()?;
                self.expect_closing(Token::RParen, "(", line)?;
                Ok(args)
            }
            _ => Err(self.error("function arguments expected")),
        }
    }

    fn parse_table(&mut self) -> ParseResult<Expr> {
        let line = self.current_line();
        self.expect(Token::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(&Token::RBrace) {
            let field = match (self.peek(), self.peek_nth(1)) {
                (Some(Token::Name(_)), Some(Token::Assign)) => {
                    let name = self.expect_name()?;
                    self.pos += 1;
                    Field::Named(name, self.parse_expr()?)
                }
                (Some(Token::LBracket), _) => {
                    self.pos += 1;
                    let key = self.parse_expr()?;
                    self.expect(Token::RBracket)?;
                    self.expect(Token::Assign)?;
                    Field::Keyed(key, self.parse_expr()?)
                }
                _ => Field::Positional(self.parse_expr()?),
            };
            fields.push(field);
            if !self.eat(&Token::Comma) && !self.eat(&Token::Semicolon) {
                break;
            }
        }
        self.expect_closing(Token::RBrace, "{", line)?;
        Ok(Expr::Table(fields))
    }
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(expr, Expr::Name(_) | Expr::Member { .. } | Expr::Index { .. })
}

fn unary_op(token: &Token) -> Option<UnOp> {
    match token {
        Token::Minus => Some(UnOp::Neg),
        Token::Not => Some(UnOp::Not),
        Token::Hash => Some(UnOp::Len),
        _ => None,
    }
}

fn binary_op(token: &Token) -> Option<BinOp> {
    Some(match token {
        Token::Or => BinOp::Or,
        Token::And => BinOp::And,
        Token::Lt => BinOp::Lt,
        Token::Gt => BinOp::Gt,
        Token::LtEq => BinOp::LtEq,
        Token::GtEq => BinOp::GtEq,
        Token::NotEq => BinOp::NotEq,
        Token::Eq => BinOp::Eq,
        Token::Concat => BinOp::Concat,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::Percent => BinOp::Mod,
        Token::Caret => BinOp::Pow,
        _ => return None,
    })
}

/// Numeric value of a number literal.
pub fn parse_number(raw: &str) -> Option<f64> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        let digits: String = hex.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
        if digits.is_empty() {
            return None;
        }
        return u64::from_str_radix(&digits, 16).ok().map(|v| v as f64);
    }
    raw.parse().ok()
}

/// Decode a quoted string literal, including its quotes, into its value.
pub fn unescape(raw: &str) -> String {
    let inner = if raw.len() >= 2 { &raw[1..raw.len() - 1] } else { raw };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{7}'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('\n') => out.push('\n'),
            Some('x') => {
                let hex: String = (0..2).filter_map(|_| chars.next_if(|c| c.is_ascii_hexdigit())).collect();
                if let Some(ch) = u8::from_str_radix(&hex, 16).ok().map(char::from) {
                    out.push(ch);
                }
            }
            Some('z') => {
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
            }
            Some(d) if d.is_ascii_digit() => {
                let mut digits = d.to_string();
                while digits.len() < 3 {
                    match chars.next_if(|c| c.is_ascii_digit()) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                if let Some(ch) = digits.parse::<u32>().ok().and_then(char::from_u32) {
                    out.push(ch);
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::lexer::tokenize;

    fn parse(source: &str) -> Chunk {
        Parser::new(source, tokenize(source).unwrap()).parse_chunk().unwrap()
    }

    fn parse_err(source: &str) -> SyntaxError {
        Parser::new(source, tokenize(source).unwrap()).parse_chunk().unwrap_err()
    }

    fn expr(source: &str) -> Expr {
        let chunk = parse(&format!("return {}", source));
        match chunk.body.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Return(mut values)) => values.remove(0),
            other => panic!("expected return, got {:?}", other),
        }
    }

    #[test]
    fn test_globals_in_first_use_order() {
        let chunk = parse("Foo()\nBar = Baz\nFoo()");
        assert_eq!(chunk.globals, vec!["Foo", "Bar", "Baz"]);
    }

    #[test]
    fn test_locals_are_not_globals() {
        let chunk = parse("local a = 1\nlocal function f(x) return x + a end\nf(2)");
        assert!(chunk.globals.is_empty());
    }

    #[test]
    fn test_local_initializer_sees_outer_name() {
        let chunk = parse("local print = print");
        assert_eq!(chunk.globals, vec!["print"]);
    }

    #[test]
    fn test_local_scope_ends_with_block() {
        let chunk = parse("do local x = 1 end\nprint(x)");
        assert_eq!(chunk.globals, vec!["print", "x"]);
    }

    #[test]
    fn test_method_has_implicit_self() {
        let chunk = parse("function Addon:Init() self.ready = true end");
        assert_eq!(chunk.globals, vec!["Addon"]);
        match &chunk.body[0].kind {
            StmtKind::Function { name, .. } => {
                assert_eq!(name.base.name, "Addon");
                assert_eq!(name.method.as_deref(), Some("Init"));
                assert!(!name.is_identifier());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_repeat_condition_sees_body_locals() {
        let chunk = parse("repeat local done = true until done");
        assert!(chunk.globals.is_empty());
    }

    #[test]
    fn test_for_variables_are_local() {
        let chunk = parse("for i = 1, 10 do print(i) end\nfor k, v in pairs(t) do print(k, v) end");
        assert_eq!(chunk.globals, vec!["print", "pairs", "t"]);
    }

    #[test]
    fn test_precedence() {
        match expr("1 + 2 * 3") {
            Expr::Binary { op: BinOp::Add, rhs, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_concat_is_right_associative() {
        match expr("a .. b .. c") {
            Expr::Binary { op: BinOp::Concat, lhs, rhs } => {
                assert!(matches!(*lhs, Expr::Name(_)));
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Concat, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unary_binds_looser_than_pow() {
        match expr("-x ^ 2") {
            Expr::Unary { op: UnOp::Neg, operand } => {
                assert!(matches!(*operand, Expr::Binary { op: BinOp::Pow, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_table_fields() {
        match expr("{ a = 1, [\"b\"] = 2; 3 }") {
            Expr::Table(fields) => {
                assert!(matches!(fields[0], Field::Named(ref n, _) if n == "a"));
                assert!(matches!(fields[1], Field::Keyed(Expr::String(ref s), _) if s == "b"));
                assert!(matches!(fields[2], Field::Positional(Expr::Number { .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_string_call_shorthand() {
        let chunk = parse("require \"lib\"\nsetup { debug = true }");
        assert_eq!(chunk.body.len(), 2);
        assert!(matches!(chunk.body[0].kind, StmtKind::Call(Expr::Call { .. })));
    }

    #[test]
    fn test_statement_lines() {
        let chunk = parse("a = 1\n\nb = 2");
        assert_eq!(chunk.body[0].line, 1);
        assert_eq!(chunk.body[1].line, 3);
    }

    #[test]
    fn test_goto_and_label() {
        let chunk = parse("for i = 1, 3 do if i == 2 then goto continue end ::continue:: end");
        assert!(chunk.globals.is_empty());
    }

    #[test]
    fn test_goto_as_identifier() {
        let chunk = parse("local goto = 1\nprint(goto)\ngoto = goto + 1");
        assert!(chunk.globals.iter().all(|name| name != "goto"));
        assert_eq!(chunk.body.len(), 3);
    }

    #[test]
    fn test_global_named_goto() {
        let chunk = parse("goto = 1");
        assert_eq!(chunk.globals, vec!["goto"]);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#""a\nb""#), "a\nb");
        assert_eq!(unescape(r#"'it\'s'"#), "it's");
        assert_eq!(unescape(r#""\65\066""#), "AB");
        assert_eq!(unescape(r#""\x41""#), "A");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0x10"), Some(16.0));
        assert_eq!(parse_number("1.5e1"), Some(15.0));
        assert_eq!(parse_number(".5"), Some(0.5));
    }

    #[test]
    fn test_missing_end_names_opener() {
        let err = parse_err("function f()\n  x = 1\n");
        assert_eq!(err.line, 3);
        assert!(err.message.contains("'end' expected (to close 'function' at line 1)"));
    }

    #[test]
    fn test_non_call_expression_statement() {
        let err = parse_err("x");
        assert!(err.message.starts_with("syntax error"));
    }

    #[test]
    fn test_unexpected_symbol() {
        let err = parse_err("x = = 1");
        assert_eq!((err.line, err.column), (1, 5));
        assert!(err.message.contains("unexpected symbol near '='"));
    }
}
