//! Syntax tree produced by the Lua parser.
//!
//! Only the shapes the symbol analysis consumes are modelled in detail;
//! everything else is kept just precisely enough to walk nested blocks.

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chunk {
    /// Top-level statements
    pub body: Block,
    /// Free (global) identifiers in first-use order, without duplicates
    pub globals: Vec<String>,
}

/// Sequence of statements.
pub type Block = Vec<Stmt>;

/// A statement and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

/// A resolved identifier reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub name: String,
    /// Whether the name resolved to a local binding in scope
    pub is_local: bool,
}

/// Name of a `function a.b:c()` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionName {
    pub base: Name,
    /// Dotted path segments after the base
    pub path: Vec<String>,
    /// Method segment after `:`
    pub method: Option<String>,
}

impl FunctionName {
    /// Whether this declares a plain identifier (no member path or method).
    pub fn is_identifier(&self) -> bool {
        self.path.is_empty() && self.method.is_none()
    }
}

/// Parameters and body of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub params: Vec<String>,
    pub is_vararg: bool,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Local { names: Vec<String>, values: Vec<Expr> },
    Assign { targets: Vec<Expr>, values: Vec<Expr> },
    Function { name: FunctionName, body: FunctionBody },
    LocalFunction { name: String, body: FunctionBody },
    Call(Expr),
    Do(Block),
    While { condition: Expr, body: Block },
    Repeat { body: Block, condition: Expr },
    If { clauses: Vec<(Expr, Block)>, otherwise: Option<Block> },
    NumericFor { var: String, start: Expr, limit: Expr, step: Option<Expr>, body: Block },
    GenericFor { names: Vec<String>, exprs: Vec<Expr>, body: Block },
    Return(Vec<Expr>),
    Break,
    Goto(String),
    Label(String),
}

impl StmtKind {
    /// Blocks nested directly in this statement, in source order.
    pub fn blocks(&self) -> Vec<&Block> {
        match self {
            StmtKind::Function { body, .. } | StmtKind::LocalFunction { body, .. } => vec![&body.body],
            StmtKind::Do(body)
            | StmtKind::While { body, .. }
            | StmtKind::Repeat { body, .. }
            | StmtKind::NumericFor { body, .. }
            | StmtKind::GenericFor { body, .. } => vec![body],
            StmtKind::If { clauses, otherwise } => {
                let mut blocks: Vec<&Block> = clauses.iter().map(|(_, b)| b).collect();
                if let Some(b) = otherwise {
                    blocks.push(b);
                }
                blocks
            }
            _ => vec![],
        }
    }

    /// Expressions written directly in this statement, in source order.
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            StmtKind::Local { values, .. } | StmtKind::Return(values) => values.iter().collect(),
            StmtKind::Assign { targets, values } => targets.iter().chain(values).collect(),
            StmtKind::Call(call) => vec![call],
            StmtKind::While { condition, .. } | StmtKind::Repeat { condition, .. } => vec![condition],
            StmtKind::If { clauses, .. } => clauses.iter().map(|(condition, _)| condition).collect(),
            StmtKind::NumericFor { start, limit, step, .. } => {
                let mut exprs = vec![start, limit];
                exprs.extend(step);
                exprs
            }
            StmtKind::GenericFor { exprs, .. } => exprs.iter().collect(),
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Lt,
    Gt,
    LtEq,
    GtEq,
    NotEq,
    Eq,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    /// Left and right binding power.
    pub fn precedence(&self) -> (u8, u8) {
        match self {
            BinOp::Or => (1, 1),
            BinOp::And => (2, 2),
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq | BinOp::NotEq | BinOp::Eq => (3, 3),
            BinOp::Concat => (9, 8),
            BinOp::Add | BinOp::Sub => (10, 10),
            BinOp::Mul | BinOp::Div | BinOp::Mod => (11, 11),
            BinOp::Pow => (14, 13),
        }
    }
}

/// Binding power of unary operators.
pub const UNARY_PRECEDENCE: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Len,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil,
    Boolean(bool),
    Number { value: f64, raw: String },
    String(String),
    Vararg,
    Name(Name),
    /// `base.name`
    Member { base: Box<Expr>, name: String },
    /// `base[key]`
    Index { base: Box<Expr>, key: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    MethodCall { receiver: Box<Expr>, method: String, args: Vec<Expr> },
    Function(Box<FunctionBody>),
    Table(Vec<Field>),
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnOp, operand: Box<Expr> },
    Paren(Box<Expr>),
}

impl Expr {
    /// Direct subexpressions, in source order. Function bodies are not entered.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Member { base, .. } => vec![&**base],
            Expr::Index { base, key } => vec![&**base, &**key],
            Expr::Call { callee, args } => std::iter::once(&**callee).chain(args).collect(),
            Expr::MethodCall { receiver, args, .. } => std::iter::once(&**receiver).chain(args).collect(),
            Expr::Table(fields) => fields
                .iter()
                .flat_map(|field| match field {
                    Field::Named(_, value) | Field::Positional(value) => vec![value],
                    Field::Keyed(key, value) => vec![key, value],
                })
                .collect(),
            Expr::Binary { lhs, rhs, .. } => vec![&**lhs, &**rhs],
            Expr::Unary { operand, .. } | Expr::Paren(operand) => vec![&**operand],
            _ => vec![],
        }
    }
}

/// Table constructor field.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// `name = value`
    Named(String, Expr),
    /// `[key] = value`
    Keyed(Expr, Expr),
    /// `value`
    Positional(Expr),
}
