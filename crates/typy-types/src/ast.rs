//! AST node types for the typed Python subset.
//!
//! Every node carries a [`Span`] for fault reporting; JSON producers may omit
//! it and the node gets the synthetic span.
//! Large recursive types are boxed to keep enum sizes reasonable.
//! Maps are NOT used here: the AST preserves source order.

use crate::Span;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete module: class definitions, function definitions and
/// statements in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub items: Vec<Item>,
    #[serde(default)]
    pub span: Span,
}

impl Module {
    /// Class definitions in source order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.items.iter().filter_map(|item| match item {
            Item::Class(class) => Some(class),
            _ => None,
        })
    }

    /// Top-level function definitions in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(func) => Some(func),
            _ => None,
        })
    }

    /// Top-level statements in source order.
    pub fn statements(&self) -> impl Iterator<Item = &Stmt> {
        self.items.iter().filter_map(|item| match item {
            Item::Stmt(stmt) => Some(stmt),
            _ => None,
        })
    }
}

/// A top-level module item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Class(ClassDef),
    Function(FunctionDef),
    Stmt(Stmt),
}

impl From<ClassDef> for Item {
    fn from(class: ClassDef) -> Self {
        Item::Class(class)
    }
}

impl From<FunctionDef> for Item {
    fn from(func: FunctionDef) -> Self {
        Item::Function(func)
    }
}

impl From<Stmt> for Item {
    fn from(stmt: Stmt) -> Self {
        Item::Stmt(stmt)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Classes & Functions
// ══════════════════════════════════════════════════════════════════════════════

/// `class Name: fields... methods...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: Ident,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FunctionDef>,
    #[serde(default)]
    pub span: Span,
}

/// A field declaration with its default: `real: int = 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: Ident,
    pub type_ann: TypeAnnotation,
    pub default: Expr,
    #[serde(default)]
    pub span: Span,
}

/// `def name(params) -> ret: body`
///
/// Methods use the same node; their first parameter is `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Ident,
    pub params: Vec<Param>,
    #[serde(default)]
    pub ret: Option<TypeAnnotation>,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// A parameter: `name: type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub type_ann: TypeAnnotation,
    #[serde(default)]
    pub span: Span,
}

/// An indented statement suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// `name: Type = expr`
    VarDecl(VarDecl),
    /// `name = expr` or `obj.field = expr`
    Assign(AssignStmt),
    /// A bare expression; the value is discarded.
    Expr(ExprStmt),
    /// `if cond: ... [elif cond: ...]* [else: ...]`
    If(IfStmt),
    /// `while cond: ...`
    While(WhileStmt),
    /// `for name in expr: ...`
    For(ForStmt),
    /// `return [expr]`
    Return(ReturnStmt),
    /// `pass`
    Pass {
        #[serde(default)]
        span: Span,
    },
}

impl Stmt {
    /// Source span of the statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Pass { span } => *span,
        }
    }
}

/// `name: Type = expr`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Ident,
    pub type_ann: TypeAnnotation,
    pub value: Expr,
    #[serde(default)]
    pub span: Span,
}

/// `target = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: AssignTarget,
    pub value: Expr,
    #[serde(default)]
    pub span: Span,
}

/// The left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignTarget {
    /// `x = ...`
    Name(Ident),
    /// `expr.field = ...`
    Field { object: Expr, field: Ident },
}

/// A bare expression statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    #[serde(default)]
    pub span: Span,
}

/// `if cond: ... [elif ...] [else: ...]`
///
/// `elif` chains nest through [`ElseBranch::Elif`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    #[serde(default)]
    pub else_branch: Option<ElseBranch>,
    #[serde(default)]
    pub span: Span,
}

/// The else branch of an if statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElseBranch {
    /// `elif cond: ...`
    Elif(Box<IfStmt>),
    /// `else: ...`
    Block(Block),
}

/// `while cond: ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// `for item in iterable: ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub item: Ident,
    pub iterable: Expr,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// `return [expr]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    #[serde(default)]
    pub value: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    // ── Literals ──
    /// `42`. In JSON, a number when it fits in `i64`, otherwise a decimal string.
    IntLit(#[serde(with = "int_literal")] BigInt),
    /// `"hello"` (escapes already resolved by the front-end)
    StrLit(String),
    /// `True` / `False`
    BoolLit(bool),
    /// `None`
    NoneLit,

    // ── Names & Calls ──
    /// `my_var`
    Identifier(String),
    /// `func(args...)` — function, class constructor or builtin
    Call { name: Ident, args: Vec<Expr> },
    /// `expr.field`
    FieldAccess { object: Box<Expr>, field: Ident },
    /// `expr.method(args...)`
    MethodCall {
        object: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },

    // ── Operators ──
    /// `a + b`, `a == b`, `a is b`, `a and b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `-x`, `not x`
    Unary { op: UnaryOp, operand: Box<Expr> },

    // ── Strings ──
    /// `s[i]`
    Index { object: Box<Expr>, index: Box<Expr> },
    /// `s[start:stop:step]`; every bound is optional
    Slice {
        object: Box<Expr>,
        #[serde(default)]
        start: Option<Box<Expr>>,
        #[serde(default)]
        stop: Option<Box<Expr>>,
        #[serde(default)]
        step: Option<Box<Expr>>,
    },

    // ── Grouping ──
    /// `(expr)`
    Paren(Box<Expr>),
}

// ── Binary Operators ──────────────────────────────────────────────────────────

/// Binary operators (in precedence order, lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    // Logical
    Or,
    And,
    // Comparison
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Is,
    // Arithmetic
    Add,
    Sub,
    Mul,
    FloorDiv,
    Mod,
}

impl BinOp {
    /// Returns the operator symbol for fault messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::Is => "is",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `not x`
    Not,
}

// ══════════════════════════════════════════════════════════════════════════════
// Type Annotations
// ══════════════════════════════════════════════════════════════════════════════

/// A type annotation. The runtime trusts annotations and never checks them;
/// they are kept for hosts and for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAnnotation {
    pub kind: TypeKind,
    #[serde(default)]
    pub span: Span,
}

impl TypeAnnotation {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// `str`
    Str,
    /// `None` (return type of procedures)
    None,
    /// `object`
    Object,
    /// A user class: `Vector`, `ComplexNumber`
    Class(String),
}

/// JSON form of integer literals, which may exceed what a JSON number holds.
mod int_literal {
    use num_bigint::BigInt;
    use num_traits::ToPrimitive;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Small(i64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(n: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        match n.to_i64() {
            Some(small) => serializer.serialize_i64(small),
            None => serializer.serialize_str(&n.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Small(n) => Ok(BigInt::from(n)),
            Repr::Text(text) => text
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid integer literal '{text}'"))),
        }
    }
}
