//! In-memory construction API.
//!
//! Hosts and tests use these helpers to assemble a [`Module`] without a
//! front-end. Every node gets the synthetic span.
//!
//! ```
//! use typy_types::build::*;
//! use typy_types::ast::TypeKind;
//!
//! let m = module(vec![
//!     declare("x", TypeKind::Int, int(7)).into(),
//!     print(floordiv(var("x"), int(2))).into(),
//! ]);
//! assert_eq!(m.items.len(), 2);
//! ```

use crate::ast::*;
use crate::Span;

fn sp() -> Span {
    Span::synthetic()
}

// ── Names & Types ────────────────────────────────────────────────────────────

pub fn ident(name: &str) -> Ident {
    Ident::new(name, sp())
}

pub fn ty(kind: TypeKind) -> TypeAnnotation {
    TypeAnnotation::new(kind, sp())
}

/// A user class type.
pub fn class_ty(name: &str) -> TypeKind {
    TypeKind::Class(name.to_string())
}

// ── Literals ────────────────────────────────────────────────────────────────

pub fn int(n: i64) -> Expr {
    big_int(n.into())
}

/// An integer literal of any size.
pub fn big_int(n: num_bigint::BigInt) -> Expr {
    Expr::new(ExprKind::IntLit(n), sp())
}

pub fn string(s: &str) -> Expr {
    Expr::new(ExprKind::StrLit(s.to_string()), sp())
}

pub fn boolean(b: bool) -> Expr {
    Expr::new(ExprKind::BoolLit(b), sp())
}

pub fn none() -> Expr {
    Expr::new(ExprKind::NoneLit, sp())
}

// ── Names, Calls, Members ──────────────────────────────────────────────────

pub fn var(name: &str) -> Expr {
    Expr::new(ExprKind::Identifier(name.to_string()), sp())
}

/// `name(args...)`: a function, a class constructor or a builtin.
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::new(
        ExprKind::Call {
            name: ident(name),
            args,
        },
        sp(),
    )
}

/// `ClassName()`
pub fn construct(class: &str) -> Expr {
    call(class, vec![])
}

pub fn field(object: Expr, name: &str) -> Expr {
    Expr::new(
        ExprKind::FieldAccess {
            object: Box::new(object),
            field: ident(name),
        },
        sp(),
    )
}

pub fn method(object: Expr, name: &str, args: Vec<Expr>) -> Expr {
    Expr::new(
        ExprKind::MethodCall {
            object: Box::new(object),
            method: ident(name),
            args,
        },
        sp(),
    )
}

// ── Operators ───────────────────────────────────────────────────────────────

pub fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        sp(),
    )
}

pub fn add(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Add, right)
}

pub fn sub(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Sub, right)
}

pub fn mul(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Mul, right)
}

pub fn floordiv(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::FloorDiv, right)
}

pub fn modulo(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Mod, right)
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Eq, right)
}

pub fn ne(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::NotEq, right)
}

pub fn lt(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Less, right)
}

pub fn gt(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Greater, right)
}

pub fn le(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::LessEq, right)
}

pub fn ge(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::GreaterEq, right)
}

pub fn is(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Is, right)
}

pub fn and(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::And, right)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    binary(left, BinOp::Or, right)
}

pub fn not(operand: Expr) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        },
        sp(),
    )
}

pub fn neg(operand: Expr) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        },
        sp(),
    )
}

pub fn paren(inner: Expr) -> Expr {
    Expr::new(ExprKind::Paren(Box::new(inner)), sp())
}

// ── Strings ─────────────────────────────────────────────────────────────────

pub fn index(object: Expr, idx: Expr) -> Expr {
    Expr::new(
        ExprKind::Index {
            object: Box::new(object),
            index: Box::new(idx),
        },
        sp(),
    )
}

/// `object[start:stop:step]` with any bound omitted by passing `None`.
pub fn slice(object: Expr, start: Option<Expr>, stop: Option<Expr>, step: Option<Expr>) -> Expr {
    Expr::new(
        ExprKind::Slice {
            object: Box::new(object),
            start: start.map(Box::new),
            stop: stop.map(Box::new),
            step: step.map(Box::new),
        },
        sp(),
    )
}

/// `len(object)`
pub fn len(object: Expr) -> Expr {
    call("len", vec![object])
}

// ── Statements ──────────────────────────────────────────────────────────────

pub fn block(stmts: Vec<Stmt>) -> Block {
    Block { stmts, span: sp() }
}

/// `name: ty = value`
pub fn declare(name: &str, kind: TypeKind, value: Expr) -> Stmt {
    Stmt::VarDecl(VarDecl {
        name: ident(name),
        type_ann: ty(kind),
        value,
        span: sp(),
    })
}

/// `name = value`
pub fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::Assign(AssignStmt {
        target: AssignTarget::Name(ident(name)),
        value,
        span: sp(),
    })
}

/// `object.field = value`
pub fn assign_field(object: Expr, field_name: &str, value: Expr) -> Stmt {
    Stmt::Assign(AssignStmt {
        target: AssignTarget::Field {
            object,
            field: ident(field_name),
        },
        value,
        span: sp(),
    })
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(ExprStmt { expr, span: sp() })
}

/// `print(value)` as a statement.
pub fn print(value: Expr) -> Stmt {
    expr_stmt(call("print", vec![value]))
}

/// `if cond: then`
pub fn if_then(condition: Expr, then: Vec<Stmt>) -> Stmt {
    if_chain(condition, then, vec![], None)
}

/// `if cond: then [elif c: b]* [else: otherwise]`
pub fn if_chain(
    condition: Expr,
    then: Vec<Stmt>,
    elifs: Vec<(Expr, Vec<Stmt>)>,
    otherwise: Option<Vec<Stmt>>,
) -> Stmt {
    let mut tail = otherwise.map(|stmts| ElseBranch::Block(block(stmts)));
    for (cond, body) in elifs.into_iter().rev() {
        tail = Some(ElseBranch::Elif(Box::new(IfStmt {
            condition: cond,
            then_block: block(body),
            else_branch: tail,
            span: sp(),
        })));
    }
    Stmt::If(IfStmt {
        condition,
        then_block: block(then),
        else_branch: tail,
        span: sp(),
    })
}

pub fn while_loop(condition: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While(WhileStmt {
        condition,
        body: block(body),
        span: sp(),
    })
}

pub fn for_in(item: &str, iterable: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::For(ForStmt {
        item: ident(item),
        iterable,
        body: block(body),
        span: sp(),
    })
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::Return(ReturnStmt {
        value: Some(value),
        span: sp(),
    })
}

pub fn ret_none() -> Stmt {
    Stmt::Return(ReturnStmt {
        value: None,
        span: sp(),
    })
}

pub fn pass() -> Stmt {
    Stmt::Pass { span: sp() }
}

// ── Definitions ─────────────────────────────────────────────────────────────

pub fn param(name: &str, kind: TypeKind) -> Param {
    Param {
        name: ident(name),
        type_ann: ty(kind),
        span: sp(),
    }
}

/// `self: ClassName`
pub fn self_param(class: &str) -> Param {
    param("self", class_ty(class))
}

pub fn function(name: &str, params: Vec<Param>, ret: Option<TypeKind>, body: Vec<Stmt>) -> FunctionDef {
    FunctionDef {
        name: ident(name),
        params,
        ret: ret.map(ty),
        body: block(body),
        span: sp(),
    }
}

pub fn field_decl(name: &str, kind: TypeKind, default: Expr) -> FieldDecl {
    FieldDecl {
        name: ident(name),
        type_ann: ty(kind),
        default,
        span: sp(),
    }
}

pub fn class(name: &str, fields: Vec<FieldDecl>, methods: Vec<FunctionDef>) -> ClassDef {
    ClassDef {
        name: ident(name),
        fields,
        methods,
        span: sp(),
    }
}

pub fn module(items: Vec<Item>) -> Module {
    Module { items, span: sp() }
}
