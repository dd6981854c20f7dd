//! Core expression and statement evaluator.

use crate::config::EvalConfig;
use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::heap::{ClassDescriptor, ClassId, FieldSlot, Heap, ObjectId};
use crate::stack::ensure_sufficient_stack;
use crate::value::{index_str, slice_str, Value};
use num_bigint::BigInt;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};
use typy_types::ast::*;
use typy_types::Span;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Fell through to the next statement.
    Normal,
    /// Executed `return`; the enclosing call yields this value.
    Return(Value),
}

/// The core evaluator: walks AST nodes against an environment and a heap.
pub struct Evaluator {
    /// Variable environment (module scope plus call scopes).
    pub env: Environment,
    /// Class registry and instance arena.
    pub heap: Heap,
    /// Module-level functions by name.
    functions: HashMap<String, Rc<FunctionDef>>,
    /// Steps consumed so far.
    pub steps: u64,
    config: EvalConfig,
    /// One entry per `print` call.
    pub output: Vec<String>,
    /// Span of the innermost statement being executed.
    pub current_span: Span,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            env: Environment::new(),
            heap: Heap::new(),
            functions: HashMap::new(),
            steps: 0,
            config,
            output: Vec::new(),
            current_span: Span::synthetic(),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Consume one step. Returns error if the budget is exhausted.
    fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        if self.steps > self.config.step_limit {
            Err(EvalError::StepLimitExceeded(self.config.step_limit))
        } else {
            Ok(())
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Definitions
    // ══════════════════════════════════════════════════════════════════════

    /// Register a module-level function. A later definition replaces an
    /// earlier one with the same name.
    pub fn define_function(&mut self, func: &FunctionDef) {
        debug!(function = %func.name.name, params = func.params.len(), "registered function");
        self.functions
            .insert(func.name.name.clone(), Rc::new(func.clone()));
    }

    /// Register a class, evaluating its field defaults once, in module scope.
    pub fn define_class(&mut self, class: &ClassDef) -> EvalResult<ClassId> {
        let mut fields = Vec::with_capacity(class.fields.len());
        for field in &class.fields {
            self.current_span = field.span;
            let default = self.eval_expr(&field.default)?;
            fields.push(FieldSlot {
                name: field.name.name.clone(),
                default,
            });
        }
        let id = self.heap.define_class(ClassDescriptor::new(
            class.name.name.clone(),
            fields,
            class.methods.clone(),
        ));
        debug!(
            class = %class.name.name,
            fields = class.fields.len(),
            methods = class.methods.len(),
            "registered class"
        );
        Ok(id)
    }

    /// Reclaim unreachable instances once enough have been allocated.
    ///
    /// Only sound when no call is active: evaluator temporaries are not roots.
    pub fn collect_garbage_if_due(&mut self) {
        if self.env.depth() > 0 || !self.heap.should_collect(self.config.gc_threshold) {
            return;
        }
        let freed = self.heap.collect_garbage(self.env.object_roots());
        debug!(freed, live = self.heap.live_objects(), "collected instances");
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        ensure_sufficient_stack(|| self.eval_expr_kind(expr))
    }

    fn eval_expr_kind(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.tick()?;
        match &expr.kind {
            ExprKind::IntLit(n) => Ok(Value::Int(n.clone())),
            ExprKind::StrLit(s) => Ok(Value::str(s)),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NoneLit => Ok(Value::None),

            ExprKind::Identifier(name) => self.env.get(name).cloned(),

            ExprKind::Call { name, args } => self.eval_call(&name.name, args),
            ExprKind::FieldAccess { object, field } => self.eval_field_access(object, &field.name),
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => self.eval_method_call(object, &method.name, args),

            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),

            ExprKind::Index { object, index } => self.eval_index(object, index),
            ExprKind::Slice {
                object,
                start,
                stop,
                step,
            } => self.eval_slice(object, start.as_deref(), stop.as_deref(), step.as_deref()),

            ExprKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }
        Ok(values)
    }

    // ── Calls ────────────────────────────────────────────────────────────

    /// `name(args)`: user function, then class constructor, then builtin.
    fn eval_call(&mut self, name: &str, args: &[Expr]) -> EvalResult<Value> {
        if let Some(func) = self.functions.get(name).cloned() {
            let values = self.eval_args(args)?;
            return self.invoke(&func, values);
        }
        if let Some(class) = self.heap.class_id(name) {
            let values = self.eval_args(args)?;
            return self.construct(class, values);
        }
        match name {
            "print" => {
                let values = self.eval_args(args)?;
                self.builtin_print(&values)
            }
            "len" => {
                let values = self.eval_args(args)?;
                builtin_len(&values)
            }
            _ => Err(EvalError::NameError(format!("name '{name}' is not defined"))),
        }
    }

    /// Run a function body in a fresh call scope linked to the module scope.
    #[tracing::instrument(level = "debug", skip_all, fields(function = %func.name.name))]
    fn invoke(&mut self, func: &FunctionDef, args: Vec<Value>) -> EvalResult<Value> {
        ensure_sufficient_stack(|| self.invoke_body(func, args))
    }

    fn invoke_body(&mut self, func: &FunctionDef, args: Vec<Value>) -> EvalResult<Value> {
        if args.len() != func.params.len() {
            return Err(EvalError::TypeMismatch(format!(
                "{}() takes {} arguments but {} were given",
                func.name.name,
                func.params.len(),
                args.len()
            )));
        }
        if self.env.depth() >= self.config.max_call_depth {
            return Err(EvalError::RecursionLimit(self.config.max_call_depth));
        }

        let caller_span = self.current_span;
        self.env.push_call_scope(Environment::MODULE);
        for (param, arg) in func.params.iter().zip(args) {
            self.env.define(&param.name.name, arg);
        }
        let result = self.exec_block(&func.body);
        self.env.pop_scope();

        // A fault keeps the span of the statement that raised it.
        let flow = result?;
        self.current_span = caller_span;
        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::None,
        })
    }

    /// `ClassName(args)`: allocate, then run `__init__` if the class has one.
    fn construct(&mut self, class: ClassId, args: Vec<Value>) -> EvalResult<Value> {
        let descriptor = Rc::clone(self.heap.class(class));
        let id = self.heap.instantiate(class);
        match descriptor.method("__init__").cloned() {
            Some(init) => {
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(Value::Object(id));
                all.extend(args);
                self.invoke(&init, all)?;
            }
            None if !args.is_empty() => {
                return Err(EvalError::TypeMismatch(format!(
                    "{}() takes no arguments",
                    descriptor.name
                )));
            }
            None => {}
        }
        Ok(Value::Object(id))
    }

    fn eval_field_access(&mut self, object: &Expr, field: &str) -> EvalResult<Value> {
        let target = self.eval_expr(object)?;
        let id = expect_object(&target, &format!("field '{field}'"))?;
        self.heap.get_field(id, field)
    }

    fn eval_method_call(&mut self, object: &Expr, method: &str, args: &[Expr]) -> EvalResult<Value> {
        let receiver = self.eval_expr(object)?;
        match receiver {
            Value::Object(id) => {
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(Value::Object(id));
                all.extend(self.eval_args(args)?);
                let func = self.heap.find_method(id, method)?;
                self.invoke(&func, all)
            }
            Value::Str(s) => {
                let values = self.eval_args(args)?;
                call_str_method(&s, method, &values)
            }
            Value::None => Err(EvalError::NoneDereference(format!(
                "cannot call method '{method}' on None"
            ))),
            other => Err(EvalError::NoSuchMethod(format!(
                "'{}' object has no method '{method}'",
                other.type_name()
            ))),
        }
    }

    // ── Builtins ─────────────────────────────────────────────────────────

    fn builtin_print(&mut self, args: &[Value]) -> EvalResult<Value> {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(self.value_to_display_string(arg)?);
        }
        let line = parts.join(" ");
        trace!(line = %line, "print");
        self.output.push(line);
        Ok(Value::None)
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> EvalResult<Value> {
        // Short-circuit for logical operators
        if op == BinOp::And {
            let lv = self.eval_expr(left)?.as_condition("'and'")?;
            return if !lv {
                Ok(Value::Bool(false))
            } else {
                Ok(Value::Bool(self.eval_expr(right)?.as_condition("'and'")?))
            };
        }
        if op == BinOp::Or {
            let lv = self.eval_expr(left)?.as_condition("'or'")?;
            return if lv {
                Ok(Value::Bool(true))
            } else {
                Ok(Value::Bool(self.eval_expr(right)?.as_condition("'or'")?))
            };
        }

        let lv = self.eval_expr(left)?;
        let rv = self.eval_expr(right)?;

        match op {
            BinOp::Add => lv.add(&rv),
            BinOp::Sub => lv.sub(&rv),
            BinOp::Mul => lv.mul(&rv),
            BinOp::FloorDiv => lv.floordiv(&rv),
            BinOp::Mod => lv.modulo(&rv),
            BinOp::Eq => Ok(Value::Bool(lv.py_eq(&rv))),
            BinOp::NotEq => Ok(Value::Bool(!lv.py_eq(&rv))),
            BinOp::Is => Ok(Value::Bool(lv.is_identical(&rv))),
            BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
                lv.compare(op, &rv).map(Value::Bool)
            }
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        let val = self.eval_expr(operand)?;
        match op {
            UnaryOp::Neg => val.neg(),
            UnaryOp::Not => val.not(),
        }
    }

    // ── Strings ──────────────────────────────────────────────────────────

    fn eval_index(&mut self, object: &Expr, index: &Expr) -> EvalResult<Value> {
        let target = self.eval_expr(object)?;
        let idx = self.eval_expr(index)?;
        match (&target, &idx) {
            (Value::Str(s), Value::Int(i)) => index_str(s, i),
            (Value::Str(_), other) => Err(EvalError::TypeMismatch(format!(
                "string indices must be int, not {}",
                other.type_name()
            ))),
            (other, _) => Err(EvalError::TypeMismatch(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    fn eval_slice(
        &mut self,
        object: &Expr,
        start: Option<&Expr>,
        stop: Option<&Expr>,
        step: Option<&Expr>,
    ) -> EvalResult<Value> {
        let target = self.eval_expr(object)?;
        let start = self.eval_slice_bound(start)?;
        let stop = self.eval_slice_bound(stop)?;
        let step = self.eval_slice_bound(step)?;
        match &target {
            Value::Str(s) => slice_str(s, start.as_ref(), stop.as_ref(), step.as_ref()),
            other => Err(EvalError::TypeMismatch(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    fn eval_slice_bound(&mut self, bound: Option<&Expr>) -> EvalResult<Option<BigInt>> {
        let Some(expr) = bound else {
            return Ok(None);
        };
        match self.eval_expr(expr)? {
            Value::Int(n) => Ok(Some(n)),
            other => Err(EvalError::TypeMismatch(format!(
                "slice indices must be int, not {}",
                other.type_name()
            ))),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Block & Statement execution
    // ══════════════════════════════════════════════════════════════════════

    /// Execute a block of statements, stopping at the first `return`.
    pub fn exec_block(&mut self, block: &Block) -> EvalResult<Flow> {
        for stmt in &block.stmts {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    /// Execute a single statement.
    pub fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        ensure_sufficient_stack(|| self.exec_stmt_kind(stmt))
    }

    fn exec_stmt_kind(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        self.tick()?;
        self.current_span = stmt.span();
        match stmt {
            Stmt::VarDecl(decl) => {
                let value = self.eval_expr(&decl.value)?;
                self.env.define(&decl.name.name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign(assign) => self.exec_assign(assign),
            Stmt::Expr(expr_stmt) => {
                self.eval_expr(&expr_stmt.expr)?;
                Ok(Flow::Normal)
            }
            Stmt::If(if_stmt) => self.exec_if(if_stmt),
            Stmt::While(while_stmt) => self.exec_while(while_stmt),
            Stmt::For(for_stmt) => self.exec_for(for_stmt),
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Pass { .. } => Ok(Flow::Normal),
        }
    }

    fn exec_assign(&mut self, assign: &AssignStmt) -> EvalResult<Flow> {
        let value = self.eval_expr(&assign.value)?;
        match &assign.target {
            AssignTarget::Name(name) => self.env.set(&name.name, value),
            AssignTarget::Field { object, field } => {
                let target = self.eval_expr(object)?;
                let id = expect_object(&target, &format!("field '{}'", field.name))?;
                self.heap.set_field(id, &field.name, value)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_if(&mut self, if_stmt: &IfStmt) -> EvalResult<Flow> {
        let cond = self.eval_expr(&if_stmt.condition)?;
        if cond.as_condition("if condition")? {
            self.exec_block(&if_stmt.then_block)
        } else {
            match &if_stmt.else_branch {
                Some(ElseBranch::Elif(elif)) => self.exec_if(elif),
                Some(ElseBranch::Block(block)) => self.exec_block(block),
                None => Ok(Flow::Normal),
            }
        }
    }

    fn exec_while(&mut self, while_stmt: &WhileStmt) -> EvalResult<Flow> {
        while self
            .eval_expr(&while_stmt.condition)?
            .as_condition("while condition")?
        {
            if let Flow::Return(value) = self.exec_block(&while_stmt.body)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    /// `for ch in s`: binds each character in the current scope.
    fn exec_for(&mut self, for_stmt: &ForStmt) -> EvalResult<Flow> {
        let iterable = self.eval_expr(&for_stmt.iterable)?;
        let chars: Vec<char> = match &iterable {
            Value::Str(s) => s.chars().collect(),
            other => {
                return Err(EvalError::TypeMismatch(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )));
            }
        };
        let mut buf = [0u8; 4];
        for ch in chars {
            self.env
                .set(&for_stmt.item.name, Value::str(ch.encode_utf8(&mut buf)));
            if let Flow::Return(value) = self.exec_block(&for_stmt.body)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Display
    // ══════════════════════════════════════════════════════════════════════

    /// Render a value the way `print` shows it.
    pub fn value_to_display_string(&self, val: &Value) -> EvalResult<String> {
        Ok(match val {
            Value::Int(n) => n.to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Str(s) => s.to_string(),
            Value::None => "None".to_string(),
            Value::Object(id) => format!("<{} object>", self.heap.class_of(*id)?.name),
        })
    }
}

fn expect_object(value: &Value, what: &str) -> EvalResult<ObjectId> {
    match value {
        Value::Object(id) => Ok(*id),
        Value::None => Err(EvalError::NoneDereference(format!(
            "cannot access {what} on None"
        ))),
        other => Err(EvalError::TypeMismatch(format!(
            "cannot access {what} on {}",
            other.type_name()
        ))),
    }
}

fn builtin_len(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::Str(s)] => Ok(Value::Int(BigInt::from(s.chars().count()))),
        [other] => Err(EvalError::TypeMismatch(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
        _ => Err(EvalError::TypeMismatch(format!(
            "len() takes exactly one argument ({} given)",
            args.len()
        ))),
    }
}

fn call_str_method(s: &str, method: &str, args: &[Value]) -> EvalResult<Value> {
    match method {
        "startswith" | "endswith" => {
            let [Value::Str(affix)] = args else {
                return Err(EvalError::TypeMismatch(format!(
                    "str.{method}() takes exactly one str argument"
                )));
            };
            let hit = if method == "startswith" {
                s.starts_with(&**affix)
            } else {
                s.ends_with(&**affix)
            };
            Ok(Value::Bool(hit))
        }
        _ => Err(EvalError::NoSuchMethod(format!(
            "'str' object has no method '{method}'"
        ))),
    }
}
