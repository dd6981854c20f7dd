//! Interpreter — runtime representation of a loaded module.
//!
//! Drives the `Loading → Running → {Completed | Faulted}` state machine,
//! one top-level statement per [`Interpreter::step`].

use crate::config::EvalConfig;
use crate::error::Fault;
use crate::evaluator::{Evaluator, Flow};
use crate::value::Value;
use serde::Serialize;
use tracing::debug;
use typy_types::ast::{Item, Module, Stmt};

/// Lifecycle of a module run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecState {
    /// Registering classes and functions.
    Loading,
    /// Executing top-level statements.
    Running,
    /// Every statement ran.
    Completed,
    /// A fault halted the module.
    Faulted,
}

impl ExecState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Faulted)
    }
}

/// The result of a finished run, as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Completed { output: Vec<String> },
    Faulted { fault: Fault, output: Vec<String> },
}

impl Outcome {
    /// Printed lines, including those printed before a fault.
    pub fn output(&self) -> &[String] {
        match self {
            Self::Completed { output } | Self::Faulted { output, .. } => output,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Completed { .. } => None,
            Self::Faulted { fault, .. } => Some(fault),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// A module loaded into an evaluator.
pub struct Interpreter {
    eval: Evaluator,
    /// Top-level statements in source order.
    statements: Vec<Stmt>,
    /// Index of the next statement to run.
    next: usize,
    state: ExecState,
    fault: Option<Fault>,
}

impl Interpreter {
    /// Load a module with the default configuration.
    pub fn load(module: &Module) -> Self {
        Self::load_with_config(module, EvalConfig::default())
    }

    /// Register every function, then every class (evaluating field
    /// defaults), in source order. A fault while evaluating a default
    /// leaves the interpreter `Faulted`.
    pub fn load_with_config(module: &Module, config: EvalConfig) -> Self {
        let mut interp = Self {
            eval: Evaluator::new(config),
            statements: module.statements().cloned().collect(),
            next: 0,
            state: ExecState::Loading,
            fault: None,
        };

        for func in module.functions() {
            interp.eval.define_function(func);
        }
        for item in &module.items {
            let Item::Class(class) = item else {
                continue;
            };
            if let Err(e) = interp.eval.define_class(class) {
                interp.halt(e);
                return interp;
            }
        }

        debug!(statements = interp.statements.len(), "module loaded");
        interp.state = ExecState::Running;
        interp
    }

    // ══════════════════════════════════════════════════════════════════════
    // Execution
    // ══════════════════════════════════════════════════════════════════════

    /// Run the next top-level statement. Does nothing once terminal.
    pub fn step(&mut self) -> ExecState {
        if self.state != ExecState::Running {
            return self.state;
        }
        let Some(stmt) = self.statements.get(self.next) else {
            self.finish();
            return self.state;
        };

        match self.eval.exec_stmt(stmt) {
            Ok(Flow::Normal) => {
                self.next += 1;
                self.eval.collect_garbage_if_due();
                if self.next == self.statements.len() {
                    self.finish();
                }
            }
            // `return` at module level ends the run.
            Ok(Flow::Return(_)) => self.finish(),
            Err(e) => self.halt(e),
        }
        self.state
    }

    /// Step until terminal and report the outcome.
    pub fn run(&mut self) -> Outcome {
        while !self.state.is_terminal() {
            self.step();
        }
        match &self.fault {
            Some(fault) => Outcome::Faulted {
                fault: fault.clone(),
                output: self.eval.output.clone(),
            },
            None => Outcome::Completed {
                output: self.eval.output.clone(),
            },
        }
    }

    fn finish(&mut self) {
        self.state = ExecState::Completed;
        debug!(
            steps = self.eval.steps,
            lines = self.eval.output.len(),
            "module completed"
        );
    }

    fn halt(&mut self, error: crate::error::EvalError) {
        let fault = Fault::new(error, self.eval.current_span);
        debug!(kind = %fault.kind, span = %fault.span, "module faulted");
        self.fault = Some(fault);
        self.state = ExecState::Faulted;
    }

    // ══════════════════════════════════════════════════════════════════════
    // Inspection
    // ══════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> ExecState {
        self.state
    }

    /// Lines printed so far.
    pub fn output(&self) -> &[String] {
        &self.eval.output
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// Current value of a module-scope binding.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.eval.env.global_bindings().get(name)
    }

    /// Instances currently alive in the arena.
    pub fn live_objects(&self) -> usize {
        self.eval.heap.live_objects()
    }

    /// Render a value the way `print` would.
    pub fn display(&self, value: &Value) -> Option<String> {
        self.eval.value_to_display_string(value).ok()
    }
}

/// Execute a module with the default configuration.
pub fn execute(module: &Module) -> Outcome {
    execute_with_config(module, &EvalConfig::default())
}

/// Execute a module under explicit resource limits.
pub fn execute_with_config(module: &Module, config: &EvalConfig) -> Outcome {
    Interpreter::load_with_config(module, config.clone()).run()
}
