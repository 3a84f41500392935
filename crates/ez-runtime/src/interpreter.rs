//! AST interpreter (tree-walking)
//!
//! Direct AST evaluation with environment-based variable storage.
//! Supports:
//! - Expression evaluation (literals, binary/unary ops, calls, indexing)
//! - Statement execution (declarations, assignments, control flow)
//! - Function calls with fresh call environments
//! - Block scoping with shadowing
//!
//! When constructed with a [`DebugSession`], the interpreter invokes the
//! debugger hook contract: `before_eval` ahead of every steppable statement
//! and `on_enter_call`/`on_leave_call` around every user-function call,
//! including the synthetic `<main>` root frame.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{AssignTarget, BinaryOp, Block, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::debugger::engine::DebugSession;
use crate::debugger::protocol::DebugEvent;
use crate::debugger::source_map::SourceMap;
use crate::environment::{self, EnvRef, Environment};
use crate::span::Span;
use crate::value::{FunctionRef, RuntimeError, Value};

/// Control flow signal for handling break, continue, and return
#[derive(Debug, Clone, PartialEq)]
enum ControlFlow {
    None,
    Break,
    Continue,
    Return(Value),
}

/// User-defined function
#[derive(Debug, Clone)]
struct UserFunction {
    name: String,
    params: Vec<String>,
    body: Block,
}

/// Interpreter state
pub struct Interpreter {
    /// Global (root) environment
    globals: EnvRef,
    /// Current innermost scope
    env: EnvRef,
    /// User-defined functions
    functions: HashMap<String, UserFunction>,
    /// Current control flow state
    control_flow: ControlFlow,
    /// Span → location mapping for the file under execution
    source_map: SourceMap,
    /// Debug session; hooks fire only when present
    debug: Option<Arc<DebugSession>>,
    /// One environment handle per active call frame (bottom first); the
    /// last entry tracks the current frame's innermost scope
    frame_envs: Vec<EnvRef>,
}

impl Interpreter {
    /// Create a new interpreter without a debugger attached
    pub fn new(source_map: SourceMap) -> Self {
        let globals = Environment::root();
        Self {
            env: globals.clone(),
            globals,
            functions: HashMap::new(),
            control_flow: ControlFlow::None,
            source_map,
            debug: None,
            frame_envs: Vec::new(),
        }
    }

    /// Create an interpreter whose execution is observed by `session`
    pub fn with_debugger(source_map: SourceMap, session: Arc<DebugSession>) -> Self {
        let mut interpreter = Self::new(source_map);
        interpreter.debug = Some(session);
        interpreter
    }

    /// Evaluate a program and return the last statement's value
    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        // Function declarations are hoisted so calls may precede them in
        // source order.
        for stmt in &program.statements {
            if let StmtKind::Function { name, params, body } = &stmt.kind {
                self.register_function(name, params, body);
            }
        }

        if let Some(session) = self.debug.clone() {
            let entry = program
                .statements
                .first()
                .map(|stmt| stmt.span)
                .unwrap_or_else(Span::dummy);
            session.on_enter_call("<main>", self.source_map.location(entry));
            self.frame_envs.push(self.globals.clone());

            let result = self.exec_statements(&program.statements);
            self.frame_envs.pop();
            let leave = session.on_leave_call();
            let value = result?;
            leave?;
            Ok(value)
        } else {
            self.exec_statements(&program.statements)
        }
    }

    fn register_function(&mut self, name: &str, params: &[String], body: &Block) {
        self.functions.insert(
            name.to_string(),
            UserFunction {
                name: name.to_string(),
                params: params.to_vec(),
                body: body.clone(),
            },
        );
        self.globals.borrow_mut().define(
            name,
            Value::Function(FunctionRef {
                name: name.to_string(),
                arity: params.len(),
            }),
        );
    }

    // ── Statements ───────────────────────────────────────────────────────────

    fn exec_statements(&mut self, statements: &[Stmt]) -> Result<Value, RuntimeError> {
        let mut last_value = Value::Null;
        for stmt in statements {
            last_value = self.exec_stmt(stmt)?;
            if self.control_flow != ControlFlow::None {
                break;
            }
        }
        Ok(last_value)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Value, RuntimeError> {
        if stmt.is_steppable() {
            self.debug_before(stmt.span)?;
        }

        match &stmt.kind {
            StmtKind::Let { name, init } => {
                let value = self.eval_expr(init)?;
                self.env.borrow_mut().define(name.clone(), value);
                Ok(Value::Null)
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval_expr(value)?;
                match target {
                    AssignTarget::Name(name) => environment::assign(&self.env, name, value)?,
                    AssignTarget::Index { target, index } => {
                        let array = self.eval_expr(target)?;
                        let index = self.eval_expr(index)?;
                        set_array_element(array, index, value)?;
                    }
                }
                Ok(Value::Null)
            }
            StmtKind::Expr(expr) => self.eval_expr(expr),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                self.control_flow = ControlFlow::Return(value.clone());
                Ok(value)
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.exec_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(Value::Null)
                }
            }
            StmtKind::While { cond, body } => {
                while self.eval_expr(cond)?.is_truthy() {
                    self.exec_block(body)?;
                    match self.control_flow {
                        ControlFlow::Break => {
                            self.control_flow = ControlFlow::None;
                            break;
                        }
                        ControlFlow::Continue => {
                            self.control_flow = ControlFlow::None;
                        }
                        ControlFlow::Return(_) => break,
                        ControlFlow::None => {}
                    }
                }
                Ok(Value::Null)
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                // The loop variable lives in its own scope.
                let saved = self.env.clone();
                self.env = Environment::child_of(&saved);
                let result = self.exec_for(init, cond, step, body);
                self.env = saved;
                result
            }
            StmtKind::Loop { body } => {
                loop {
                    self.exec_block(body)?;
                    match self.control_flow {
                        ControlFlow::Break => {
                            self.control_flow = ControlFlow::None;
                            break;
                        }
                        ControlFlow::Continue => {
                            self.control_flow = ControlFlow::None;
                        }
                        ControlFlow::Return(_) => break,
                        ControlFlow::None => {}
                    }
                }
                Ok(Value::Null)
            }
            StmtKind::Break => {
                self.control_flow = ControlFlow::Break;
                Ok(Value::Null)
            }
            StmtKind::Continue => {
                self.control_flow = ControlFlow::Continue;
                Ok(Value::Null)
            }
            StmtKind::Function { name, params, body } => {
                // Top-level declarations are hoisted in `run`; re-registering
                // is harmless and covers declarations inside blocks.
                self.register_function(name, params, body);
                Ok(Value::Null)
            }
        }
    }

    fn exec_for(
        &mut self,
        init: &Stmt,
        cond: &Expr,
        step: &Stmt,
        body: &Block,
    ) -> Result<Value, RuntimeError> {
        self.exec_stmt(init)?;
        while self.eval_expr(cond)?.is_truthy() {
            self.exec_block(body)?;
            match self.control_flow {
                ControlFlow::Break => {
                    self.control_flow = ControlFlow::None;
                    break;
                }
                ControlFlow::Continue => {
                    self.control_flow = ControlFlow::None;
                }
                ControlFlow::Return(_) => break,
                ControlFlow::None => {}
            }
            self.exec_stmt(step)?;
        }
        Ok(Value::Null)
    }

    fn exec_block(&mut self, block: &Block) -> Result<Value, RuntimeError> {
        let saved = self.env.clone();
        self.env = Environment::child_of(&saved);
        let result = self.exec_statements(&block.statements);
        self.env = saved;
        result
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::String(s) => Ok(Value::string(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Ident(name) => environment::lookup(&self.env, name),
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right),
            ExprKind::Unary { op, expr } => self.eval_unary(*op, expr),
            ExprKind::Call { callee, args } => self.eval_call(callee, args, expr.span),
            ExprKind::Index { target, index } => {
                let target = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                eval_index(target, index)
            }
            ExprKind::Array(elements) => {
                let values: Result<Vec<Value>, _> =
                    elements.iter().map(|e| self.eval_expr(e)).collect();
                Ok(Value::array(values?))
            }
            ExprKind::Group(inner) => self.eval_expr(inner),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, RuntimeError> {
        // Short-circuit evaluation for && and ||
        if op == BinaryOp::And {
            let left = self.eval_expr(left)?;
            if !left.is_truthy() {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(self.eval_expr(right)?.is_truthy()));
        }
        if op == BinaryOp::Or {
            let left = self.eval_expr(left)?;
            if left.is_truthy() {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(self.eval_expr(right)?.is_truthy()));
        }

        let left = self.eval_expr(left)?;
        let right = self.eval_expr(right)?;

        match op {
            BinaryOp::Add => match (&left, &right) {
                (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{a}{b}"))),
                _ => numeric_op(left, right, |a, b| a.wrapping_add(b), |a, b| a + b),
            },
            BinaryOp::Sub => numeric_op(left, right, |a, b| a.wrapping_sub(b), |a, b| a - b),
            BinaryOp::Mul => numeric_op(left, right, |a, b| a.wrapping_mul(b), |a, b| a * b),
            BinaryOp::Div => match (&left, &right) {
                (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
                _ => numeric_op(left, right, |a, b| a.wrapping_div(b), |a, b| a / b),
            },
            BinaryOp::Mod => match (&left, &right) {
                (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
                _ => numeric_op(left, right, |a, b| a.wrapping_rem(b), |a, b| a % b),
            },
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::Ne => Ok(Value::Bool(left != right)),
            BinaryOp::Lt => numeric_comparison(left, right, |a, b| a < b),
            BinaryOp::Le => numeric_comparison(left, right, |a, b| a <= b),
            BinaryOp::Gt => numeric_comparison(left, right, |a, b| a > b),
            BinaryOp::Ge => numeric_comparison(left, right, |a, b| a >= b),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, expr: &Expr) -> Result<Value, RuntimeError> {
        let operand = self.eval_expr(expr)?;
        match op {
            UnaryOp::Negate => match operand {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(RuntimeError::TypeError(format!(
                    "cannot negate {}",
                    other.type_name()
                ))),
            },
            UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        }
    }

    fn eval_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        call_span: Span,
    ) -> Result<Value, RuntimeError> {
        let values: Result<Vec<Value>, _> = args.iter().map(|a| self.eval_expr(a)).collect();
        let values = values?;

        if is_builtin(callee) {
            return self.call_builtin(callee, &values);
        }

        let Some(func) = self.functions.get(callee).cloned() else {
            return Err(RuntimeError::UnknownFunction(callee.to_string()));
        };
        if values.len() != func.params.len() {
            return Err(RuntimeError::ArityMismatch {
                name: func.name.clone(),
                expected: func.params.len(),
                got: values.len(),
            });
        }

        // Call environments enclose the globals, not the caller's scope.
        let call_env = Environment::child_of(&self.globals);
        for (param, value) in func.params.iter().zip(values) {
            call_env.borrow_mut().define(param.clone(), value);
        }

        if let Some(session) = self.debug.clone() {
            session.on_enter_call(&func.name, self.source_map.location(call_span));
            self.frame_envs.push(call_env.clone());

            let saved = std::mem::replace(&mut self.env, call_env);
            let result = self.exec_function_body(&func.body);
            self.env = saved;

            self.frame_envs.pop();
            let leave = session.on_leave_call();
            let value = result?;
            leave?;
            Ok(value)
        } else {
            let saved = std::mem::replace(&mut self.env, call_env);
            let result = self.exec_function_body(&func.body);
            self.env = saved;
            result
        }
    }

    fn exec_function_body(&mut self, body: &Block) -> Result<Value, RuntimeError> {
        let mut result = Value::Null;
        for stmt in &body.statements {
            result = self.exec_stmt(stmt)?;
            match &self.control_flow {
                ControlFlow::Return(value) => {
                    result = value.clone();
                    self.control_flow = ControlFlow::None;
                    break;
                }
                ControlFlow::None => {}
                // A stray break/continue must not leak into the caller.
                _ => {
                    self.control_flow = ControlFlow::None;
                    break;
                }
            }
        }
        Ok(result)
    }

    // ── Builtins ─────────────────────────────────────────────────────────────

    fn call_builtin(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        match name {
            "print" | "println" => {
                let text = args
                    .iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.emit_output(text);
                Ok(Value::Null)
            }
            "len" => match args {
                [Value::String(s)] => Ok(Value::Int(s.chars().count() as i64)),
                [Value::Array(arr)] => Ok(Value::Int(arr.borrow().len() as i64)),
                _ => Err(RuntimeError::TypeError(
                    "len expects one string or array argument".to_string(),
                )),
            },
            "str" => match args {
                [value] => Ok(Value::string(value.to_display_string())),
                _ => Err(RuntimeError::TypeError(
                    "str expects one argument".to_string(),
                )),
            },
            _ => Err(RuntimeError::UnknownFunction(name.to_string())),
        }
    }

    fn emit_output(&mut self, text: String) {
        match &self.debug {
            Some(session) => session.emit(DebugEvent::Output { text }),
            None => println!("{text}"),
        }
    }

    // ── Debug hook plumbing ──────────────────────────────────────────────────

    /// Consult the debugger before a steppable statement. May suspend this
    /// thread on the session's rendezvous.
    fn debug_before(&mut self, span: Span) -> Result<(), RuntimeError> {
        let Some(session) = self.debug.clone() else {
            return Ok(());
        };
        // The top frame's environment tracks the innermost scope so paused
        // inspection sees block-local bindings.
        if let Some(slot) = self.frame_envs.last_mut() {
            *slot = self.env.clone();
        }
        session.before_eval(self.source_map.location(span), &self.frame_envs)
    }
}

/// Returns `true` for names bound to builtin functions
fn is_builtin(name: &str) -> bool {
    matches!(name, "print" | "println" | "len" | "str")
}

/// Apply a numeric binary operation with int/float promotion
fn numeric_op(
    left: Value,
    right: Value,
    int_op: impl FnOnce(i64, i64) -> i64,
    float_op: impl FnOnce(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(a, b))),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(a as f64, b))),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(a, b as f64))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(a, b))),
        (left, right) => Err(RuntimeError::TypeError(format!(
            "invalid operands: {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Apply a numeric comparison with int/float promotion
fn numeric_comparison(
    left: Value,
    right: Value,
    op: impl FnOnce(f64, f64) -> bool,
) -> Result<Value, RuntimeError> {
    let (a, b) = match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => (*a as f64, *b as f64),
        (Value::Int(a), Value::Float(b)) => (*a as f64, *b),
        (Value::Float(a), Value::Int(b)) => (*a, *b as f64),
        (Value::Float(a), Value::Float(b)) => (*a, *b),
        _ => {
            return Err(RuntimeError::TypeError(format!(
                "cannot compare {} and {}",
                left.type_name(),
                right.type_name()
            )))
        }
    };
    Ok(Value::Bool(op(a, b)))
}

fn array_index(index: Value) -> Result<usize, RuntimeError> {
    match index {
        Value::Int(n) if n >= 0 => Ok(n as usize),
        Value::Int(_) => Err(RuntimeError::InvalidIndex),
        _ => Err(RuntimeError::InvalidIndex),
    }
}

fn eval_index(target: Value, index: Value) -> Result<Value, RuntimeError> {
    let i = array_index(index)?;
    match target {
        Value::Array(arr) => arr.borrow().get(i).cloned().ok_or(RuntimeError::OutOfBounds),
        Value::String(s) => s
            .chars()
            .nth(i)
            .map(|c| Value::string(c.to_string()))
            .ok_or(RuntimeError::OutOfBounds),
        other => Err(RuntimeError::TypeError(format!(
            "cannot index {}",
            other.type_name()
        ))),
    }
}

fn set_array_element(target: Value, index: Value, value: Value) -> Result<(), RuntimeError> {
    let i = array_index(index)?;
    match target {
        Value::Array(arr) => {
            let mut elements = arr.borrow_mut();
            if i < elements.len() {
                elements[i] = value;
                Ok(())
            } else {
                Err(RuntimeError::OutOfBounds)
            }
        }
        other => Err(RuntimeError::TypeError(format!(
            "cannot index {}",
            other.type_name()
        ))),
    }
}
