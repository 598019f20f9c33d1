// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tree-walking evaluator.
//!
//! An [`Interpreter`] owns the globals a script defines. The base bindings
//! (stdlib and host bridge) are shared read-only across every instance, so
//! [`Interpreter::reset`] only has to drop what scripts created.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::ast::{Expr, FnDef, Pattern, Program};
use crate::env::Scope;
use crate::error::ScriptError;
use crate::stdlib::is_withheld;
use crate::value::{Globals, Key, Lambda, MAX_NESTING, Table, Value};

/// Nested script calls allowed before [`ScriptError::StackOverflow`].
pub const DEFAULT_MAX_DEPTH: usize = 96;

/// Evaluation steps between deadline and cancellation checks.
const CHECK_INTERVAL: u64 = 64;

/// Limits for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    pub deadline: Option<Instant>,
    pub cancel: Option<CancellationToken>,
}

impl Budget {
    pub fn new(deadline: Option<Instant>, cancel: Option<CancellationToken>) -> Self {
        Self { deadline, cancel }
    }

    pub fn check(&self) -> Result<(), ScriptError> {
        if let Some(cancel) = &self.cancel
            && cancel.is_cancelled()
        {
            return Err(ScriptError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(ScriptError::DeadlineExceeded);
        }
        Ok(())
    }
}

pub struct Interpreter {
    base: Arc<Globals>,
    globals: HashMap<String, Value>,
    budget: Budget,
    label: String,
    steps: u64,
    depth: usize,
    max_depth: usize,
}

impl Interpreter {
    pub fn new(base: Arc<Globals>) -> Self {
        Self {
            base,
            globals: HashMap::new(),
            budget: Budget::default(),
            label: String::new(),
            steps: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Free-form tag the host attaches to the current invocation.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Return the instance to a pristine state. Base bindings are untouched.
    pub fn reset(&mut self) {
        self.globals.clear();
        self.budget = Budget::default();
        self.label.clear();
        self.steps = 0;
        self.depth = 0;
    }

    /// Global lookup: script definitions first, then base bindings.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name).or_else(|| self.base.get(name))
    }

    /// True when `name` resolves to a global a script may use.
    pub fn is_bound(&self, name: &str) -> bool {
        self.globals.contains_key(name) || (!is_withheld(name) && self.base.contains_key(name))
    }

    /// Run every top-level form and return the last value.
    pub fn load(&mut self, program: &Program) -> Result<Value, ScriptError> {
        self.budget.check()?;
        let scope = Scope::new();
        let mut last = Value::Nil;
        for form in &program.forms {
            last = self.eval(form, &scope)?;
        }
        Ok(last)
    }

    /// Apply a callable value to `args`.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, ScriptError> {
        match callee {
            Value::Native(native) => {
                native.arity.check(&native.name, args.len())?;
                within_nesting((native.func)(self, args)?)
            }
            Value::Function(lambda) => {
                if self.depth >= self.max_depth {
                    return Err(ScriptError::StackOverflow(self.max_depth));
                }
                let mut frame = bind_params(&lambda.def, args)?;
                if let Some(name) = &lambda.def.name {
                    frame.insert(0, (name.clone(), callee.clone()));
                }
                let scope = lambda.closure.extend(frame);
                self.depth += 1;
                let result = self.eval_body(&lambda.def.body, &scope);
                self.depth -= 1;
                result
            }
            other => Err(ScriptError::Runtime(format!(
                "attempt to call a {} value",
                other.type_name()
            ))),
        }
    }

    fn tick(&mut self) -> Result<(), ScriptError> {
        self.steps += 1;
        if self.steps % CHECK_INTERVAL == 0 {
            self.budget.check()?;
        }
        Ok(())
    }

    fn resolve(&self, name: &str, scope: &Scope) -> Result<Value, ScriptError> {
        if let Some(value) = scope.lookup(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        if is_withheld(name) {
            return Err(ScriptError::Blocked(name.to_string()));
        }
        self.base
            .get(name)
            .cloned()
            .ok_or_else(|| ScriptError::Undefined(name.to_string()))
    }

    fn eval_body(&mut self, body: &[Expr], scope: &Scope) -> Result<Value, ScriptError> {
        let mut last = Value::Nil;
        for expr in body {
            last = self.eval(expr, scope)?;
        }
        Ok(last)
    }

    fn eval(&mut self, expr: &Expr, scope: &Scope) -> Result<Value, ScriptError> {
        self.tick()?;
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Symbol(name) => self.resolve(name, scope),
            Expr::Def(name, value) => {
                let value = self.eval(value, scope)?;
                self.globals.insert(name.clone(), value.clone());
                Ok(value)
            }
            Expr::Fn(def) => within_nesting(Value::Function(Arc::new(Lambda::new(
                Arc::clone(def),
                scope.clone(),
            )))),
            Expr::If(cond, then, otherwise) => {
                if self.eval(cond, scope)?.is_truthy() {
                    self.eval(then, scope)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise, scope)
                } else {
                    Ok(Value::Nil)
                }
            }
            Expr::Let(bindings, body) => {
                let mut inner = scope.clone();
                for (pattern, value) in bindings {
                    let value = self.eval(value, &inner)?;
                    let mut frame = Vec::new();
                    bind_pattern(pattern, value, &mut frame);
                    inner = inner.extend(frame);
                }
                self.eval_body(body, &inner)
            }
            Expr::Do(body) => self.eval_body(body, scope),
            Expr::And(exprs) => {
                let mut last = Value::Bool(true);
                for e in exprs {
                    last = self.eval(e, scope)?;
                    if !last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            Expr::Or(exprs) => {
                let mut last = Value::Nil;
                for e in exprs {
                    last = self.eval(e, scope)?;
                    if last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            Expr::Cond(clauses) => {
                for (test, value) in clauses {
                    if self.eval(test, scope)?.is_truthy() {
                        return self.eval(value, scope);
                    }
                }
                Ok(Value::Nil)
            }
            Expr::Try {
                body,
                binding,
                handler,
            } => {
                match self.eval_body(body, scope) {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_abort() => Err(e),
                    Err(e) => {
                        let inner = scope.extend(vec![(binding.clone(), Value::Str(e.to_string()))]);
                        self.eval_body(handler, &inner)
                    }
                }
            }
            Expr::Call(callee, args) => {
                let callee = self.eval(callee, scope)?;
                let args = args
                    .iter()
                    .map(|a| self.eval(a, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(&callee, args)
            }
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|e| self.eval(e, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                within_nesting(Value::table(Table::from_values(values)))
            }
            Expr::Table(pairs) => {
                let mut table = Table::new();
                for (k, v) in pairs {
                    let key = Key::from_value(&self.eval(k, scope)?, "table literal")?;
                    let value = self.eval(v, scope)?;
                    table.insert(key, value);
                }
                within_nesting(Value::table(table))
            }
        }
    }
}

/// Every table and closure passes through here when built, so no value
/// deeper than [`MAX_NESTING`] outlives the expression that made it.
fn within_nesting(value: Value) -> Result<Value, ScriptError> {
    if value.nesting() > MAX_NESTING {
        return Err(ScriptError::NestingLimit(MAX_NESTING));
    }
    Ok(value)
}

fn bind_params(def: &FnDef, mut args: Vec<Value>) -> Result<Vec<(String, Value)>, ScriptError> {
    let required = def.params.len();
    let arity_ok = if def.rest.is_some() {
        args.len() >= required
    } else {
        args.len() == required
    };
    if !arity_ok {
        return Err(ScriptError::Arity {
            function: def.name.clone().unwrap_or_else(|| "fn".to_string()),
            expected: if def.rest.is_some() {
                format!("at least {required}")
            } else {
                required.to_string()
            },
            actual: args.len(),
        });
    }

    let extra = args.split_off(required);
    let mut frame = Vec::with_capacity(required + 1);
    for (pattern, value) in def.params.iter().zip(args) {
        bind_pattern(pattern, value, &mut frame);
    }
    if let Some(rest) = &def.rest {
        frame.push((rest.clone(), Value::table(Table::from_values(extra))));
    }
    Ok(frame)
}

/// Missing positions in a sequence pattern bind `nil`.
fn bind_pattern(pattern: &Pattern, value: Value, out: &mut Vec<(String, Value)>) {
    match pattern {
        Pattern::Bind(name) => out.push((name.clone(), value)),
        Pattern::Ignore => {}
        Pattern::Seq(patterns) => {
            for (i, p) in patterns.iter().enumerate() {
                let item = match &value {
                    Value::Table(t) => t.get(&Key::Int(i as i64 + 1)).cloned().unwrap_or_default(),
                    _ => Value::Nil,
                };
                bind_pattern(p, item, out);
            }
        }
    }
}
