// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime values.
//!
//! Tables are immutable: every update returns a new table, sharing storage
//! until written (`Arc::make_mut`). Values therefore never form cycles and
//! are safe to move between threads.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::FnDef;
use crate::env::Scope;
use crate::error::ScriptError;
use crate::interpreter::Interpreter;

/// Deepest table or closure nesting a value may reach. Keeping every value
/// under this bound keeps recursive drop, comparison and conversion within
/// the stack of a blocking worker thread.
pub const MAX_NESTING: usize = 128;

/// Name to value bindings installed before any script runs.
pub type Globals = HashMap<String, Value>;

/// Host-implemented function body.
pub type NativeImpl =
    Arc<dyn Fn(&mut Interpreter, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Table(Arc<Table>),
    Function(Arc<Lambda>),
    Native(Arc<NativeFn>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn table(table: Table) -> Value {
        Value::Table(Arc::new(table))
    }

    pub fn as_number(&self, function: &str) -> Result<f64, ScriptError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(ScriptError::type_error(function, "number", other.type_name())),
        }
    }

    pub fn as_str(&self, function: &str) -> Result<&str, ScriptError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(ScriptError::type_error(function, "string", other.type_name())),
        }
    }

    /// `nil` reads as an empty table.
    pub fn as_table(&self, function: &str) -> Result<Arc<Table>, ScriptError> {
        match self {
            Value::Table(t) => Ok(Arc::clone(t)),
            Value::Nil => Ok(Arc::new(Table::new())),
            other => Err(ScriptError::type_error(function, "table", other.type_name())),
        }
    }

    /// Levels of tables and closures reachable from this value. Scalars and
    /// natives are 0.
    pub fn nesting(&self) -> usize {
        match self {
            Value::Table(t) => t.nesting(),
            Value::Function(l) => l.nesting,
            _ => 0,
        }
    }

    /// Field lookup on a table value; anything else yields `None`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Table(t) => t.get(&Key::Str(key.to_string())),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Table(t) => f.debug_map().entries(t.iter()).finish(),
            Value::Function(l) => write!(f, "#<fn {}>", l.def.name.as_deref().unwrap_or("anonymous")),
            Value::Native(n) => write!(f, "#<native {}>", n.name),
        }
    }
}

/// `tostring` rendering: strings are unquoted, tables render as JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Table(_) => write!(f, "{}", crate::convert::to_json(self)),
            other => write!(f, "{other:?}"),
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Table key: integers (from integral numbers) or strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    pub fn from_value(value: &Value, function: &str) -> Result<Key, ScriptError> {
        match value {
            Value::Str(s) => Ok(Key::Str(s.clone())),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Ok(Key::Int(*n as i64)),
            Value::Number(_) => Err(ScriptError::Runtime(format!(
                "{function}: table keys must be integers or strings"
            ))),
            other => Err(ScriptError::type_error(
                function,
                "integer or string key",
                other.type_name(),
            )),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(i) => Value::Number(*i as f64),
            Key::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

/// Ordered associative table. Integer keys sort before string keys.
///
/// `nil` is a storable value so that JSON nulls survive a round trip.
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: BTreeMap<Key, Value>,
    /// Upper bound on the nesting of any entry. Not lowered by `remove`.
    inner: usize,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence with keys `1..=n`.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let mut inner = 0;
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                inner = inner.max(v.nesting());
                (Key::Int(i as i64 + 1), v)
            })
            .collect();
        Self { entries, inner }
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: Key, value: Value) {
        self.inner = self.inner.max(value.nesting());
        self.entries.insert(key, value);
    }

    /// This table's own level plus the deepest entry.
    pub fn nesting(&self) -> usize {
        self.inner + 1
    }

    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// `Some(n)` when the keys are exactly `1..=n` with `n >= 1`.
    pub fn sequence_len(&self) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries
            .keys()
            .enumerate()
            .all(|(i, k)| *k == Key::Int(i as i64 + 1))
            .then_some(self.entries.len())
    }

    /// Largest `n` such that keys `1..=n` are all present.
    pub fn border(&self) -> usize {
        let mut n = 0;
        while self.entries.contains_key(&Key::Int(n as i64 + 1)) {
            n += 1;
        }
        n
    }
}

/// A script-defined function closed over its defining scope.
pub struct Lambda {
    pub def: Arc<FnDef>,
    pub closure: Scope,
    pub nesting: usize,
}

impl Lambda {
    pub fn new(def: Arc<FnDef>, closure: Scope) -> Self {
        let nesting = closure.nesting() + 1;
        Self {
            def,
            closure,
            nesting,
        }
    }
}

/// Argument count contract for native functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn check(self, function: &str, actual: usize) -> Result<(), ScriptError> {
        let ok = match self {
            Arity::Fixed(n) => actual == n,
            Arity::AtLeast(n) => actual >= n,
            Arity::Range(lo, hi) => (lo..=hi).contains(&actual),
        };
        if ok {
            return Ok(());
        }
        let expected = match self {
            Arity::Fixed(n) => n.to_string(),
            Arity::AtLeast(n) => format!("at least {n}"),
            Arity::Range(lo, hi) => format!("{lo} to {hi}"),
        };
        Err(ScriptError::Arity {
            function: function.to_string(),
            expected,
            actual,
        })
    }
}

/// A host function callable from scripts.
pub struct NativeFn {
    pub name: String,
    pub arity: Arity,
    pub func: NativeImpl,
}

impl NativeFn {
    /// Wrap a closure as a callable value.
    pub fn value(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&mut Interpreter, Vec<Value>) -> Result<Value, ScriptError>
            + Send
            + Sync
            + 'static,
    ) -> Value {
        Value::Native(Arc::new(NativeFn {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }))
    }
}

/// Register a native function under `name`.
pub fn define_native(
    globals: &mut Globals,
    name: &str,
    arity: Arity,
    func: impl Fn(&mut Interpreter, Vec<Value>) -> Result<Value, ScriptError> + Send + Sync + 'static,
) {
    globals.insert(name.to_string(), NativeFn::value(name, arity, func));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::str("").is_truthy());
    }

    #[test]
    fn integral_numbers_become_int_keys() {
        assert_eq!(Key::from_value(&Value::Number(2.0), "t").unwrap(), Key::Int(2));
        assert!(Key::from_value(&Value::Number(1.5), "t").is_err());
        assert!(Key::from_value(&Value::Nil, "t").is_err());
    }

    #[test]
    fn sequence_detection() {
        assert_eq!(Table::new().sequence_len(), None);

        let one = Table::from_values([Value::str("a")]);
        assert_eq!(one.sequence_len(), Some(1));

        let mut gap = Table::from_values([Value::Number(1.0)]);
        gap.insert(Key::Int(3), Value::Number(3.0));
        assert_eq!(gap.sequence_len(), None);
        assert_eq!(gap.border(), 1);

        let mut mixed = Table::from_values([Value::Number(1.0)]);
        mixed.insert(Key::from("name"), Value::str("x"));
        assert_eq!(mixed.sequence_len(), None);
    }

    #[test]
    fn nesting_tracks_the_deepest_entry() {
        assert_eq!(Value::Number(1.0).nesting(), 0);
        let leaf = Value::table(Table::from_values([Value::Number(1.0)]));
        assert_eq!(leaf.nesting(), 1);

        let mut outer = Table::new();
        outer.insert(Key::from("flat"), Value::str("x"));
        outer.insert(Key::from("leaf"), leaf.clone());
        assert_eq!(outer.nesting(), 2);

        let wrapped = Value::table(Table::from_values([Value::table(outer)]));
        assert_eq!(wrapped.nesting(), 3);
    }

    #[test]
    fn tables_compare_structurally() {
        let a = Value::table(Table::from_values([Value::Number(1.0)]));
        let b = Value::table(Table::from_values([Value::Number(1.0)]));
        assert_eq!(a, b);
    }
}
