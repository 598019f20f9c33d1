// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The safe standard library.
//!
//! Nothing here touches the filesystem, the process or the environment.
//! Names listed in [`WITHHELD`] (and the whole `io/` namespace) resolve to
//! [`ScriptError::Blocked`] so a policy gets a clear error instead of a
//! silent undefined-symbol failure.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::Utc;

use crate::convert::{from_json, to_json};
use crate::error::ScriptError;
use crate::value::{define_native, Arity, Globals, Key, Table, Value};

/// Primitives that exist in general-purpose scripting runtimes but are
/// never installed here.
pub const WITHHELD: &[&str] = &[
    "os/execute",
    "os/exit",
    "os/remove",
    "os/rename",
    "os/getenv",
    "os/tmpname",
    "load",
    "loadstring",
    "loadfile",
    "dofile",
    "require",
    "slurp",
    "spit",
    "eval",
];

pub fn is_withheld(name: &str) -> bool {
    name.starts_with("io/") || WITHHELD.contains(&name)
}

/// Build the base bindings every sandboxed interpreter starts with.
pub fn sandbox_globals() -> Globals {
    let mut g = Globals::new();
    install_core(&mut g);
    install_arithmetic(&mut g);
    install_strings(&mut g);
    install_tables(&mut g);
    install_math(&mut g);
    install_json(&mut g);
    install_os(&mut g);
    g
}

fn install_core(g: &mut Globals) {
    define_native(g, "type", Arity::Fixed(1), |_, args| {
        Ok(Value::str(args[0].type_name()))
    });
    define_native(g, "tostring", Arity::Fixed(1), |_, args| {
        Ok(Value::Str(args[0].to_string()))
    });
    define_native(g, "tonumber", Arity::Fixed(1), |_, args| {
        Ok(match &args[0] {
            Value::Number(n) => Value::Number(*n),
            Value::Str(s) => s.trim().parse::<f64>().map_or(Value::Nil, Value::Number),
            _ => Value::Nil,
        })
    });
    define_native(g, "str", Arity::AtLeast(0), |_, args| {
        let mut out = String::new();
        for arg in &args {
            if !arg.is_nil() {
                out.push_str(&arg.to_string());
            }
        }
        Ok(Value::Str(out))
    });
    define_native(g, "not", Arity::Fixed(1), |_, args| {
        Ok(Value::Bool(!args[0].is_truthy()))
    });
    define_native(g, "nil?", Arity::Fixed(1), |_, args| {
        Ok(Value::Bool(args[0].is_nil()))
    });
    for (name, type_name) in [
        ("number?", "number"),
        ("string?", "string"),
        ("table?", "table"),
        ("fn?", "function"),
    ] {
        define_native(g, name, Arity::Fixed(1), move |_, args| {
            Ok(Value::Bool(args[0].type_name() == type_name))
        });
    }
    define_native(g, "error", Arity::Fixed(1), |_, args| {
        Err(ScriptError::Raised(args[0].to_string()))
    });
    define_native(g, "bound?", Arity::Fixed(1), |interp, args| {
        let name = args[0].as_str("bound?")?;
        Ok(Value::Bool(interp.is_bound(name)))
    });
}

fn numbers(function: &str, args: &[Value]) -> Result<Vec<f64>, ScriptError> {
    args.iter().map(|a| a.as_number(function)).collect()
}

fn install_arithmetic(g: &mut Globals) {
    define_native(g, "+", Arity::AtLeast(0), |_, args| {
        Ok(Value::Number(numbers("+", &args)?.into_iter().sum()))
    });
    define_native(g, "*", Arity::AtLeast(0), |_, args| {
        Ok(Value::Number(numbers("*", &args)?.into_iter().product()))
    });
    define_native(g, "-", Arity::AtLeast(1), |_, args| {
        let nums = numbers("-", &args)?;
        Ok(Value::Number(match nums.as_slice() {
            [only] => -only,
            [first, rest @ ..] => rest.iter().fold(*first, |acc, n| acc - n),
            [] => 0.0,
        }))
    });
    define_native(g, "/", Arity::AtLeast(2), |_, args| {
        let nums = numbers("/", &args)?;
        let mut acc = nums[0];
        for n in &nums[1..] {
            if *n == 0.0 {
                return Err(ScriptError::Runtime("division by zero".into()));
            }
            acc /= n;
        }
        Ok(Value::Number(acc))
    });
    define_native(g, "mod", Arity::Fixed(2), |_, args| {
        let (a, b) = (args[0].as_number("mod")?, args[1].as_number("mod")?);
        if b == 0.0 {
            return Err(ScriptError::Runtime("division by zero".into()));
        }
        Ok(Value::Number(a.rem_euclid(b)))
    });
    define_native(g, "inc", Arity::Fixed(1), |_, args| {
        Ok(Value::Number(args[0].as_number("inc")? + 1.0))
    });
    define_native(g, "dec", Arity::Fixed(1), |_, args| {
        Ok(Value::Number(args[0].as_number("dec")? - 1.0))
    });

    define_native(g, "=", Arity::AtLeast(1), |_, args| {
        Ok(Value::Bool(args.windows(2).all(|w| w[0] == w[1])))
    });
    define_native(g, "not=", Arity::AtLeast(1), |_, args| {
        Ok(Value::Bool(!args.windows(2).all(|w| w[0] == w[1])))
    });
    for (name, accept) in [
        ("<", Ordering::is_lt as fn(Ordering) -> bool),
        (">", Ordering::is_gt),
        ("<=", Ordering::is_le),
        (">=", Ordering::is_ge),
    ] {
        define_native(g, name, Arity::AtLeast(1), move |_, args| {
            for pair in args.windows(2) {
                if !accept(compare(name, &pair[0], &pair[1])?) {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        });
    }
}

fn compare(function: &str, a: &Value, b: &Value) -> Result<Ordering, ScriptError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .partial_cmp(y)
            .ok_or_else(|| ScriptError::Runtime(format!("{function}: cannot compare NaN"))),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        _ => Err(ScriptError::Runtime(format!(
            "{function}: cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn install_strings(g: &mut Globals) {
    define_native(g, "string/lower", Arity::Fixed(1), |_, args| {
        Ok(Value::Str(args[0].as_str("string/lower")?.to_lowercase()))
    });
    define_native(g, "string/upper", Arity::Fixed(1), |_, args| {
        Ok(Value::Str(args[0].as_str("string/upper")?.to_uppercase()))
    });
    define_native(g, "string/trim", Arity::Fixed(1), |_, args| {
        Ok(Value::str(args[0].as_str("string/trim")?.trim()))
    });
    define_native(g, "string/len", Arity::Fixed(1), |_, args| {
        Ok(Value::Number(args[0].as_str("string/len")?.chars().count() as f64))
    });
    define_native(g, "string/contains?", Arity::Fixed(2), |_, args| {
        let f = "string/contains?";
        Ok(Value::Bool(args[0].as_str(f)?.contains(args[1].as_str(f)?)))
    });
    define_native(g, "string/starts-with?", Arity::Fixed(2), |_, args| {
        let f = "string/starts-with?";
        Ok(Value::Bool(args[0].as_str(f)?.starts_with(args[1].as_str(f)?)))
    });
    define_native(g, "string/ends-with?", Arity::Fixed(2), |_, args| {
        let f = "string/ends-with?";
        Ok(Value::Bool(args[0].as_str(f)?.ends_with(args[1].as_str(f)?)))
    });
    // Character offsets, zero-based, end exclusive.
    define_native(g, "string/sub", Arity::Range(2, 3), |_, args| {
        let f = "string/sub";
        let s = args[0].as_str(f)?;
        let len = s.chars().count();
        let start = clamp_index(args[1].as_number(f)?, len);
        let end = match args.get(2) {
            Some(v) => clamp_index(v.as_number(f)?, len),
            None => len,
        };
        if start >= end {
            return Ok(Value::str(""));
        }
        Ok(Value::Str(s.chars().skip(start).take(end - start).collect()))
    });
    define_native(g, "string/split", Arity::Fixed(2), |_, args| {
        let f = "string/split";
        let (s, sep) = (args[0].as_str(f)?, args[1].as_str(f)?);
        if sep.is_empty() {
            return Err(ScriptError::Runtime(format!("{f}: empty separator")));
        }
        Ok(Value::table(Table::from_values(s.split(sep).map(Value::str))))
    });
    define_native(g, "string/join", Arity::Fixed(2), |_, args| {
        let sep = args[0].as_str("string/join")?;
        let parts: Vec<String> = args[1]
            .as_table("string/join")?
            .values()
            .map(|v| v.to_string())
            .collect();
        Ok(Value::Str(parts.join(sep)))
    });
    define_native(g, "string/replace", Arity::Fixed(3), |_, args| {
        let f = "string/replace";
        let (s, from, to) = (args[0].as_str(f)?, args[1].as_str(f)?, args[2].as_str(f)?);
        if from.is_empty() {
            return Ok(Value::str(s));
        }
        Ok(Value::Str(s.replace(from, to)))
    });
    define_native(g, "string/find", Arity::Fixed(2), |_, args| {
        let f = "string/find";
        let (s, needle) = (args[0].as_str(f)?, args[1].as_str(f)?);
        Ok(s.find(needle)
            .map_or(Value::Nil, |byte| Value::Number(s[..byte].chars().count() as f64)))
    });
}

fn clamp_index(n: f64, len: usize) -> usize {
    if n <= 0.0 { 0 } else { (n as usize).min(len) }
}

fn install_tables(g: &mut Globals) {
    define_native(g, "get", Arity::Range(2, 3), |_, args| {
        let found = lookup(&args[0], &args[1]);
        Ok(found.or_else(|| args.get(2).cloned()).unwrap_or_default())
    });
    define_native(g, "get-in", Arity::Range(2, 3), |_, args| {
        let path = args[1].as_table("get-in")?;
        let mut current = args[0].clone();
        for key in path.values() {
            match lookup(&current, key) {
                Some(next) => current = next,
                None => return Ok(args.get(2).cloned().unwrap_or_default()),
            }
        }
        Ok(current)
    });
    define_native(g, "assoc", Arity::AtLeast(3), |_, args| {
        if args.len() % 2 == 0 {
            return Err(ScriptError::Runtime("assoc: expected key/value pairs".into()));
        }
        let mut table = args[0].as_table("assoc")?;
        let target = Arc::make_mut(&mut table);
        for pair in args[1..].chunks(2) {
            target.insert(Key::from_value(&pair[0], "assoc")?, pair[1].clone());
        }
        Ok(Value::Table(table))
    });
    define_native(g, "dissoc", Arity::AtLeast(1), |_, args| {
        let mut table = args[0].as_table("dissoc")?;
        let target = Arc::make_mut(&mut table);
        for key in &args[1..] {
            target.remove(&Key::from_value(key, "dissoc")?);
        }
        Ok(Value::Table(table))
    });
    define_native(g, "conj", Arity::AtLeast(1), |_, args| {
        let mut table = args[0].as_table("conj")?;
        let target = Arc::make_mut(&mut table);
        for value in &args[1..] {
            let next = target.border() as i64 + 1;
            target.insert(Key::Int(next), value.clone());
        }
        Ok(Value::Table(table))
    });
    define_native(g, "count", Arity::Fixed(1), |_, args| {
        Ok(Value::Number(match &args[0] {
            Value::Nil => 0.0,
            Value::Str(s) => s.chars().count() as f64,
            other => other.as_table("count")?.len() as f64,
        }))
    });
    define_native(g, "empty?", Arity::Fixed(1), |_, args| {
        Ok(Value::Bool(match &args[0] {
            Value::Nil => true,
            Value::Str(s) => s.is_empty(),
            other => other.as_table("empty?")?.is_empty(),
        }))
    });
    define_native(g, "contains?", Arity::Fixed(2), |_, args| {
        let table = args[0].as_table("contains?")?;
        Ok(Value::Bool(
            Key::from_value(&args[1], "contains?").is_ok_and(|k| table.contains_key(&k)),
        ))
    });
    define_native(g, "keys", Arity::Fixed(1), |_, args| {
        let table = args[0].as_table("keys")?;
        Ok(Value::table(Table::from_values(table.iter().map(|(k, _)| k.to_value()))))
    });
    define_native(g, "vals", Arity::Fixed(1), |_, args| {
        let table = args[0].as_table("vals")?;
        Ok(Value::table(Table::from_values(table.values().cloned())))
    });
    define_native(g, "first", Arity::Fixed(1), |_, args| {
        Ok(lookup(&args[0], &Value::Number(1.0)).unwrap_or_default())
    });
    define_native(g, "map", Arity::Fixed(2), |interp, args| {
        let items = args[1].as_table("map")?;
        let mut out = Vec::with_capacity(items.len());
        for item in items.values() {
            out.push(interp.call(&args[0], vec![item.clone()])?);
        }
        Ok(Value::table(Table::from_values(out)))
    });
    define_native(g, "filter", Arity::Fixed(2), |interp, args| {
        let items = args[1].as_table("filter")?;
        let mut out = Vec::new();
        for item in items.values() {
            if interp.call(&args[0], vec![item.clone()])?.is_truthy() {
                out.push(item.clone());
            }
        }
        Ok(Value::table(Table::from_values(out)))
    });
    define_native(g, "reduce", Arity::Fixed(3), |interp, args| {
        let items = args[2].as_table("reduce")?;
        let mut acc = args[1].clone();
        for item in items.values() {
            acc = interp.call(&args[0], vec![acc, item.clone()])?;
        }
        Ok(acc)
    });
}

/// Missing keys, non-table containers and invalid keys all read as absent.
fn lookup(container: &Value, key: &Value) -> Option<Value> {
    let Value::Table(table) = container else {
        return None;
    };
    let key = Key::from_value(key, "get").ok()?;
    table.get(&key).cloned()
}

fn install_math(g: &mut Globals) {
    let unary: [(&str, fn(f64) -> f64); 5] = [
        ("math/floor", f64::floor),
        ("math/ceil", f64::ceil),
        ("math/abs", f64::abs),
        ("math/round", f64::round),
        ("math/sqrt", f64::sqrt),
    ];
    for (name, op) in unary {
        define_native(g, name, Arity::Fixed(1), move |_, args| {
            Ok(Value::Number(op(args[0].as_number(name)?)))
        });
    }
    define_native(g, "math/min", Arity::AtLeast(1), |_, args| {
        Ok(Value::Number(numbers("math/min", &args)?.into_iter().fold(f64::INFINITY, f64::min)))
    });
    define_native(g, "math/max", Arity::AtLeast(1), |_, args| {
        Ok(Value::Number(
            numbers("math/max", &args)?.into_iter().fold(f64::NEG_INFINITY, f64::max),
        ))
    });
}

fn install_json(g: &mut Globals) {
    define_native(g, "json/encode", Arity::Fixed(1), |_, args| {
        Ok(Value::Str(to_json(&args[0]).to_string()))
    });
    define_native(g, "json/decode", Arity::Fixed(1), |_, args| {
        let text = args[0].as_str("json/decode")?;
        serde_json::from_str::<serde_json::Value>(text)
            .map(|v| from_json(&v))
            .map_err(|e| ScriptError::Runtime(format!("json/decode: {e}")))
    });
}

fn install_os(g: &mut Globals) {
    define_native(g, "os/time", Arity::Fixed(0), |_, _| {
        Ok(Value::Number(Utc::now().timestamp() as f64))
    });
    define_native(g, "os/date", Arity::Range(0, 1), |_, args| {
        let format = match args.first() {
            Some(v) => v.as_str("os/date")?,
            None => "%Y-%m-%dT%H:%M:%SZ",
        };
        // Invalid specifiers would panic at render time.
        let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(ScriptError::Runtime(format!(
                "os/date: invalid format `{format}`"
            )));
        }
        Ok(Value::Str(
            Utc::now().format_with_items(items.into_iter()).to_string(),
        ))
    });
}
