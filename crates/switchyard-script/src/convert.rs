// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between JSON documents and script values.
//!
//! Rules for tables going out:
//! - keys exactly `1..=n` (n >= 1) become an array;
//! - an empty table becomes `{}`;
//! - anything else becomes an object with integer keys stringified.
//!
//! Integral numbers are emitted as JSON integers, non-finite numbers and
//! functions as `null`. Both directions stop at [`MAX_NESTING`] levels.

use serde_json::{Map, Number};

use crate::value::{Key, MAX_NESTING, Table, Value};

/// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Containers nested deeper than [`MAX_NESTING`] read as `nil`.
pub fn from_json(json: &serde_json::Value) -> Value {
    from_json_at(json, 0)
}

fn from_json_at(json: &serde_json::Value, level: usize) -> Value {
    match json {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) if level >= MAX_NESTING => {
            Value::Nil
        }
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or(Value::Nil, Value::Number),
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => {
            Value::table(Table::from_values(
                items.iter().map(|item| from_json_at(item, level + 1)),
            ))
        }
        serde_json::Value::Object(map) => {
            let mut table = Table::new();
            for (k, v) in map {
                table.insert(Key::Str(k.clone()), from_json_at(v, level + 1));
            }
            Value::table(table)
        }
    }
}

/// Convert a script value to JSON.
///
/// The round trip through [`from_json`] is lossy for empty arrays: a table
/// has no way to tell `[]` from `{}`, so an untouched `"tools": []` field
/// comes back as `"tools": {}`. A hook that returns `nil` leaves the
/// document untouched and avoids the conversion.
pub fn to_json(value: &Value) -> serde_json::Value {
    to_json_at(value, 0)
}

fn to_json_at(value: &Value, level: usize) -> serde_json::Value {
    match value {
        Value::Nil | Value::Function(_) | Value::Native(_) => serde_json::Value::Null,
        Value::Table(_) if level >= MAX_NESTING => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Table(table) => {
            if table.sequence_len().is_some() {
                let items = table.values().map(|v| to_json_at(v, level + 1)).collect();
                return serde_json::Value::Array(items);
            }
            let mut map = Map::new();
            for (k, v) in table.iter() {
                let key = match k {
                    Key::Int(i) => i.to_string(),
                    Key::Str(s) => s.clone(),
                };
                map.insert(key, to_json_at(v, level + 1));
            }
            serde_json::Value::Object(map)
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}
