// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexical scopes as persistent linked frames.

use std::sync::Arc;

use crate::value::Value;

/// A chain of immutable binding frames. Cloning is a pointer copy, which is
/// what lets closures capture the scope they were created in.
#[derive(Clone, Default)]
pub struct Scope(Option<Arc<Frame>>);

struct Frame {
    bindings: Vec<(String, Value)>,
    parent: Scope,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Innermost binding of `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut current = self.0.as_deref();
        while let Some(frame) = current {
            if let Some((_, value)) = frame.bindings.iter().rev().find(|(n, _)| n == name) {
                return Some(value);
            }
            current = frame.parent.0.as_deref();
        }
        None
    }

    /// Deepest nesting among every visible binding.
    pub fn nesting(&self) -> usize {
        let mut deepest = 0;
        let mut current = self.0.as_deref();
        while let Some(frame) = current {
            for (_, value) in &frame.bindings {
                deepest = deepest.max(value.nesting());
            }
            current = frame.parent.0.as_deref();
        }
        deepest
    }

    /// New scope with `bindings` layered over `self`.
    pub fn extend(&self, bindings: Vec<(String, Value)>) -> Scope {
        if bindings.is_empty() {
            return self.clone();
        }
        Scope(Some(Arc::new(Frame {
            bindings,
            parent: self.clone(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_frames_shadow_outer() {
        let outer = Scope::new().extend(vec![("x".into(), Value::Number(1.0))]);
        let inner = outer.extend(vec![("x".into(), Value::Number(2.0))]);
        assert_eq!(inner.lookup("x"), Some(&Value::Number(2.0)));
        assert_eq!(outer.lookup("x"), Some(&Value::Number(1.0)));
        assert!(inner.lookup("y").is_none());
    }
}
