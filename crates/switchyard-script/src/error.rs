// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for reading, compiling and evaluating policy scripts.

use thiserror::Error;

/// Every failure a script can produce. None of these escape as a panic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("{chunk}:{line}: parse error: {message}")]
    Parse {
        chunk: String,
        line: usize,
        message: String,
    },

    #[error("{chunk}:{line}: {message}")]
    Compile {
        chunk: String,
        line: usize,
        message: String,
    },

    #[error("undefined symbol `{0}`")]
    Undefined(String),

    /// A primitive withheld from the sandbox was referenced.
    #[error("`{0}` is blocked in the sandbox")]
    Blocked(String),

    #[error("{function}: expected {expected}, got {actual}")]
    Type {
        function: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{function}: expected {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{0}")]
    Runtime(String),

    /// Raised by the script itself via `error`.
    #[error("{0}")]
    Raised(String),

    #[error("call depth limit of {0} exceeded")]
    StackOverflow(usize),

    /// A table or closure would nest deeper than the allowed limit.
    #[error("value nesting limit of {0} exceeded")]
    NestingLimit(usize),

    #[error("execution deadline exceeded")]
    DeadlineExceeded,

    #[error("execution cancelled")]
    Cancelled,
}

impl ScriptError {
    /// Deadline and cancellation abort the whole invocation; `try` cannot
    /// intercept them.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Cancelled)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    pub(crate) fn type_error(function: &str, expected: &'static str, actual: &'static str) -> Self {
        Self::Type {
            function: function.to_string(),
            expected,
            actual,
        }
    }
}
