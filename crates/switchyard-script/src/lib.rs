// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Switchyard policy language.
//!
//! A small S-expression language for routing policies. Source is read into
//! data, compiled once into an [`Expr`] tree per [`Program`], and run by an
//! [`Interpreter`] against a shared set of base bindings. The base built by
//! [`sandbox_globals`] has no filesystem, process or environment access.
//!
//! ```text
//! (defn on-request [req]
//!   (if (string/contains? (get req "prompt") "```")
//!     (assoc req "model" "coder")
//!     nil))
//! {:on_request on-request}
//! ```

pub mod ast;
pub mod convert;
pub mod env;
pub mod error;
pub mod interpreter;
pub mod reader;
pub mod stdlib;
pub mod value;

pub use ast::{compile, Expr, Program};
pub use convert::{from_json, to_json};
pub use error::ScriptError;
pub use interpreter::{Budget, Interpreter, DEFAULT_MAX_DEPTH};
pub use stdlib::{is_withheld, sandbox_globals, WITHHELD};
pub use value::{define_native, Arity, Globals, Key, NativeFn, Table, Value, MAX_NESTING};
