// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sandboxed extension host for Switchyard routing policies.
//!
//! Extensions live in one directory each: an `extension.toml` manifest and
//! a `policy.syp` policy chunk. The [`ExtensionHost`] compiles them once,
//! then runs their `on_request` and `on_response` hooks in pooled sandbox
//! interpreters with the `router/` bridge installed.

pub mod bridge;
pub mod cache;
pub mod host;
pub mod manifest;
pub mod pool;
pub mod registry;

pub use bridge::Bridge;
pub use cache::MemoryRoutingCache;
pub use host::{ExtensionHost, ExtensionHostBuilder, HookPoint};
pub use manifest::{load_manifest, parse_manifest, ExtensionManifest, MANIFEST_FILE, POLICY_FILE};
pub use pool::{InterpreterPool, PooledInterpreter};
pub use registry::{ExtensionRegistry, LoadReport, LoadedExtension};
