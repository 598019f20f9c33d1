// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing decision cache collaborator.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::SwitchyardError;
use crate::types::CacheEntry;

/// Cache of prior routing decisions keyed by query text.
#[async_trait]
pub trait RoutingCache: Send + Sync {
    /// Look up a decision; a miss is `Ok(None)`, not an error.
    async fn lookup(&self, query: &str) -> Result<Option<CacheEntry>, SwitchyardError>;

    /// Store a decision for `query`.
    async fn store(&self, query: &str, entry: CacheEntry) -> Result<(), SwitchyardError>;

    /// Implementation-defined counters (hits, misses, size).
    fn metrics(&self) -> Map<String, Value> {
        Map::new()
    }
}
