// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory routing cache used when no cache collaborator is injected.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Map, Value};

use switchyard_core::{CacheEntry, RoutingCache, SwitchyardError};

/// Exact-match cache keyed by normalized query text.
#[derive(Debug)]
pub struct MemoryRoutingCache {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryRoutingCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

#[async_trait]
impl RoutingCache for MemoryRoutingCache {
    async fn lookup(&self, query: &str) -> Result<Option<CacheEntry>, SwitchyardError> {
        let found = self.entries.get(&normalize(query)).map(|e| e.value().clone());
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    async fn store(&self, query: &str, entry: CacheEntry) -> Result<(), SwitchyardError> {
        let key = normalize(query);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            // Evict an arbitrary entry to stay within bounds.
            let victim = self.entries.iter().next().map(|e| e.key().clone());
            if let Some(victim) = victim {
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    fn metrics(&self) -> Map<String, Value> {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
        let Value::Object(map) = json!({
            "hits": hits,
            "misses": misses,
            "entries": self.entries.len(),
            "hit_rate": hit_rate,
        }) else {
            return Map::new();
        };
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(model: &str) -> CacheEntry {
        CacheEntry {
            decision: json!({"model": model}),
            metadata: Map::new(),
            similarity: 1.0,
        }
    }

    #[tokio::test]
    async fn lookup_normalizes_queries() {
        let cache = MemoryRoutingCache::new(10);
        cache.store("  Write Code ", entry("coder")).await.unwrap();
        let hit = cache.lookup("write code").await.unwrap().unwrap();
        assert_eq!(hit.decision["model"], "coder");
        assert!(cache.lookup("other").await.unwrap().is_none());

        let metrics = cache.metrics();
        assert_eq!(metrics["hits"], 1);
        assert_eq!(metrics["misses"], 1);
        assert_eq!(metrics["hit_rate"], 0.5);
    }

    #[tokio::test]
    async fn capacity_is_bounded() {
        let cache = MemoryRoutingCache::new(2);
        for q in ["a", "b", "c"] {
            cache.store(q, entry(q)).await.unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.lookup("c").await.unwrap().is_some());
    }
}
