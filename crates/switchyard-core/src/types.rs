// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Records exchanged between the routing core and its collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Model metadata as reported by the discovery registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredModel {
    /// Provider-scoped model identifier, e.g. `llama3.2:3b`.
    pub id: String,
    /// Human-readable name; may be empty.
    #[serde(default)]
    pub display_name: String,
    /// Provider name, e.g. `ollama` or `openai`.
    pub provider: String,
}

impl DiscoveredModel {
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            provider: provider.into(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

/// One routing outcome reported by a policy script for offline analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackRecord {
    pub query: String,
    pub intent: String,
    pub selected_model: String,
    pub routing_tier: String,
    pub confidence: f64,
    pub matched_skill: Option<String>,
    pub cascade_occurred: bool,
    pub response_quality: Option<f64>,
    pub latency_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: Map<String, Value>,
    pub recorded_at: DateTime<Utc>,
}

impl Default for FeedbackRecord {
    fn default() -> Self {
        Self {
            query: String::new(),
            intent: String::new(),
            selected_model: String::new(),
            routing_tier: String::new(),
            confidence: 0.0,
            matched_skill: None,
            cascade_occurred: false,
            response_quality: None,
            latency_ms: 0,
            success: true,
            error_message: None,
            metadata: Map::new(),
            recorded_at: Utc::now(),
        }
    }
}

/// A cached routing decision returned by a [`RoutingCache`](crate::RoutingCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored decision payload, opaque to the cache.
    pub decision: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Similarity of the lookup query to the stored query (1.0 for exact hits).
    #[serde(default = "default_similarity")]
    pub similarity: f64,
}

fn default_similarity() -> f64 {
    1.0
}

/// Result of semantic intent matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub intent: String,
    pub confidence: f64,
}

/// A reusable system prompt tied to the capability slot it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Matrix slot the skill should be routed to, e.g. `coding`.
    #[serde(default)]
    pub required_capability: String,
    #[serde(default)]
    pub system_prompt: String,
}

/// Result of matching a query against registered skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: Skill,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_record_fills_missing_fields() {
        let record: FeedbackRecord =
            serde_json::from_value(serde_json::json!({"query": "hi", "intent": "chat"})).unwrap();
        assert_eq!(record.query, "hi");
        assert_eq!(record.intent, "chat");
        assert!(record.success);
        assert!(record.metadata.is_empty());
    }

    #[test]
    fn cache_entry_defaults_to_exact_similarity() {
        let entry: CacheEntry =
            serde_json::from_value(serde_json::json!({"decision": {"model": "m"}})).unwrap();
        assert_eq!(entry.similarity, 1.0);
    }

    #[test]
    fn skill_defaults_optional_text() {
        let skill: Skill =
            serde_json::from_value(serde_json::json!({"id": "sql", "name": "SQL helper"})).unwrap();
        assert_eq!(skill.id, "sql");
        assert!(skill.required_capability.is_empty());
        assert!(skill.system_prompt.is_empty());
    }
}
