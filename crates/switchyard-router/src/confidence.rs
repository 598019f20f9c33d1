// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of classifier output into intent and confidence, with running
//! distribution metrics.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

const LOW_CONFIDENCE: f64 = 0.60;
const HIGH_CONFIDENCE: f64 = 0.90;

#[derive(Debug, Error)]
pub enum ConfidenceError {
    #[error("failed to parse classification JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Classifier verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub intent: String,
    #[serde(default)]
    pub complexity: String,
    /// Clamped to [0, 1].
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    failures: u64,
    sum: f64,
    low: u64,
    high: u64,
}

/// Parses classifier JSON and tracks how confident the classifier has been.
#[derive(Debug, Default)]
pub struct ConfidenceScorer {
    counters: Mutex<Counters>,
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{"intent": .., "complexity": .., "confidence": ..}`.
    ///
    /// A surrounding markdown code fence is tolerated since small models
    /// often wrap JSON in one.
    pub fn parse(&self, raw: &str) -> Result<ConfidenceResult, ConfidenceError> {
        let parsed = serde_json::from_str::<ConfidenceResult>(strip_fence(raw));
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let mut result = match parsed {
            Ok(result) => result,
            Err(err) => {
                counters.failures += 1;
                return Err(err.into());
            }
        };
        result.confidence = if result.confidence.is_nan() {
            0.0
        } else {
            result.confidence.clamp(0.0, 1.0)
        };

        counters.total += 1;
        counters.sum += result.confidence;
        if result.confidence < LOW_CONFIDENCE {
            counters.low += 1;
        } else if result.confidence > HIGH_CONFIDENCE {
            counters.high += 1;
        }
        Ok(result)
    }

    pub fn metrics(&self) -> Value {
        let c = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let average = if c.total > 0 {
            c.sum / c.total as f64
        } else {
            0.0
        };
        json!({
            "total_classifications": c.total,
            "parse_failures": c.failures,
            "average_confidence": average,
            "low_confidence_count": c.low,
            "high_confidence_count": c.high,
        })
    }
}

fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_classifier_payload() {
        let scorer = ConfidenceScorer::new();
        let result = scorer
            .parse(r#"{"intent":"coding","complexity":"complex","confidence":0.95}"#)
            .unwrap();
        assert_eq!(result.intent, "coding");
        assert_eq!(result.complexity, "complex");
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn tolerates_code_fence() {
        let scorer = ConfidenceScorer::new();
        let result = scorer
            .parse("```json\n{\"intent\":\"chat\",\"confidence\":0.5}\n```")
            .unwrap();
        assert_eq!(result.intent, "chat");
        assert_eq!(result.complexity, "");
    }

    #[test]
    fn clamps_out_of_range_confidence() {
        let scorer = ConfidenceScorer::new();
        let result = scorer.parse(r#"{"intent":"x","confidence":7}"#).unwrap();
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn tracks_distribution() {
        let scorer = ConfidenceScorer::new();
        scorer.parse(r#"{"intent":"a","confidence":0.95}"#).unwrap();
        scorer.parse(r#"{"intent":"b","confidence":0.40}"#).unwrap();
        scorer.parse(r#"{"intent":"c","confidence":0.75}"#).unwrap();
        assert!(scorer.parse("not json").is_err());

        let m = scorer.metrics();
        assert_eq!(m["total_classifications"], 3);
        assert_eq!(m["parse_failures"], 1);
        assert_eq!(m["low_confidence_count"], 1);
        assert_eq!(m["high_confidence_count"], 1);
    }
}
