// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier escalation decisions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use switchyard_config::{CascadeConfig, QualityConfig};

use crate::signals::{calculate_overall_quality, QualitySignal, QualitySignalDetector};
use crate::tier::Tier;

const DEFAULT_QUALITY_THRESHOLD: f64 = 0.70;
const DEFAULT_MAX_CASCADES: u32 = 2;

/// Outcome of evaluating one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeDecision {
    pub should_cascade: bool,
    pub current_tier: Tier,
    /// Set only when `should_cascade` is true.
    pub next_tier: Option<Tier>,
    pub quality_score: f64,
    pub signals: Vec<QualitySignal>,
    pub reason: String,
}

/// Point-in-time counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeMetrics {
    pub enabled: bool,
    pub total_evaluations: u64,
    pub cascades: u64,
    pub accepted: u64,
    pub cascade_rate: f64,
    pub success_rate: f64,
    /// Evaluations per tier, keyed by tier name.
    pub tier_distribution: std::collections::BTreeMap<String, u64>,
    pub quality_threshold: f64,
    pub max_cascades: u32,
}

/// Decides whether a response should be retried at a higher tier.
#[derive(Debug)]
pub struct CascadeManager {
    enabled: bool,
    quality_threshold: f64,
    max_cascades: u32,
    detector: QualitySignalDetector,
    total: AtomicU64,
    cascades: AtomicU64,
    accepted: AtomicU64,
    per_tier: [AtomicU64; 3],
}

impl CascadeManager {
    /// Non-positive thresholds and a zero attempt count fall back to the
    /// defaults (0.70 and 2).
    pub fn new(cascade: &CascadeConfig, quality: &QualityConfig) -> Self {
        let quality_threshold = if cascade.quality_threshold > 0.0 {
            cascade.quality_threshold
        } else {
            DEFAULT_QUALITY_THRESHOLD
        };
        let max_cascades = if cascade.max_cascades > 0 {
            cascade.max_cascades
        } else {
            DEFAULT_MAX_CASCADES
        };

        Self {
            enabled: cascade.enabled,
            quality_threshold,
            max_cascades,
            detector: QualitySignalDetector::new(quality),
            total: AtomicU64::new(0),
            cascades: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            per_tier: Default::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn quality_threshold(&self) -> f64 {
        self.quality_threshold
    }

    pub fn max_cascades(&self) -> u32 {
        self.max_cascades
    }

    pub fn detect_signals(&self, text: &str) -> Vec<QualitySignal> {
        self.detector.detect(text)
    }

    /// Score `text` and decide whether to escalate from `current_tier`.
    ///
    /// A disabled manager accepts everything without running the detector.
    pub fn evaluate_response(&self, text: &str, current_tier: Tier) -> CascadeDecision {
        if !self.enabled {
            return CascadeDecision {
                should_cascade: false,
                current_tier,
                next_tier: None,
                quality_score: 1.0,
                signals: Vec::new(),
                reason: "cascade disabled".to_string(),
            };
        }

        self.total.fetch_add(1, Ordering::Relaxed);
        self.per_tier[current_tier.index()].fetch_add(1, Ordering::Relaxed);

        let signals = self.detector.detect(text);
        let quality_score = calculate_overall_quality(&signals);

        let (should_cascade, next_tier, reason) = if quality_score >= self.quality_threshold {
            self.accepted.fetch_add(1, Ordering::Relaxed);
            (false, None, "Response quality is acceptable".to_string())
        } else if let Some(next) = current_tier.next() {
            self.cascades.fetch_add(1, Ordering::Relaxed);
            let reason = signals
                .iter()
                .max_by(|a, b| a.severity.total_cmp(&b.severity))
                .map_or_else(
                    || "Quality score below threshold".to_string(),
                    |s| s.description.clone(),
                );
            (true, Some(next), reason)
        } else {
            (
                false,
                None,
                "Already at highest tier, accepting response".to_string(),
            )
        };

        debug!(
            tier = %current_tier,
            quality_score,
            signals = signals.len(),
            should_cascade,
            "evaluated response quality"
        );

        CascadeDecision {
            should_cascade,
            current_tier,
            next_tier,
            quality_score,
            signals,
            reason,
        }
    }

    pub fn metrics(&self) -> CascadeMetrics {
        let total = self.total.load(Ordering::Relaxed);
        let cascades = self.cascades.load(Ordering::Relaxed);
        let accepted = self.accepted.load(Ordering::Relaxed);
        let rate = |n: u64| if total > 0 { n as f64 / total as f64 } else { 0.0 };

        CascadeMetrics {
            enabled: self.enabled,
            total_evaluations: total,
            cascades,
            accepted,
            cascade_rate: rate(cascades),
            success_rate: rate(accepted),
            tier_distribution: Tier::ALL
                .iter()
                .map(|t| (t.to_string(), self.per_tier[t.index()].load(Ordering::Relaxed)))
                .collect(),
            quality_threshold: self.quality_threshold,
            max_cascades: self.max_cascades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFUSAL: &str = "I cannot help with that request.";
    const GOOD: &str = "The capital of France is Paris. It has been the capital for centuries \
                        and is home to many landmarks.";

    fn manager() -> CascadeManager {
        CascadeManager::new(&CascadeConfig::default(), &QualityConfig::default())
    }

    #[test]
    fn refusal_from_fast_cascades_to_standard() {
        let decision = manager().evaluate_response(REFUSAL, Tier::Fast);
        assert!(decision.should_cascade);
        assert_eq!(decision.next_tier, Some(Tier::Standard));
        assert_eq!(decision.reason, "Model refused to answer the request");
    }

    #[test]
    fn terminal_tier_never_cascades() {
        let decision = manager().evaluate_response(REFUSAL, Tier::Reasoning);
        assert!(!decision.should_cascade);
        assert_eq!(decision.next_tier, None);
        assert!(decision.quality_score < 0.7);
    }

    #[test]
    fn good_response_is_accepted() {
        let decision = manager().evaluate_response(GOOD, Tier::Fast);
        assert!(!decision.should_cascade);
        assert_eq!(decision.quality_score, 1.0);
    }

    #[test]
    fn non_positive_settings_fall_back() {
        let config = CascadeConfig {
            enabled: true,
            quality_threshold: -1.0,
            max_cascades: 0,
        };
        let m = CascadeManager::new(&config, &QualityConfig::default());
        assert_eq!(m.quality_threshold(), 0.70);
        assert_eq!(m.max_cascades(), 2);
    }

    #[test]
    fn disabled_manager_is_a_no_op() {
        let config = CascadeConfig {
            enabled: false,
            ..CascadeConfig::default()
        };
        let m = CascadeManager::new(&config, &QualityConfig::default());
        assert!(!m.is_enabled());
        let decision = m.evaluate_response(REFUSAL, Tier::Fast);
        assert!(!decision.should_cascade);
        assert!(decision.signals.is_empty());
        assert_eq!(m.metrics().total_evaluations, 0);
    }

    #[test]
    fn metrics_track_outcomes() {
        let m = manager();
        m.evaluate_response(REFUSAL, Tier::Fast);
        m.evaluate_response(GOOD, Tier::Standard);
        m.evaluate_response(REFUSAL, Tier::Reasoning);
        let metrics = m.metrics();
        assert_eq!(metrics.total_evaluations, 3);
        assert_eq!(metrics.cascades, 1);
        assert_eq!(metrics.accepted, 1);
        assert_eq!(metrics.tier_distribution["fast"], 1);
        assert_eq!(metrics.tier_distribution["reasoning"], 1);
    }
}
