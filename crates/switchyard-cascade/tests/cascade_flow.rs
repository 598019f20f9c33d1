// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end escalation chains and quality score properties.

use proptest::prelude::*;

use switchyard_cascade::{
    calculate_overall_quality, has_critical_signals, CascadeManager, CascadeTracker,
    QualitySignal, SignalKind, Tier,
};
use switchyard_config::{CascadeConfig, QualityConfig};

const GOOD: &str = "Binary search halves the search interval on every step, so it finishes in \
                    logarithmic time on sorted input.";

/// Drive one logical request through the manager the way a gateway would.
fn run_chain(manager: &CascadeManager, responses: &[&str]) -> CascadeTracker {
    let mut tracker = CascadeTracker::new(Tier::Fast, manager.max_cascades() as usize + 1);
    for response in responses {
        let decision = manager.evaluate_response(response, tracker.current_tier());
        tracker.record_attempt(decision);
        if !tracker.can_continue() {
            break;
        }
    }
    tracker
}

#[test]
fn chain_escalates_until_quality_is_acceptable() {
    let manager = CascadeManager::new(&CascadeConfig::default(), &QualityConfig::default());
    let tracker = run_chain(
        &manager,
        &["I cannot do that.", "Output truncated due to max tokens reached.", GOOD],
    );
    let result = tracker.result(true);
    assert_eq!(result.original_tier, Tier::Fast);
    assert_eq!(result.final_tier, Tier::Reasoning);
    assert_eq!(result.cascade_count, 2);
    assert_eq!(tracker.attempts().len(), 3);
}

#[test]
fn chain_stops_at_first_good_response() {
    let manager = CascadeManager::new(&CascadeConfig::default(), &QualityConfig::default());
    let tracker = run_chain(&manager, &[GOOD, "I cannot do that."]);
    assert_eq!(tracker.attempts().len(), 1);
    assert_eq!(tracker.result(true).final_tier, Tier::Fast);
}

#[test]
fn lenient_threshold_accepts_mild_defects() {
    let config = CascadeConfig {
        quality_threshold: 0.3,
        ..CascadeConfig::default()
    };
    let manager = CascadeManager::new(&config, &QualityConfig::default());
    let repetitive = format!(
        "{s}. {s}. {s}. A different closing sentence here. Another one. Final.",
        s = "The same long sentence is written here again"
    );
    let decision = manager.evaluate_response(&repetitive, Tier::Fast);
    assert!((decision.quality_score - 0.4).abs() < 1e-9);
    assert!(!decision.should_cascade);
}

fn kind() -> impl Strategy<Value = SignalKind> {
    prop_oneof![
        Just(SignalKind::LowQuality),
        Just(SignalKind::Refusal),
        Just(SignalKind::AbruptEnding),
        Just(SignalKind::Truncated),
        Just(SignalKind::IncompleteCode),
        Just(SignalKind::Repetitive),
    ]
}

fn signals() -> impl Strategy<Value = Vec<QualitySignal>> {
    prop::collection::vec(
        (kind(), 0.0f64..=1.0).prop_map(|(kind, severity)| QualitySignal {
            kind,
            severity,
            description: String::new(),
            position: None,
        }),
        0..8,
    )
}

proptest! {
    #[test]
    fn overall_quality_is_clamped(signals in signals()) {
        let q = calculate_overall_quality(&signals);
        prop_assert!((0.0..=1.0).contains(&q));
    }

    #[test]
    fn critical_kinds_always_critical(signals in signals(), severity in 0.0f64..0.8) {
        let mut with_refusal = signals;
        with_refusal.push(QualitySignal {
            kind: SignalKind::Refusal,
            severity,
            description: String::new(),
            position: None,
        });
        prop_assert!(has_critical_signals(&with_refusal));
    }

    #[test]
    fn reasoning_tier_never_cascades(text in ".{0,200}") {
        let manager = CascadeManager::new(&CascadeConfig::default(), &QualityConfig::default());
        prop_assert!(!manager.evaluate_response(&text, Tier::Reasoning).should_cascade);
    }
}
