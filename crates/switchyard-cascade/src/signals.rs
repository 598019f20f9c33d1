// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic detection of defects in generated responses.
//!
//! Checks run in a fixed order and each emits at most one signal.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use switchyard_config::QualityConfig;

/// Defect categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SignalKind {
    LowQuality,
    Refusal,
    AbruptEnding,
    Truncated,
    IncompleteCode,
    Repetitive,
}

/// A detected defect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySignal {
    pub kind: SignalKind,
    /// In [0, 1].
    pub severity: f64,
    pub description: String,
    /// Byte offset the signal refers to, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl QualitySignal {
    fn new(kind: SignalKind, severity: f64, description: &str) -> Self {
        Self {
            kind,
            severity,
            description: description.to_string(),
            position: None,
        }
    }
}

static REFUSAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^I (?:cannot|can't|am unable to|won't|will not)").unwrap(),
        Regex::new(r"(?i)^(?:Sorry|I'm sorry|I apologize),? (?:but )?I (?:cannot|can't)").unwrap(),
        Regex::new(r"(?i)^As an AI,? I (?:cannot|can't|am unable to)").unwrap(),
        Regex::new(r"(?i)^I'm not able to").unwrap(),
    ]
});

// Word boundaries keep "also" from matching "so" and "begin" from matching "in".
static ABRUPT_ENDING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?:\.\.\.|…)$").unwrap(),
        Regex::new(r"(?i)\b(?:and|but|or|so|then)\s*$").unwrap(),
        Regex::new(r"(?i)\b(?:the|a|an|this|that)\s*$").unwrap(),
        Regex::new(r"(?i)\b(?:to|for|with|from|in)\s*$").unwrap(),
        Regex::new(r"(?i)\b(?:is|are|was|were|be)\s*$").unwrap(),
        Regex::new(r"(?i)\b(?:I|we|you|they|it)\s*$").unwrap(),
        Regex::new(r"(?i)\b(?:can|will|would|should)\s*$").unwrap(),
    ]
});

static TRUNCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\[(?:truncated|cut off|continued)\]").unwrap(),
        Regex::new(r"(?i)(?:output|response) (?:truncated|limit)").unwrap(),
        Regex::new(r"(?i)(?:maximum|max) (?:length|tokens?) (?:reached|exceeded)").unwrap(),
    ]
});

static INCOMPLETE_CODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?m)^\s*(?:def|func|function|class|if|for|while|switch)\s+[^{]*$").unwrap(),
        Regex::new(r"(?m)\{\s*$").unwrap(),
        Regex::new(r"(?m)^\s*//\s*\.\.\.\s*$").unwrap(),
    ]
});

const CODE_FENCE: &str = "```";
const ABRUPT_TAIL_CHARS: usize = 100;
const MIN_REPEATED_SENTENCE_LEN: usize = 20;

/// Scans response text for quality defects.
#[derive(Debug, Clone)]
pub struct QualitySignalDetector {
    min_response_length: usize,
    repetition_threshold: usize,
}

impl Default for QualitySignalDetector {
    fn default() -> Self {
        Self::new(&QualityConfig::default())
    }
}

impl QualitySignalDetector {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            min_response_length: config.min_response_length,
            repetition_threshold: config.repetition_threshold.max(1),
        }
    }

    /// Run every check against the trimmed text, in order.
    pub fn detect(&self, text: &str) -> Vec<QualitySignal> {
        let text = text.trim();
        let checks = [
            self.check_length(text),
            check_refusal(text),
            check_abrupt_ending(text),
            check_truncation(text),
            check_incomplete_code(text),
            self.check_repetition(text),
        ];
        checks.into_iter().flatten().collect()
    }

    fn check_length(&self, text: &str) -> Option<QualitySignal> {
        (text.chars().count() < self.min_response_length).then(|| {
            QualitySignal::new(SignalKind::LowQuality, 0.8, "Response is too short")
        })
    }

    fn check_repetition(&self, text: &str) -> Option<QualitySignal> {
        let sentences: Vec<&str> = text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if sentences.len() < self.repetition_threshold * 2 {
            return None;
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for sentence in sentences {
            if sentence.chars().count() > MIN_REPEATED_SENTENCE_LEN {
                *counts.entry(sentence.to_lowercase()).or_default() += 1;
            }
        }
        counts
            .values()
            .any(|&n| n >= self.repetition_threshold)
            .then(|| {
                QualitySignal::new(
                    SignalKind::Repetitive,
                    0.6,
                    "Response contains excessive repetition",
                )
            })
    }
}

fn check_refusal(text: &str) -> Option<QualitySignal> {
    REFUSAL_PATTERNS.iter().any(|p| p.is_match(text)).then(|| {
        QualitySignal::new(
            SignalKind::Refusal,
            0.9,
            "Model refused to answer the request",
        )
    })
}

fn check_abrupt_ending(text: &str) -> Option<QualitySignal> {
    let tail_start = text
        .char_indices()
        .rev()
        .nth(ABRUPT_TAIL_CHARS - 1)
        .map_or(0, |(i, _)| i);
    let tail = &text[tail_start..];
    ABRUPT_ENDING_PATTERNS
        .iter()
        .any(|p| p.is_match(tail))
        .then(|| QualitySignal {
            position: Some(text.len()),
            ..QualitySignal::new(
                SignalKind::AbruptEnding,
                0.7,
                "Response appears to end abruptly",
            )
        })
}

fn check_truncation(text: &str) -> Option<QualitySignal> {
    TRUNCATION_PATTERNS.iter().any(|p| p.is_match(text)).then(|| {
        QualitySignal::new(
            SignalKind::Truncated,
            0.85,
            "Response appears to be truncated",
        )
    })
}

fn check_incomplete_code(text: &str) -> Option<QualitySignal> {
    let fences = text.matches(CODE_FENCE).count();
    if fences % 2 != 0 {
        return Some(QualitySignal::new(
            SignalKind::IncompleteCode,
            0.8,
            "Code block is not properly closed",
        ));
    }
    if fences == 0 {
        return None;
    }

    let after_last = text
        .rfind(CODE_FENCE)
        .map_or("", |i| &text[i + CODE_FENCE.len()..]);
    INCOMPLETE_CODE_PATTERNS
        .iter()
        .any(|p| p.is_match(after_last))
        .then(|| {
            QualitySignal::new(
                SignalKind::IncompleteCode,
                0.6,
                "Code appears to be incomplete",
            )
        })
}

/// `1 - min(1, sum of severities)`; 1.0 when there are no signals.
pub fn calculate_overall_quality(signals: &[QualitySignal]) -> f64 {
    let total: f64 = signals.iter().map(|s| s.severity).sum();
    (1.0 - total.min(1.0)).max(0.0)
}

/// True if any signal is severe (≥ 0.8) or of a kind that always matters.
pub fn has_critical_signals(signals: &[QualitySignal]) -> bool {
    signals.iter().any(|s| {
        s.severity >= 0.8
            || matches!(
                s.kind,
                SignalKind::Refusal | SignalKind::Truncated | SignalKind::IncompleteCode
            )
    })
}
