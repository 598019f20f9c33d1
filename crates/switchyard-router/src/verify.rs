// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agreement check between two independently obtained intents.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};

#[derive(Debug, Default)]
pub struct IntentVerifier {
    total: AtomicU64,
    agreements: AtomicU64,
}

impl IntentVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when both intents name the same thing, ignoring case and
    /// surrounding whitespace.
    pub fn verify(&self, primary: &str, secondary: &str) -> bool {
        let agreed = primary.trim().eq_ignore_ascii_case(secondary.trim());
        self.total.fetch_add(1, Ordering::Relaxed);
        if agreed {
            self.agreements.fetch_add(1, Ordering::Relaxed);
        }
        agreed
    }

    pub fn metrics(&self) -> Value {
        let total = self.total.load(Ordering::Relaxed);
        let agreements = self.agreements.load(Ordering::Relaxed);
        let rate = if total > 0 {
            agreements as f64 / total as f64
        } else {
            0.0
        };
        json!({
            "total_verifications": total,
            "agreement_count": agreements,
            "mismatch_count": total - agreements,
            "agreement_rate": rate,
        })
    }
}
