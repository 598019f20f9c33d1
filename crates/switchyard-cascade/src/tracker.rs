// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request escalation bookkeeping.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::manager::CascadeDecision;
use crate::tier::Tier;

const DEFAULT_MAX_ATTEMPTS: usize = 2;

/// Summary of a finished request chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeResult {
    pub original_tier: Tier,
    pub final_tier: Tier,
    pub cascade_count: usize,
    pub total_latency_ms: u64,
    pub success: bool,
}

/// Follows one logical request across its attempts.
///
/// Created at first dispatch and dropped once the chain succeeds or runs
/// out of attempts.
#[derive(Debug)]
pub struct CascadeTracker {
    original_tier: Tier,
    current_tier: Tier,
    attempts: Vec<CascadeDecision>,
    max_attempts: usize,
    started: Instant,
}

impl CascadeTracker {
    /// `max_attempts` of zero falls back to 2.
    pub fn new(initial_tier: Tier, max_attempts: usize) -> Self {
        Self {
            original_tier: initial_tier,
            current_tier: initial_tier,
            attempts: Vec::new(),
            max_attempts: if max_attempts == 0 {
                DEFAULT_MAX_ATTEMPTS
            } else {
                max_attempts
            },
            started: Instant::now(),
        }
    }

    pub fn record_attempt(&mut self, decision: CascadeDecision) {
        if decision.should_cascade
            && let Some(next) = decision.next_tier
        {
            self.current_tier = next;
        }
        self.attempts.push(decision);
    }

    /// False once attempts are exhausted or the last decision accepted the
    /// response. A fresh tracker may always make its first attempt.
    pub fn can_continue(&self) -> bool {
        self.attempts.len() < self.max_attempts
            && self.attempts.last().is_none_or(|d| d.should_cascade)
    }

    pub fn current_tier(&self) -> Tier {
        self.current_tier
    }

    pub fn attempts(&self) -> &[CascadeDecision] {
        &self.attempts
    }

    /// Number of attempts that escalated to a higher tier.
    pub fn cascade_count(&self) -> usize {
        self.attempts.iter().filter(|d| d.should_cascade).count()
    }

    pub fn result(&self, success: bool) -> CascadeResult {
        CascadeResult {
            original_tier: self.original_tier,
            final_tier: self.current_tier,
            cascade_count: self.cascade_count(),
            total_latency_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            success,
        }
    }
}
