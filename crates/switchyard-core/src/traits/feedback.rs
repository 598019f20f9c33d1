// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feedback recorder collaborator.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::SwitchyardError;
use crate::types::FeedbackRecord;

/// Persists routing feedback for later analysis.
///
/// A recorder in read-only mode must return [`SwitchyardError::ReadOnly`]
/// from [`record`](Self::record) instead of writing.
#[async_trait]
pub trait FeedbackRecorder: Send + Sync {
    async fn record(&self, record: FeedbackRecord) -> Result<(), SwitchyardError>;

    /// Aggregate statistics over recorded feedback.
    async fn stats(&self) -> Result<Map<String, Value>, SwitchyardError>;
}
