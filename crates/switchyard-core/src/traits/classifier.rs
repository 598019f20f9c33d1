// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification collaborators.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SwitchyardError;
use crate::types::IntentMatch;

/// Delegated intent classification, typically a call to a small local model.
///
/// Implementations should stop work when `cancel` fires; the bridge also
/// abandons the call on cancellation or deadline expiry.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `prompt`, returning the raw classifier output (usually JSON text).
    async fn classify(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> Result<String, SwitchyardError>;
}

/// Embedding-based intent matching against known intents.
#[async_trait]
pub trait IntentMatcher: Send + Sync {
    /// Returns `Ok(None)` when nothing clears the matcher's own threshold.
    async fn match_intent(
        &self,
        cancel: &CancellationToken,
        text: &str,
    ) -> Result<Option<IntentMatch>, SwitchyardError>;
}
