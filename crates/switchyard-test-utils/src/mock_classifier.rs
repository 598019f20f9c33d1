// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock classification collaborators for deterministic testing.
//!
//! `MockClassifier` pops pre-configured outputs from a FIFO queue, so a test
//! can script exactly what a policy sees from `router/classify`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use switchyard_core::{Classifier, IntentMatch, IntentMatcher, SwitchyardError};

/// A classifier that returns queued responses.
///
/// When the queue is empty the fallback response is returned. With a
/// failure message set, every call fails with a collaborator error.
pub struct MockClassifier {
    responses: Arc<Mutex<VecDeque<String>>>,
    fallback: String,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: r#"{"intent":"chat","complexity":"low","confidence":0.5}"#.to_string(),
            failure: None,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-load responses, returned in order.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::new()
        }
    }

    /// Always return `response`.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self {
            fallback: response.into(),
            ..Self::new()
        }
    }

    /// Fail every call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Sleep before answering; the sleep ends early on cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// Prompts received so far.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> Result<String, SwitchyardError> {
        self.calls.lock().await.push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(SwitchyardError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if let Some(message) = &self.failure {
            return Err(SwitchyardError::collaborator(message.clone()));
        }
        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// An intent matcher answering from a fixed keyword table.
pub struct StaticIntentMatcher {
    intents: Vec<(String, String, f64)>,
}

impl StaticIntentMatcher {
    pub fn new() -> Self {
        Self {
            intents: Vec::new(),
        }
    }

    /// Match `intent` at `confidence` whenever the text contains `keyword`.
    pub fn with_intent(mut self, keyword: &str, intent: &str, confidence: f64) -> Self {
        self.intents
            .push((keyword.to_lowercase(), intent.to_string(), confidence));
        self
    }
}

impl Default for StaticIntentMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentMatcher for StaticIntentMatcher {
    async fn match_intent(
        &self,
        _cancel: &CancellationToken,
        text: &str,
    ) -> Result<Option<IntentMatch>, SwitchyardError> {
        let text = text.to_lowercase();
        Ok(self
            .intents
            .iter()
            .find(|(keyword, _, _)| text.contains(keyword.as_str()))
            .map(|(_, intent, confidence)| IntentMatch {
                intent: intent.clone(),
                confidence: *confidence,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_then_fallback() {
        let classifier = MockClassifier::with_responses(vec!["first".into()]);
        let cancel = CancellationToken::new();
        assert_eq!(classifier.classify(&cancel, "a").await.unwrap(), "first");
        assert!(classifier.classify(&cancel, "b").await.unwrap().contains("chat"));
        assert_eq!(classifier.calls().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn failing_classifier_returns_collaborator_error() {
        let classifier = MockClassifier::failing("model offline");
        let err = classifier
            .classify(&CancellationToken::new(), "x")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model offline"));
    }

    #[tokio::test]
    async fn delay_respects_cancellation() {
        let classifier = MockClassifier::new().with_delay(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = classifier.classify(&cancel, "x").await.unwrap_err();
        assert!(matches!(err, SwitchyardError::Cancelled));
    }

    #[tokio::test]
    async fn static_matcher_is_case_insensitive() {
        let matcher = StaticIntentMatcher::new().with_intent("Refactor", "coding", 0.8);
        let cancel = CancellationToken::new();
        let found = matcher.match_intent(&cancel, "please REFACTOR this").await.unwrap();
        assert_eq!(found.unwrap().intent, "coding");
        assert!(matcher.match_intent(&cancel, "hello").await.unwrap().is_none());
    }
}
