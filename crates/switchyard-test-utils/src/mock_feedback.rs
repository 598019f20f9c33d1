// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory feedback recorder.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use switchyard_core::{FeedbackRecord, FeedbackRecorder, SwitchyardError};

/// Keeps every record in memory. In read-only mode writes are refused with
/// [`SwitchyardError::ReadOnly`].
#[derive(Default)]
pub struct MemoryFeedbackRecorder {
    records: Mutex<Vec<FeedbackRecord>>,
    read_only: AtomicBool,
}

impl MemoryFeedbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        let recorder = Self::default();
        recorder.set_read_only(true);
        recorder
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }

    pub async fn records(&self) -> Vec<FeedbackRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl FeedbackRecorder for MemoryFeedbackRecorder {
    async fn record(&self, record: FeedbackRecord) -> Result<(), SwitchyardError> {
        if self.read_only.load(Ordering::Relaxed) {
            return Err(SwitchyardError::ReadOnly);
        }
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn stats(&self) -> Result<Map<String, Value>, SwitchyardError> {
        let records = self.records.lock().await;
        let total = records.len();
        let successes = records.iter().filter(|r| r.success).count();
        let cascades = records.iter().filter(|r| r.cascade_occurred).count();
        let avg_confidence = if total > 0 {
            records.iter().map(|r| r.confidence).sum::<f64>() / total as f64
        } else {
            0.0
        };
        let Value::Object(map) = json!({
            "total": total,
            "successes": successes,
            "cascades": cascades,
            "avg_confidence": avg_confidence,
        }) else {
            return Ok(Map::new());
        };
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_reports_stats() {
        let recorder = MemoryFeedbackRecorder::new();
        recorder
            .record(FeedbackRecord {
                confidence: 0.8,
                cascade_occurred: true,
                ..FeedbackRecord::default()
            })
            .await
            .unwrap();
        let stats = recorder.stats().await.unwrap();
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["cascades"], 1);
        assert_eq!(stats["avg_confidence"], 0.8);
    }

    #[tokio::test]
    async fn read_only_refuses_writes() {
        let recorder = MemoryFeedbackRecorder::read_only();
        let err = recorder.record(FeedbackRecord::default()).await.unwrap_err();
        assert!(err.is_read_only());
        assert!(recorder.records().await.is_empty());
    }
}
