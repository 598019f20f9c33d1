// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end extension testing.
//!
//! `TestHarness` writes extensions into a temp directory, wires mock
//! collaborators into an [`ExtensionHost`], and exposes `run_hook()` to
//! drive the full policy pipeline in tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use switchyard_config::SwitchyardConfig;
use switchyard_core::{DiscoveredModel, SwitchyardError};
use switchyard_extensions::{ExtensionHost, MANIFEST_FILE, POLICY_FILE};
use switchyard_router::{CapabilityAnalyzer, DynamicMatrix, MatrixBuilder};

use crate::mock_classifier::{MockClassifier, StaticIntentMatcher};
use crate::mock_feedback::MemoryFeedbackRecorder;
use crate::mock_skills::StaticSkillRegistry;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: SwitchyardConfig,
    classifier: Option<MockClassifier>,
    intent_matcher: Option<StaticIntentMatcher>,
    feedback: Option<MemoryFeedbackRecorder>,
    skills: Option<StaticSkillRegistry>,
    extensions: Vec<(String, String, String)>,
    models: Vec<DiscoveredModel>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: SwitchyardConfig::default(),
            classifier: None,
            intent_matcher: None,
            feedback: None,
            skills: None,
            extensions: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Start from a custom configuration. The extension directory and
    /// enabled list are always replaced by the harness's own.
    pub fn with_config(mut self, config: SwitchyardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_classifier(mut self, classifier: MockClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_intent_matcher(mut self, matcher: StaticIntentMatcher) -> Self {
        self.intent_matcher = Some(matcher);
        self
    }

    pub fn with_feedback(mut self, recorder: MemoryFeedbackRecorder) -> Self {
        self.feedback = Some(recorder);
        self
    }

    /// Without this the host runs with no skill registry.
    pub fn with_skills(mut self, registry: StaticSkillRegistry) -> Self {
        self.skills = Some(registry);
        self
    }

    /// Add an extension with a minimal manifest named `id`.
    pub fn with_policy(self, id: &str, policy: &str) -> Self {
        let manifest = format!("[extension]\nname = \"{id}\"\nversion = \"0.1.0\"\n");
        self.with_extension(id, &manifest, policy)
    }

    /// Add an extension with an explicit manifest. Extensions load in the
    /// order they were added.
    pub fn with_extension(mut self, id: &str, manifest: &str, policy: &str) -> Self {
        self.extensions
            .push((id.to_string(), manifest.to_string(), policy.to_string()));
        self
    }

    /// Build a matrix from these models before the host starts.
    pub fn with_models(mut self, models: Vec<DiscoveredModel>) -> Self {
        self.models = models;
        self
    }

    pub fn with_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.config.matrix.overrides = overrides;
        self
    }

    /// Write extensions to disk and assemble the host.
    pub fn build(mut self) -> Result<TestHarness, SwitchyardError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| SwitchyardError::Collaborator {
            message: format!("failed to create temp dir: {e}"),
            source: Some(Box::new(e)),
        })?;
        for (id, manifest, policy) in &self.extensions {
            write_extension(temp_dir.path(), id, manifest, policy)?;
        }
        self.config.extensions.dir = Some(temp_dir.path().to_path_buf());
        self.config.extensions.enabled_extensions =
            self.extensions.iter().map(|(id, _, _)| id.clone()).collect();

        let matrix = Arc::new(MatrixBuilder::new(&self.config.matrix));
        if !self.models.is_empty() {
            matrix.build(&CapabilityAnalyzer::new().analyze_models(&self.models));
        }

        let classifier = Arc::new(self.classifier.unwrap_or_default());
        let intent_matcher = Arc::new(self.intent_matcher.unwrap_or_default());
        let feedback = Arc::new(self.feedback.unwrap_or_default());

        let mut builder = ExtensionHost::builder(&self.config)
            .classifier(classifier.clone())
            .intent_matcher(intent_matcher)
            .feedback(feedback.clone())
            .matrix(Arc::clone(&matrix));
        if let Some(skills) = self.skills {
            builder = builder.skills(Arc::new(skills));
        }
        let host = builder.build()?;

        Ok(TestHarness {
            host,
            classifier,
            feedback,
            matrix,
            config: self.config,
            temp_dir,
        })
    }
}

/// Write one extension directory under `dir`.
pub fn write_extension(
    dir: &Path,
    id: &str,
    manifest: &str,
    policy: &str,
) -> Result<(), SwitchyardError> {
    let io_err = |e: std::io::Error| SwitchyardError::Collaborator {
        message: format!("failed to write extension '{id}': {e}"),
        source: Some(Box::new(e)),
    };
    let ext_dir = dir.join(id);
    std::fs::create_dir_all(&ext_dir).map_err(io_err)?;
    std::fs::write(ext_dir.join(MANIFEST_FILE), manifest).map_err(io_err)?;
    std::fs::write(ext_dir.join(POLICY_FILE), policy).map_err(io_err)?;
    Ok(())
}

/// A host with mock collaborators over a temp extension directory.
pub struct TestHarness {
    pub host: ExtensionHost,
    pub classifier: Arc<MockClassifier>,
    pub feedback: Arc<MemoryFeedbackRecorder>,
    pub matrix: Arc<MatrixBuilder>,
    pub config: SwitchyardConfig,
    temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run a hook with a fresh cancellation token.
    pub async fn run_hook(
        &self,
        hook: &str,
        data: serde_json::Value,
    ) -> Result<serde_json::Value, SwitchyardError> {
        self.host
            .run_hook(&CancellationToken::new(), hook, data)
            .await
    }

    pub fn current_matrix(&self) -> Option<Arc<DynamicMatrix>> {
        self.matrix.current_matrix()
    }

    /// Directory the extensions were loaded from.
    pub fn extension_dir(&self) -> &Path {
        self.temp_dir.path()
    }
}
