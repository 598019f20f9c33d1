// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The extension host: runs policy hooks in pooled sandbox interpreters.
//!
//! Each invocation checks out an interpreter, evaluates the policy chunk
//! fresh, converts the request or response snapshot into script values,
//! calls the hook and converts the result back. Failures are contained per
//! extension: the chain continues with the last good data.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use switchyard_cascade::CascadeManager;
use switchyard_config::SwitchyardConfig;
use switchyard_core::{
    Classifier, FeedbackRecorder, IntentMatcher, RoutingCache, SkillRegistry, SwitchyardError,
};
use switchyard_router::MatrixBuilder;
use switchyard_script::{from_json, sandbox_globals, to_json, Budget, ScriptError, Value};

use crate::bridge::{self, Bridge};
use crate::cache::MemoryRoutingCache;
use crate::pool::{InterpreterPool, PooledInterpreter};
use crate::registry::{ExtensionRegistry, LoadReport, LoadedExtension};

/// Named extension points.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HookPoint {
    /// Pre-dispatch: sees and may rewrite the outgoing request.
    OnRequest,
    /// Post-dispatch: sees and may rewrite the response.
    OnResponse,
}

pub struct ExtensionHost {
    enabled: bool,
    registry: Arc<ExtensionRegistry>,
    pool: Arc<InterpreterPool>,
    bridge: Arc<Bridge>,
    hook_timeout: Duration,
}

impl ExtensionHost {
    pub fn builder(config: &SwitchyardConfig) -> ExtensionHostBuilder {
        ExtensionHostBuilder::new(config)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    pub fn pool(&self) -> &Arc<InterpreterPool> {
        &self.pool
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    pub fn matrix(&self) -> &Arc<MatrixBuilder> {
        &self.bridge.matrix
    }

    pub fn hook_timeout(&self) -> Duration {
        self.hook_timeout
    }

    /// Compile and register an extension from source.
    pub fn load_extension(
        &self,
        id: &str,
        manifest_toml: &str,
        policy_source: &str,
    ) -> Result<(), SwitchyardError> {
        self.registry.register(id, manifest_toml, policy_source)?;
        info!(extension = %id, "extension registered");
        Ok(())
    }

    /// Load the listed extensions from `dir`; failures disable only the
    /// failing extension.
    pub fn load_dir(&self, dir: &Path, ids: &[String]) -> LoadReport {
        self.registry.load_dir(dir, ids)
    }

    /// Run `hook_name` across every loaded extension, chaining outputs.
    ///
    /// Returns `data` unchanged when the host is disabled or no extension
    /// modifies it. Only an unknown hook name or cancellation of `cancel`
    /// is reported as an error.
    pub async fn run_hook(
        &self,
        cancel: &CancellationToken,
        hook_name: &str,
        data: serde_json::Value,
    ) -> Result<serde_json::Value, SwitchyardError> {
        let hook: HookPoint = hook_name
            .parse()
            .map_err(|_| SwitchyardError::UnknownHook(hook_name.to_string()))?;
        if !self.enabled {
            return Ok(data);
        }

        let mut current = data;
        for ext in self.registry.snapshot() {
            if cancel.is_cancelled() {
                return Err(SwitchyardError::Cancelled);
            }
            if !ext.manifest.handles(hook) {
                continue;
            }
            match self.invoke(cancel, &ext, hook, &current).await {
                Ok(Some(modified)) => current = modified,
                Ok(None) => {}
                Err(SwitchyardError::Cancelled) => return Err(SwitchyardError::Cancelled),
                Err(e) => {
                    debug!(extension = %ext.id(), %hook, error = %e, "hook failed, skipping");
                }
            }
        }
        Ok(current)
    }

    async fn invoke(
        &self,
        cancel: &CancellationToken,
        ext: &Arc<LoadedExtension>,
        hook: HookPoint,
        input: &serde_json::Value,
    ) -> Result<Option<serde_json::Value>, SwitchyardError> {
        let child = cancel.child_token();
        let budget = Budget::new(Some(Instant::now() + self.hook_timeout), Some(child.clone()));
        let interp = self.pool.checkout();
        let task_ext = Arc::clone(ext);
        let input = input.clone();

        // The interpreter runs on a blocking thread so bridge functions can
        // drive async collaborators with `Handle::block_on`.
        let task = tokio::task::spawn_blocking(move || {
            run_policy(interp, &task_ext, hook, budget, &input)
        });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                child.cancel();
                return Err(SwitchyardError::Cancelled);
            }
            outcome = tokio::time::timeout(self.hook_timeout, task) => outcome,
        };

        let timeout = SwitchyardError::Timeout {
            duration: self.hook_timeout,
        };
        match outcome {
            Err(_) => {
                child.cancel();
                Err(timeout)
            }
            Ok(Err(join)) => Err(SwitchyardError::Internal(format!(
                "hook task for '{}' failed: {join}",
                ext.id()
            ))),
            Ok(Ok(Err(ScriptError::DeadlineExceeded))) => Err(timeout),
            Ok(Ok(Err(ScriptError::Cancelled))) if cancel.is_cancelled() => {
                Err(SwitchyardError::Cancelled)
            }
            Ok(Ok(Err(e))) => Err(SwitchyardError::Extension {
                id: ext.id().to_string(),
                message: e.to_string(),
            }),
            Ok(Ok(Ok(result))) => Ok(result),
        }
    }
}

/// Evaluate the policy and call its hook. `None` means no modification.
fn run_policy(
    mut interp: PooledInterpreter,
    ext: &LoadedExtension,
    hook: HookPoint,
    budget: Budget,
    input: &serde_json::Value,
) -> Result<Option<serde_json::Value>, ScriptError> {
    interp.set_budget(budget);
    interp.set_label(ext.id());
    let policy = interp.load(&ext.program)?;

    let name = hook.as_ref();
    let func = policy
        .field(name)
        .filter(|f| !f.is_nil())
        .cloned()
        .or_else(|| interp.global(name).cloned())
        .or_else(|| interp.global(&name.replace('_', "-")).cloned());
    let Some(func) = func else {
        return Ok(None);
    };

    match interp.call(&func, vec![from_json(input)])? {
        Value::Nil => Ok(None),
        out @ Value::Table(_) => Ok(Some(to_json(&out))),
        other => Err(ScriptError::Runtime(format!(
            "{name} returned a {}, expected a table or nil",
            other.type_name()
        ))),
    }
}

/// Assembles an [`ExtensionHost`] from configuration and collaborators.
pub struct ExtensionHostBuilder {
    config: SwitchyardConfig,
    classifier: Option<Arc<dyn Classifier>>,
    intent_matcher: Option<Arc<dyn IntentMatcher>>,
    cache: Option<Arc<dyn RoutingCache>>,
    feedback: Option<Arc<dyn FeedbackRecorder>>,
    skills: Option<Arc<dyn SkillRegistry>>,
    matrix: Option<Arc<MatrixBuilder>>,
    cascade: Option<Arc<CascadeManager>>,
}

impl ExtensionHostBuilder {
    fn new(config: &SwitchyardConfig) -> Self {
        Self {
            config: config.clone(),
            classifier: None,
            intent_matcher: None,
            cache: None,
            feedback: None,
            skills: None,
            matrix: None,
            cascade: None,
        }
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn intent_matcher(mut self, matcher: Arc<dyn IntentMatcher>) -> Self {
        self.intent_matcher = Some(matcher);
        self
    }

    /// Defaults to a [`MemoryRoutingCache`] sized by `extensions.cache_capacity`.
    pub fn cache(mut self, cache: Arc<dyn RoutingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn feedback(mut self, recorder: Arc<dyn FeedbackRecorder>) -> Self {
        self.feedback = Some(recorder);
        self
    }

    pub fn skills(mut self, registry: Arc<dyn SkillRegistry>) -> Self {
        self.skills = Some(registry);
        self
    }

    /// Share a matrix builder with the rest of the router.
    pub fn matrix(mut self, matrix: Arc<MatrixBuilder>) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn cascade(mut self, cascade: Arc<CascadeManager>) -> Self {
        self.cascade = Some(cascade);
        self
    }

    /// Build the host and load the configured extensions.
    ///
    /// Extension load failures are logged and skipped; only an invalid
    /// host configuration fails the build.
    pub fn build(self) -> Result<ExtensionHost, SwitchyardError> {
        let ext_config = &self.config.extensions;
        if ext_config.hook_timeout_ms == 0 {
            return Err(SwitchyardError::Config(
                "extensions.hook_timeout_ms must be greater than 0".to_string(),
            ));
        }

        let settings = serde_json::to_value(&self.config)
            .map_err(|e| SwitchyardError::Internal(format!("failed to expose settings: {e}")))?;
        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(MemoryRoutingCache::new(ext_config.cache_capacity)) as Arc<dyn RoutingCache>
        });
        let matrix = self
            .matrix
            .unwrap_or_else(|| Arc::new(MatrixBuilder::new(&self.config.matrix)));
        let cascade = self.cascade.unwrap_or_else(|| {
            Arc::new(CascadeManager::new(&self.config.cascade, &self.config.quality))
        });

        let bridge = Arc::new(Bridge::new(
            self.classifier,
            self.intent_matcher,
            cache,
            self.feedback,
            self.skills,
            matrix,
            cascade,
            settings,
            ext_config.cache_capacity,
        ));
        let mut globals = sandbox_globals();
        bridge::install(&mut globals, Arc::clone(&bridge));

        let host = ExtensionHost {
            enabled: ext_config.enabled,
            registry: Arc::new(ExtensionRegistry::new()),
            pool: InterpreterPool::new(globals, ext_config.max_idle_interpreters),
            bridge,
            hook_timeout: Duration::from_millis(ext_config.hook_timeout_ms),
        };

        if host.enabled
            && !ext_config.enabled_extensions.is_empty()
            && let Some(dir) = ext_config.resolved_dir()
        {
            host.load_dir(&dir, &ext_config.enabled_extensions);
        }
        Ok(host)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const MANIFEST: &str = "[extension]\nname = \"tagger\"\nversion = \"0.1.0\"\n";

    fn host() -> ExtensionHost {
        ExtensionHost::builder(&SwitchyardConfig::default())
            .build()
            .unwrap()
    }

    #[test]
    fn hook_names_round_trip() {
        assert_eq!("on_request".parse::<HookPoint>().unwrap(), HookPoint::OnRequest);
        assert_eq!(HookPoint::OnResponse.to_string(), "on_response");
        assert!("on_boot".parse::<HookPoint>().is_err());
    }

    #[tokio::test]
    async fn unknown_hook_is_an_error() {
        let err = host()
            .run_hook(&CancellationToken::new(), "on_boot", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchyardError::UnknownHook(ref h) if h == "on_boot"));
    }

    #[tokio::test]
    async fn hook_exported_from_policy_table() {
        let host = host();
        host.load_extension(
            "tagger",
            MANIFEST,
            "{:on_request (fn [req] (assoc req \"tag\" \"seen\"))}",
        )
        .unwrap();
        let out = host
            .run_hook(&CancellationToken::new(), "on_request", json!({"prompt": "hi"}))
            .await
            .unwrap();
        assert_eq!(out, json!({"prompt": "hi", "tag": "seen"}));
    }

    #[tokio::test]
    async fn hook_found_as_global_function() {
        let host = host();
        host.load_extension(
            "tagger",
            MANIFEST,
            "(defn on-response [resp] (assoc resp \"checked\" true))",
        )
        .unwrap();
        let out = host
            .run_hook(&CancellationToken::new(), "on_response", json!({"text": "ok"}))
            .await
            .unwrap();
        assert_eq!(out["checked"], json!(true));
    }

    #[tokio::test]
    async fn missing_hook_and_bad_return_leave_data_unchanged() {
        let host = host();
        host.load_extension("tagger", MANIFEST, "{:on_response (fn [r] 42)}")
            .unwrap();
        let input = json!({"prompt": "hi"});
        let cancel = CancellationToken::new();
        assert_eq!(host.run_hook(&cancel, "on_request", input.clone()).await.unwrap(), input);
        assert_eq!(host.run_hook(&cancel, "on_response", input.clone()).await.unwrap(), input);
    }

    #[tokio::test]
    async fn disabled_host_passes_data_through() {
        let mut config = SwitchyardConfig::default();
        config.extensions.enabled = false;
        let host = ExtensionHost::builder(&config).build().unwrap();
        host.load_extension("tagger", MANIFEST, "{:on_request (fn [r] {:x 1})}")
            .unwrap();
        assert!(!host.is_enabled());
        let out = host
            .run_hook(&CancellationToken::new(), "on_request", json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_the_chain() {
        let host = host();
        host.load_extension("tagger", MANIFEST, "{:on_request (fn [r] r)}")
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = host
            .run_hook(&cancel, "on_request", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchyardError::Cancelled));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = SwitchyardConfig::default();
        config.extensions.hook_timeout_ms = 0;
        assert!(ExtensionHost::builder(&config).build().is_err());
    }
}
