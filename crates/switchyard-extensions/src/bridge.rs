// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host functions exposed to policies under the `router/` namespace.
//!
//! Every bridge function returns a two-element array `[result err]`:
//! `err` is `nil` on success and a message string when the collaborator
//! failed. Collaborator failures never become script errors. Cancellation
//! and deadline expiry do: they abort the whole invocation.
//!
//! Hooks run on blocking threads, so async collaborators are driven with
//! `Handle::block_on`, racing the invocation's cancellation token and
//! deadline.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use switchyard_cascade::{CascadeManager, Tier};
use switchyard_core::{
    CacheEntry, Classifier, FeedbackRecord, FeedbackRecorder, IntentMatcher, RoutingCache,
    SkillRegistry, SwitchyardError,
};
use switchyard_router::{ConfidenceScorer, IntentVerifier, MatrixBuilder};
use switchyard_script::{
    define_native, from_json, to_json, Arity, Globals, Interpreter, ScriptError, Table, Value,
};

/// Collaborators and shared state reachable from policies.
pub struct Bridge {
    pub classifier: Option<Arc<dyn Classifier>>,
    pub intent_matcher: Option<Arc<dyn IntentMatcher>>,
    pub cache: Arc<dyn RoutingCache>,
    pub feedback: Option<Arc<dyn FeedbackRecorder>>,
    pub skills: Option<Arc<dyn SkillRegistry>>,
    pub matrix: Arc<MatrixBuilder>,
    pub cascade: Arc<CascadeManager>,
    pub scorer: Arc<ConfidenceScorer>,
    pub verifier: Arc<IntentVerifier>,
    /// Read-only view returned by `router/config`.
    pub settings: serde_json::Value,
    script_cache: Mutex<HashMap<String, serde_json::Value>>,
    script_cache_capacity: usize,
}

impl Bridge {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: Option<Arc<dyn Classifier>>,
        intent_matcher: Option<Arc<dyn IntentMatcher>>,
        cache: Arc<dyn RoutingCache>,
        feedback: Option<Arc<dyn FeedbackRecorder>>,
        skills: Option<Arc<dyn SkillRegistry>>,
        matrix: Arc<MatrixBuilder>,
        cascade: Arc<CascadeManager>,
        settings: serde_json::Value,
        script_cache_capacity: usize,
    ) -> Self {
        Self {
            classifier,
            intent_matcher,
            cache,
            feedback,
            skills,
            matrix,
            cascade,
            scorer: Arc::new(ConfidenceScorer::new()),
            verifier: Arc::new(IntentVerifier::new()),
            settings,
            script_cache: Mutex::new(HashMap::new()),
            script_cache_capacity: script_cache_capacity.max(1),
        }
    }

    /// Number of entries in the script-visible key/value cache.
    pub fn script_cache_len(&self) -> usize {
        self.script_cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn cache_get(&self, key: &str) -> Option<serde_json::Value> {
        self.script_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Inserting a new key into a full cache clears it first.
    fn cache_set(&self, key: String, value: serde_json::Value) {
        let mut cache = self.script_cache.lock().unwrap_or_else(PoisonError::into_inner);
        if !cache.contains_key(&key) && cache.len() >= self.script_cache_capacity {
            cache.clear();
        }
        cache.insert(key, value);
    }
}

fn ok(value: Value) -> Value {
    Value::table(Table::from_values([value, Value::Nil]))
}

fn fail(message: impl Into<String>) -> Value {
    Value::table(Table::from_values([Value::Nil, Value::Str(message.into())]))
}

fn ok_json(value: serde_json::Value) -> Value {
    ok(from_json(&value))
}

fn serialized<T: serde::Serialize>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(json) => ok_json(json),
        Err(e) => fail(format!("serialization failed: {e}")),
    }
}

/// Drive `fut` to completion on the ambient runtime, giving up when the
/// invocation is cancelled or its deadline passes.
fn block_on_collaborator<T>(
    interp: &Interpreter,
    fut: impl Future<Output = Result<T, SwitchyardError>>,
) -> Result<Result<T, SwitchyardError>, ScriptError> {
    let budget = interp.budget().clone();
    budget.check()?;
    let handle = Handle::try_current()
        .map_err(|_| ScriptError::Runtime("bridge call requires an async runtime".into()))?;
    let cancel = budget.cancel.unwrap_or_default();
    let deadline = budget.deadline;

    handle.block_on(async move {
        let expiry = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at.into()).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScriptError::Cancelled),
            _ = expiry => Err(ScriptError::DeadlineExceeded),
            result = fut => Ok(result),
        }
    })
}

fn collaborator_result<T>(
    result: Result<T, SwitchyardError>,
    convert: impl FnOnce(T) -> Value,
) -> Value {
    match result {
        Ok(value) => convert(value),
        Err(e) => fail(e.to_string()),
    }
}

/// Register every `router/` function into `globals`.
pub fn install(globals: &mut Globals, bridge: Arc<Bridge>) {
    install_intelligence(globals, &bridge);
    install_skills(globals, &bridge);
    install_matrix(globals, &bridge);
    install_cache(globals, &bridge);
    install_cascade(globals, &bridge);
    install_feedback(globals, &bridge);
    install_utilities(globals, &bridge);
}

fn install_intelligence(g: &mut Globals, bridge: &Arc<Bridge>) {
    let b = Arc::clone(bridge);
    define_native(g, "router/classify", Arity::Fixed(1), move |interp, args| {
        let prompt = args[0].as_str("router/classify")?.to_string();
        let Some(classifier) = b.classifier.clone() else {
            return Ok(fail("no classifier configured"));
        };
        let cancel = interp.budget().cancel.clone().unwrap_or_default();
        let result = block_on_collaborator(interp, async move {
            classifier.classify(&cancel, &prompt).await
        })?;
        Ok(collaborator_result(result, Value::Str))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/semantic-match-intent", Arity::Fixed(1), move |interp, args| {
        let text = args[0].as_str("router/semantic-match-intent")?.to_string();
        let Some(matcher) = b.intent_matcher.clone() else {
            return Ok(fail("no intent matcher configured"));
        };
        let cancel = interp.budget().cancel.clone().unwrap_or_default();
        let result = block_on_collaborator(interp, async move {
            matcher.match_intent(&cancel, &text).await
        })?;
        Ok(collaborator_result(result, |found| match found {
            Some(m) => serialized(&m),
            None => ok(Value::Nil),
        }))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/parse-confidence", Arity::Fixed(1), move |_, args| {
        let raw = args[0].as_str("router/parse-confidence")?;
        Ok(match b.scorer.parse(raw) {
            Ok(parsed) => serialized(&parsed),
            Err(e) => fail(e.to_string()),
        })
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/verify-intent", Arity::Fixed(2), move |_, args| {
        let f = "router/verify-intent";
        let agreed = b.verifier.verify(args[0].as_str(f)?, args[1].as_str(f)?);
        Ok(ok(Value::Bool(agreed)))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/intelligence-metrics", Arity::Fixed(0), move |_, _| {
        Ok(ok_json(json!({
            "confidence": b.scorer.metrics(),
            "verification": b.verifier.metrics(),
            "cache": b.cache.metrics(),
        })))
    });
}

fn install_skills(g: &mut Globals, bridge: &Arc<Bridge>) {
    let b = Arc::clone(bridge);
    define_native(g, "router/get-skills", Arity::Fixed(0), move |_, _| {
        let Some(registry) = b.skills.as_ref() else {
            return Ok(fail("no skill registry configured"));
        };
        let listed = registry.skills();
        let mut by_id = serde_json::Map::new();
        for skill in &listed {
            match serde_json::to_value(skill) {
                Ok(value) => by_id.insert(skill.id.clone(), value),
                Err(e) => return Ok(fail(format!("serialization failed: {e}"))),
            };
        }
        Ok(ok_json(json!({
            "skills": by_id,
            "count": listed.len(),
            "embeddings_available": registry.has_embeddings(),
        })))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/match-skill", Arity::Fixed(1), move |interp, args| {
        let text = args[0].as_str("router/match-skill")?.to_string();
        let Some(registry) = b.skills.clone() else {
            return Ok(fail("no skill registry configured"));
        };
        let cancel = interp.budget().cancel.clone().unwrap_or_default();
        let result = block_on_collaborator(interp, async move {
            registry.match_skill(&cancel, &text).await
        })?;
        Ok(collaborator_result(result, |found| match found {
            Some(m) => serialized(&m),
            None => ok(Value::Nil),
        }))
    });

    define_native(g, "math/cosine-similarity", Arity::Fixed(2), |_, args| {
        let (Some(a), Some(b)) = (numeric_vector(&args[0]), numeric_vector(&args[1])) else {
            return Ok(fail("expected two arrays of numbers"));
        };
        Ok(match cosine_similarity(&a, &b) {
            Ok(similarity) => ok(Value::Number(similarity)),
            Err(message) => fail(message),
        })
    });
}

/// Entries of a sequence table, or `None` if any entry is not a number.
fn numeric_vector(value: &Value) -> Option<Vec<f64>> {
    let Value::Table(table) = value else {
        return None;
    };
    if !table.is_empty() && table.sequence_len().is_none() {
        return None;
    }
    table
        .values()
        .map(|v| match v {
            Value::Number(n) => Some(*n),
            _ => None,
        })
        .collect()
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, &'static str> {
    if a.len() != b.len() {
        return Err("vectors differ in length");
    }
    if a.is_empty() {
        return Err("vectors are empty");
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err("zero-magnitude vector");
    }
    Ok(dot / (norm_a * norm_b))
}

fn install_matrix(g: &mut Globals, bridge: &Arc<Bridge>) {
    let b = Arc::clone(bridge);
    define_native(g, "router/get-dynamic-matrix", Arity::Fixed(0), move |_, _| {
        Ok(match b.matrix.current_matrix() {
            Some(matrix) => serialized(matrix.as_ref()),
            None => fail("dynamic matrix has not been built"),
        })
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/is-model-available", Arity::Fixed(1), move |_, args| {
        let id = args[0].as_str("router/is-model-available")?;
        let available = b
            .matrix
            .current_matrix()
            .is_some_and(|m| m.contains_model(id));
        Ok(ok(Value::Bool(available)))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/available-models", Arity::Fixed(0), move |_, _| {
        let models = b
            .matrix
            .current_matrix()
            .map(|m| m.models.iter().cloned().map(Value::Str).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(ok(Value::table(Table::from_values(models))))
    });
}

fn install_cache(g: &mut Globals, bridge: &Arc<Bridge>) {
    let b = Arc::clone(bridge);
    define_native(g, "router/cache-lookup", Arity::Fixed(1), move |interp, args| {
        let query = args[0].as_str("router/cache-lookup")?.to_string();
        let cache = Arc::clone(&b.cache);
        let result = block_on_collaborator(interp, async move { cache.lookup(&query).await })?;
        Ok(collaborator_result(result, |found| match found {
            Some(entry) => serialized(&entry),
            None => fail("cache miss"),
        }))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/cache-metrics", Arity::Fixed(0), move |_, _| {
        Ok(ok_json(serde_json::Value::Object(b.cache.metrics())))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/cache-store", Arity::Range(2, 3), move |interp, args| {
        let query = args[0].as_str("router/cache-store")?.to_string();
        let metadata = match args.get(2).map(to_json) {
            Some(serde_json::Value::Object(map)) => map,
            Some(serde_json::Value::Null) | None => serde_json::Map::new(),
            Some(_) => return Ok(fail("metadata must be a table")),
        };
        let entry = CacheEntry {
            decision: to_json(&args[1]),
            metadata,
            similarity: 1.0,
        };
        let cache = Arc::clone(&b.cache);
        let result =
            block_on_collaborator(interp, async move { cache.store(&query, entry).await })?;
        Ok(collaborator_result(result, |()| ok(Value::Bool(true))))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/get-cache", Arity::Fixed(1), move |_, args| {
        let key = args[0].as_str("router/get-cache")?;
        Ok(ok(b.cache_get(key).map_or(Value::Nil, |v| from_json(&v))))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/set-cache", Arity::Fixed(2), move |_, args| {
        let key = args[0].as_str("router/set-cache")?.to_string();
        b.cache_set(key, to_json(&args[1]));
        Ok(ok(Value::Bool(true)))
    });
}

fn install_cascade(g: &mut Globals, bridge: &Arc<Bridge>) {
    let b = Arc::clone(bridge);
    define_native(g, "router/evaluate-response", Arity::Fixed(2), move |_, args| {
        let f = "router/evaluate-response";
        let text = args[0].as_str(f)?;
        let tier_name = args[1].as_str(f)?;
        let tier = tier_name
            .parse::<Tier>()
            .unwrap_or_else(|_| Tier::from_capability(tier_name));
        Ok(serialized(&b.cascade.evaluate_response(text, tier)))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/cascade-metrics", Arity::Fixed(0), move |_, _| {
        Ok(serialized(&b.cascade.metrics()))
    });
}

fn install_feedback(g: &mut Globals, bridge: &Arc<Bridge>) {
    let b = Arc::clone(bridge);
    define_native(g, "router/record-feedback", Arity::Fixed(1), move |interp, args| {
        let Some(recorder) = b.feedback.clone() else {
            return Ok(fail("no feedback recorder configured"));
        };
        let record: FeedbackRecord = match serde_json::from_value(to_json(&args[0])) {
            Ok(record) => record,
            Err(e) => return Ok(fail(format!("invalid feedback record: {e}"))),
        };
        let result = block_on_collaborator(interp, async move { recorder.record(record).await })?;
        Ok(collaborator_result(result, |()| ok(Value::Bool(true))))
    });
}

fn install_utilities(g: &mut Globals, bridge: &Arc<Bridge>) {
    define_native(g, "router/log", Arity::Fixed(2), |interp, args| {
        let level = args[0].as_str("router/log")?;
        let message = args[1].to_string();
        let extension = interp.label();
        match level {
            "debug" => debug!(extension, "{message}"),
            "info" => info!(extension, "{message}"),
            "warn" => warn!(extension, "{message}"),
            "error" => error!(extension, "{message}"),
            other => return Ok(fail(format!("unknown log level '{other}'"))),
        }
        Ok(ok(Value::Bool(true)))
    });

    define_native(g, "router/inject-system", Arity::Fixed(2), |_, args| {
        let Value::Table(messages) = &args[0] else {
            return Ok(fail("messages must be an array"));
        };
        let content = args[1].as_str("router/inject-system")?;
        let system = from_json(&json!({"role": "system", "content": content}));
        let mut values = vec![system];
        values.extend(messages.values().cloned());
        Ok(ok(Value::table(Table::from_values(values))))
    });

    let b = Arc::clone(bridge);
    define_native(g, "router/config", Arity::Fixed(0), move |_, _| {
        Ok(ok_json(b.settings.clone()))
    });
}
