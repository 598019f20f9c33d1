// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extension failures must never escape the host.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing_test::traced_test;

use switchyard_config::SwitchyardConfig;
use switchyard_core::SwitchyardError;
use switchyard_test_utils::{MockClassifier, TestHarness};

fn config_with_timeout(ms: u64) -> SwitchyardConfig {
    let mut config = SwitchyardConfig::default();
    config.extensions.hook_timeout_ms = ms;
    config
}

#[tokio::test]
async fn blocked_primitive_is_no_modification() {
    let harness = TestHarness::builder()
        .with_policy(
            "escape",
            r#"{:on_request (fn [req] (os/execute "rm -rf /") (assoc req "pwned" true))}"#,
        )
        .build()
        .unwrap();
    let input = json!({"prompt": "hi"});
    assert_eq!(harness.run_hook("on_request", input.clone()).await.unwrap(), input);
}

#[tokio::test]
async fn blocked_error_is_catchable_inside_the_script() {
    let harness = TestHarness::builder()
        .with_policy(
            "attempt",
            r#"{:on_request (fn [req] (assoc req "attempt" (try (io/open "/etc/passwd") (catch e e))))}"#,
        )
        .build()
        .unwrap();
    let out = harness.run_hook("on_request", json!({})).await.unwrap();
    assert!(out["attempt"].as_str().unwrap().contains("blocked"));
}

#[tokio::test]
#[traced_test]
async fn load_failure_disables_only_that_extension() {
    let harness = TestHarness::builder()
        .with_policy("broken", "(defn on-request [req]")
        .with_extension(
            "mismatched",
            "[extension]\nname = \"other\"\nversion = \"1\"\n",
            "{}",
        )
        .with_policy("healthy", r#"{:on_request (fn [req] (assoc req "ok" true))}"#)
        .build()
        .unwrap();

    assert_eq!(harness.host.registry().ids(), vec!["healthy"]);
    assert!(logs_contain("extension disabled"));
    let out = harness.run_hook("on_request", json!({})).await.unwrap();
    assert_eq!(out["ok"], true);
}

#[tokio::test]
async fn runaway_policy_is_stopped_by_the_deadline() {
    let harness = TestHarness::builder()
        .with_config(config_with_timeout(100))
        .with_policy(
            "spinner",
            r#"
            (defn spin [] (try (spin) (catch e (spin))))
            {:on_request (fn [req] (spin) (assoc req "done" true))}
            "#,
        )
        .with_policy("after", r#"{:on_request (fn [req] (assoc req "after" true))}"#)
        .build()
        .unwrap();

    let started = Instant::now();
    let out = harness.run_hook("on_request", json!({})).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(out.get("done").is_none());
    assert_eq!(out["after"], true);
}

#[tokio::test]
async fn slow_collaborator_is_abandoned_at_the_deadline() {
    let harness = TestHarness::builder()
        .with_config(config_with_timeout(100))
        .with_classifier(MockClassifier::new().with_delay(Duration::from_secs(30)))
        .with_policy(
            "waiter",
            r#"{:on_request (fn [req] (router/classify "x") (assoc req "classified" true))}"#,
        )
        .build()
        .unwrap();

    let started = Instant::now();
    let out = harness.run_hook("on_request", json!({})).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(out.get("classified").is_none());
}

#[tokio::test]
async fn script_state_does_not_leak_between_calls() {
    let mut config = SwitchyardConfig::default();
    config.extensions.max_idle_interpreters = 1;
    let harness = TestHarness::builder()
        .with_config(config)
        .with_policy(
            "stateful",
            r#"
            (defn on-request [req]
              (let [seen (bound? "marker")]
                (def marker true)
                (assoc req "seen" seen)))
            "#,
        )
        .build()
        .unwrap();

    for _ in 0..3 {
        let out = harness.run_hook("on_request", json!({})).await.unwrap();
        assert_eq!(out["seen"], false);
    }
    assert_eq!(harness.host.pool().created(), 1);
}

#[tokio::test]
async fn over_deep_table_is_no_modification() {
    let harness = TestHarness::builder()
        .with_policy(
            "nester",
            r#"
            {:on_request
             (fn [req]
               (let [commas (reduce (fn [acc _] (string/join "" [acc acc]))
                                    ","
                                    (string/split ",,,,,,,,,,,,,,,,," ","))
                     deep (reduce (fn [acc _] {:n acc}) nil (string/split commas ","))]
                 (assoc req "deep" deep)))}
            "#,
        )
        .with_policy("after", r#"{:on_request (fn [req] (assoc req "after" true))}"#)
        .build()
        .unwrap();

    let out = harness
        .run_hook("on_request", json!({"prompt": "hi"}))
        .await
        .unwrap();
    assert_eq!(out, json!({"prompt": "hi", "after": true}));
}

#[tokio::test]
async fn unknown_hook_is_reported() {
    let harness = TestHarness::builder().build().unwrap();
    let err = harness.run_hook("on_shutdown", json!({})).await.unwrap_err();
    assert!(matches!(err, SwitchyardError::UnknownHook(_)));
}

#[tokio::test]
async fn manifest_hook_list_filters_dispatch() {
    let harness = TestHarness::builder()
        .with_extension(
            "responses-only",
            "[extension]\nname = \"responses-only\"\nversion = \"1\"\nhooks = [\"on_response\"]\n",
            r#"
            (defn on-request [req] (assoc req "touched" true))
            (defn on-response [resp] (assoc resp "touched" true))
            "#,
        )
        .build()
        .unwrap();
    let out = harness.run_hook("on_request", json!({})).await.unwrap();
    assert!(out.get("touched").is_none());
    let out = harness.run_hook("on_response", json!({})).await.unwrap();
    assert_eq!(out["touched"], true);
}
