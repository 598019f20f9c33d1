// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end checks of the policy language against hostile and realistic
//! scripts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use serde_json::json;

use switchyard_script::{
    compile, from_json, sandbox_globals, to_json, Budget, Interpreter, ScriptError, Value,
};

fn interpreter() -> Interpreter {
    Interpreter::new(Arc::new(sandbox_globals()))
}

#[test]
fn policy_table_exposes_hooks() {
    let src = r#"
        ; route prompts containing code fences to the coder
        (defn on-request [req]
          (when (string/contains? (get req "prompt") "```")
            (assoc req "model" "coder")))
        {:on_request on-request}
    "#;
    let mut interp = interpreter();
    let policy = interp.load(&compile("policy", src).unwrap()).unwrap();
    let hook = policy.field("on_request").cloned().unwrap();

    let req = from_json(&json!({"prompt": "fix ```let x```"}));
    let out = interp.call(&hook, vec![req]).unwrap();
    assert_eq!(
        to_json(&out),
        json!({"prompt": "fix ```let x```", "model": "coder"})
    );

    let plain = from_json(&json!({"prompt": "hello"}));
    assert_eq!(interp.call(&hook, vec![plain]).unwrap(), Value::Nil);
}

#[test]
fn blocked_primitive_inside_a_hook_is_an_error_not_a_crash() {
    let src = "(defn on-request [req] (os/execute \"id\") req) {:on_request on-request}";
    let mut interp = interpreter();
    let policy = interp.load(&compile("policy", src).unwrap()).unwrap();
    let hook = policy.field("on_request").cloned().unwrap();
    let err = interp.call(&hook, vec![Value::Nil]).unwrap_err();
    assert_eq!(err, ScriptError::Blocked("os/execute".into()));
}

#[test]
fn runaway_policy_hits_the_deadline() {
    let src = "(defn spin [] (try (spin) (catch e (spin)))) (spin)";
    let mut interp = interpreter();
    interp.set_budget(Budget::new(
        Some(Instant::now() + Duration::from_millis(30)),
        None,
    ));
    let started = Instant::now();
    let err = interp.load(&compile("spin", src).unwrap()).unwrap_err();
    assert_eq!(err, ScriptError::DeadlineExceeded);
    assert!(started.elapsed() < Duration::from_secs(5));
}

proptest! {
    #[test]
    fn arbitrary_source_never_panics(src in "[()\\[\\]{}a-z0-9 :\"+\\-*/;\n]{0,64}") {
        let mut interp = interpreter();
        interp.set_budget(Budget::new(
            Some(Instant::now() + Duration::from_millis(50)),
            None,
        ));
        if let Ok(program) = compile("fuzz", &src) {
            let _ = interp.load(&program);
        }
    }

    #[test]
    fn string_maps_survive_conversion(
        entries in prop::collection::btree_map("[a-z]{1,8}", "[ -~]{0,16}", 0..8)
    ) {
        let doc = serde_json::Value::Object(
            entries.into_iter().map(|(k, v)| (k, json!(v))).collect(),
        );
        prop_assert_eq!(to_json(&from_json(&doc)), doc);
    }
}
