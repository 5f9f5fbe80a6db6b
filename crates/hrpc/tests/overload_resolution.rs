// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Overload resolution gives the same answer locally and through a proxy.

use hrpc::object::{args_signature, DynamicObject, ObjectBuilder, ResolutionError};
use hrpc::session::{LocalDirectory, Session};
use hrpc::{CallError, Signature, Value};
use std::sync::Arc;

fn describe() -> DynamicObject {
    let mut builder = ObjectBuilder::new();
    builder
        .advertise_fn("describe", |v: i32| format!("int {}", v))
        .expect("describe::(i)");
    builder
        .advertise_fn("describe", |v: i64| format!("long {}", v))
        .expect("describe::(l)");
    builder
        .advertise_fn("describe", |v: f64| format!("double {}", v))
        .expect("describe::(d)");
    builder
        .advertise_fn("describe", |v: String| format!("string {}", v))
        .expect("describe::(s)");
    builder
        .advertise_fn("describe", |a: i32, b: String| format!("pair {} {}", a, b))
        .expect("describe::(is)");
    builder
        .advertise_fn("widen", |v: i64| v * 2)
        .expect("widen::(l)");
    builder.build()
}

fn cases() -> Vec<(Vec<Value>, &'static str)> {
    vec![
        (vec![Value::I32(7)], "int 7"),
        (vec![Value::I64(7)], "long 7"),
        (vec![Value::F64(0.5)], "double 0.5"),
        (vec!["x".into()], "string x"),
        (vec![Value::I32(1), "y".into()], "pair 1 y"),
        (vec![Value::U8(1), "y".into()], "pair 1 y"),
    ]
}

#[test]
fn local_and_remote_pick_the_same_overload() {
    let object = Arc::new(describe());
    let (server, client) = Session::pair(Arc::new(LocalDirectory::new())).expect("pair");
    server
        .register_service("describer", Arc::clone(&object))
        .expect("register");
    let remote = client.service("describer").expect("proxy");

    for (args, expected) in cases() {
        let signature = args_signature(&args);
        let local_id = object.resolve("describe", &signature).expect("local");
        assert_eq!(remote.resolve("describe", &signature), Ok(local_id));

        assert_eq!(
            object.call("describe", &args),
            Ok(Value::String(expected.into())),
            "local {}",
            signature
        );
        assert_eq!(
            remote.call_as::<String>("describe", args.clone()),
            Ok(expected.to_owned()),
            "remote {}",
            signature
        );
    }
}

#[test]
fn int32_prefers_the_int_overload_every_time() {
    let object = describe();
    let args = Signature::parse("i").expect("i");
    let chosen = object.resolve("describe", &args).expect("resolve");
    assert_eq!(
        object.meta_object().method(chosen).map(|m| m.qualified_name()),
        Some("describe::(i)".to_owned())
    );
    for _ in 0..100 {
        assert_eq!(object.resolve("describe", &args), Ok(chosen));
    }
}

#[test]
fn tie_is_reported_with_every_candidate() {
    let object = describe();
    match object.call("describe", &[Value::I16(3)]) {
        Err(CallError::Resolution(ResolutionError::Ambiguous { name, candidates })) => {
            assert_eq!(name, "describe");
            assert_eq!(
                candidates,
                vec!["describe::(i)", "describe::(l)", "describe::(d)"]
            );
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[test]
fn single_candidate_converts_arguments() {
    let object = describe();
    assert_eq!(object.call("widen", &[Value::I8(-4)]), Ok(Value::I64(-8)));
    assert_eq!(object.call("widen", &[Value::U32(5)]), Ok(Value::I64(10)));
    assert!(matches!(
        object.call("widen", &["5".into()]),
        Err(CallError::Resolution(ResolutionError::NotFound { .. }))
    ));
}

#[test]
fn qualified_names_bypass_scoring() {
    let (server, client) = Session::pair(Arc::new(LocalDirectory::new())).expect("pair");
    server
        .register_service("describer", Arc::new(describe()))
        .expect("register");
    let remote = client.service("describer").expect("proxy");

    assert_eq!(
        remote.call_as::<String>("describe::(d)", vec![Value::I32(2)]),
        Ok("double 2".to_owned())
    );
    assert_eq!(
        remote.call_as::<String>("describe::(l)", vec![Value::I16(3)]),
        Ok("long 3".to_owned())
    );
    assert!(matches!(
        remote.call("describe::(b)", vec![Value::Bool(true)]),
        Err(CallError::Resolution(ResolutionError::NotFound { .. }))
    ));
}
