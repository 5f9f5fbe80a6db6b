// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::error::CallError;
use crate::value::{ConversionError, Value};
use parking_lot::Mutex;
use std::sync::Arc;

fn tagged(tag: &'static str) -> impl Fn(&[Value]) -> Result<Value, CallError> + Send + Sync {
    move |_: &[Value]| Ok(Value::String(tag.to_owned()))
}

fn overloaded() -> DynamicObject {
    let mut builder = ObjectBuilder::new();
    builder.advertise_method("f", "d", "s", tagged("double")).expect("f::(d)");
    builder.advertise_method("f", "i", "s", tagged("int")).expect("f::(i)");
    builder.advertise_method("f", "s", "s", tagged("string")).expect("f::(s)");
    builder.build()
}

#[test]
fn test_ids_start_at_first_user_action() {
    let mut builder = ObjectBuilder::new();
    let a = builder.advertise_fn("a", || 1i32).expect("a");
    let changed = builder.advertise_signal("changed", "i").expect("signal");
    let level = builder
        .advertise_property("level", "i", Value::I32(0))
        .expect("property");
    assert_eq!((a, changed, level), (100, 101, 102));
}

#[test]
fn test_exact_overload_wins() {
    let object = overloaded();
    assert_eq!(
        object.call("f", &[Value::I32(7)]),
        Ok(Value::String("int".into()))
    );
    assert_eq!(
        object.call("f", &[Value::String("x".into())]),
        Ok(Value::String("string".into()))
    );
    assert_eq!(
        object.call("f", &[Value::F64(1.5)]),
        Ok(Value::String("double".into()))
    );
}

#[test]
fn test_resolution_is_stable_across_calls() {
    let object = overloaded();
    let args = args_signature(&[Value::I32(1)]);
    let first = object.resolve("f", &args).expect("resolve");
    for _ in 0..10 {
        assert_eq!(object.resolve("f", &args), Ok(first));
    }
    assert_eq!(object.meta_object().method(first).map(|m| m.qualified_name()), Some("f::(i)".into()));
}

#[test]
fn test_equal_scores_are_ambiguous() {
    let mut builder = ObjectBuilder::new();
    builder.advertise_method("g", "l", "s", tagged("long")).expect("g::(l)");
    builder.advertise_method("g", "d", "s", tagged("double")).expect("g::(d)");
    let object = builder.build();

    match object.call("g", &[Value::I32(1)]) {
        Err(CallError::Resolution(ResolutionError::Ambiguous { name, candidates })) => {
            assert_eq!(name, "g");
            assert_eq!(candidates, vec!["g::(l)".to_owned(), "g::(d)".to_owned()]);
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[test]
fn test_qualified_name_bypasses_scoring() {
    let object = overloaded();
    assert_eq!(
        object.call("f::(d)", &[Value::I32(1)]),
        Ok(Value::String("double".into()))
    );
    assert!(matches!(
        object.call("f::(w)", &[Value::I32(1)]),
        Err(CallError::Resolution(ResolutionError::NotFound { .. }))
    ));
}

#[test]
fn test_unknown_name_and_wrong_arity() {
    let object = overloaded();
    assert!(matches!(
        object.call("missing", &[]),
        Err(CallError::Resolution(ResolutionError::NotFound { .. }))
    ));
    assert!(matches!(
        object.call("f", &[Value::I32(1), Value::I32(2)]),
        Err(CallError::Resolution(ResolutionError::NotFound { .. }))
    ));
    assert_eq!(
        object.invoke(100, &[]),
        Err(CallError::ArgumentCount {
            expected: 1,
            found: 0
        })
    );
    assert_eq!(
        object.invoke(999, &[]),
        Err(CallError::Unknown {
            what: "method",
            id: 999
        })
    );
}

#[test]
fn test_duplicates_rejected_unless_tolerated() {
    let mut builder = ObjectBuilder::new();
    let id = builder.advertise_fn("h", |x: i32| x).expect("h");
    assert_eq!(
        builder.advertise_fn("h", |x: i32| x + 1),
        Err(ObjectError::Duplicate {
            name: "h::(i)".into(),
            id
        })
    );
    // A different overload is not a duplicate.
    assert_eq!(builder.advertise_fn("h", |x: String| x), Ok(id + 1));

    builder.tolerate_duplicates(true);
    assert_eq!(builder.advertise_fn("h", |x: i32| x * 2), Ok(id));

    // The first body is kept.
    let object = builder.build();
    assert_eq!(object.call_as::<i32>("h", &[Value::I32(4)]), Ok(4));
}

#[test]
fn test_arguments_and_result_converted() {
    let mut builder = ObjectBuilder::new();
    builder.advertise_fn("half", |x: u8| x / 2).expect("half");
    builder
        .advertise_method("wide", "", "l", |_: &[Value]| Ok(Value::I8(-3)))
        .expect("wide");
    let object = builder.build();

    assert_eq!(object.call("half", &[Value::I64(40)]), Ok(Value::U8(20)));
    assert!(matches!(
        object.call("half", &[Value::I32(300)]),
        Err(CallError::Conversion(ConversionError::Element { index: 0, .. }))
    ));
    assert_eq!(object.call("wide", &[]), Ok(Value::I64(-3)));
}

#[test]
fn test_method_failures_become_call_errors() {
    let mut builder = ObjectBuilder::new();
    builder
        .advertise_method("boom", "", "v", |_: &[Value]| panic!("kaboom"))
        .expect("boom");
    builder
        .advertise_try_fn("parse", |text: String| text.parse::<i32>())
        .expect("parse");
    let object = builder.build();

    assert_eq!(
        object.call("boom", &[]),
        Err(CallError::Panicked("kaboom".into()))
    );
    assert_eq!(
        object.call("parse", &[Value::String("12".into())]),
        Ok(Value::I32(12))
    );
    assert!(matches!(
        object.call("parse", &[Value::String("twelve".into())]),
        Err(CallError::Method(_))
    ));
}

#[test]
fn test_signals_deliver_in_order_and_disconnect() {
    let mut builder = ObjectBuilder::new();
    let ticked = builder.advertise_signal("ticked", "i").expect("signal");
    let object = builder.build();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut links = Vec::new();
    for tag in ["a", "b"] {
        let seen = Arc::clone(&seen);
        let link = object
            .connect(
                ticked,
                Arc::new(move |args: &[Value]| seen.lock().push((tag, args.to_vec()))),
            )
            .expect("connect");
        links.push(link);
    }
    assert_ne!(links[0], links[1]);

    // Arguments are converted to the signal signature.
    assert_eq!(object.post(ticked, &[Value::U8(3)]), Ok(2));
    assert_eq!(
        *seen.lock(),
        vec![("a", vec![Value::I32(3)]), ("b", vec![Value::I32(3)])]
    );

    assert!(object.disconnect(links[0]));
    assert!(!object.disconnect(links[0]));
    assert_eq!(object.subscriber_count(ticked), 1);
    assert_eq!(object.post(ticked, &[Value::I32(4)]), Ok(1));
    assert!(matches!(
        object.post(ticked, &[Value::String("x".into())]),
        Err(CallError::Conversion(_))
    ));
    assert_eq!(
        object.post(ticked + 50, &[]),
        Err(CallError::Unknown {
            what: "signal",
            id: ticked + 50
        })
    );
}

#[test]
fn test_property_change_notifies_subscribers() {
    let mut builder = ObjectBuilder::new();
    let volume = builder
        .advertise_property("volume", "i", Value::U8(3))
        .expect("property");
    let object = builder.build();
    assert_eq!(object.property(volume), Ok(Value::I32(3)));
    assert_eq!(object.property_names(), vec!["volume".to_owned()]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    object
        .connect_by_name("volume", Arc::new(move |args: &[Value]| sink.lock().extend_from_slice(args)))
        .expect("connect");

    object.set_property(volume, Value::I64(7)).expect("set");
    assert_eq!(object.property(volume), Ok(Value::I32(7)));
    assert_eq!(*seen.lock(), vec![Value::I32(7)]);

    assert!(object.set_property(volume, Value::String("loud".into())).is_err());
    assert_eq!(object.property(volume), Ok(Value::I32(7)));
}

#[test]
fn test_property_initial_value_must_convert() {
    let mut builder = ObjectBuilder::new();
    assert!(matches!(
        builder.advertise_property("name", "s", Value::I32(1)),
        Err(ObjectError::InvalidInitialValue { .. })
    ));
    assert!(matches!(
        builder.advertise_property("bad", "[i", Value::Void),
        Err(ObjectError::BadSignature(_))
    ));
}

#[test]
fn test_meta_object_value_round_trip() {
    let mut builder = ObjectBuilder::new();
    builder.set_description("calculator");
    let add = builder.advertise_fn("add", |a: i32, b: i32| a + b).expect("add");
    builder
        .advertise_fn("names", || vec!["a".to_owned()])
        .expect("names");
    builder.advertise_signal("overflowed", "(il)").expect("signal");
    builder
        .advertise_property("precision", "d", Value::F64(0.5))
        .expect("property");
    let object = builder.build();

    let meta = object.meta_object();
    let value = meta.to_value();
    let back = MetaObject::from_value(&value).expect("from_value");
    assert_eq!(&back, meta);
    assert_eq!(back.description(), "calculator");
    assert_eq!(back.method(add).map(|m| m.name.as_str()), Some("add"));
    assert_eq!(back.resolve("add", &args_signature(&[Value::I32(1), Value::I32(2)])), Ok(add));
}

#[test]
fn test_malformed_meta_object_rejected() {
    assert!(matches!(
        MetaObject::from_value(&Value::String("nope".into())),
        Err(ObjectError::MalformedMetaObject(_))
    ));
}

#[test]
fn test_threading_model_carried_to_object() {
    let mut builder = ObjectBuilder::new();
    builder.set_threading_model(ThreadingModel::MultiThread);
    assert_eq!(builder.build().threading_model(), ThreadingModel::MultiThread);
    assert_eq!(ObjectBuilder::default().build().threading_model(), ThreadingModel::SingleThread);
}
