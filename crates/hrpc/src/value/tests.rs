// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::signature::{Element, Signature};
use crate::types::{type_for_signature, type_of, NativeType, Storage, TypeDescriptor, TypeKey};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Descriptor over `i32` storage that counts allocations and releases.
struct CountingDescriptor {
    key: TypeKey,
    signature: Signature,
    element: Element,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl CountingDescriptor {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            key: TypeKey::Named(Arc::from(name)),
            signature: Signature::from_element(Element::Int32),
            element: Element::Int32,
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
        })
    }

    fn live(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.destroyed.load(Ordering::SeqCst)
    }
}

impl TypeDescriptor for CountingDescriptor {
    fn key(&self) -> &TypeKey {
        &self.key
    }
    fn name(&self) -> &str {
        "counting"
    }
    fn signature(&self) -> &Signature {
        &self.signature
    }
    fn element(&self) -> &Element {
        &self.element
    }
    fn clone_storage(&self, storage: &dyn Any) -> Result<Storage, ConversionError> {
        let v = storage
            .downcast_ref::<i32>()
            .ok_or(ConversionError::Invalid)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(*v))
    }
    fn to_value(&self, storage: &dyn Any) -> Result<Value, ConversionError> {
        storage
            .downcast_ref::<i32>()
            .map(|v| Value::I32(*v))
            .ok_or(ConversionError::Invalid)
    }
    fn from_value(&self, value: Value) -> Result<Storage, ConversionError> {
        let v = <i32 as NativeType>::from_value(value)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(v))
    }
    fn destroy(&self, storage: Storage) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        drop(storage);
    }
}

#[test]
fn test_destroy_is_idempotent() {
    let desc = CountingDescriptor::new("counting.destroy");
    let dyn_desc: Arc<dyn TypeDescriptor> = desc.clone();

    let mut value = AnyValue::from_value(Value::I32(4), dyn_desc).expect("build");
    assert_eq!(desc.live(), 1);

    value.destroy();
    assert_eq!(desc.live(), 0);
    assert!(!value.is_valid());

    value.destroy();
    drop(value);
    assert_eq!(desc.created.load(Ordering::SeqCst), 1);
    assert_eq!(desc.destroyed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_clone_is_deep_and_owned() {
    let desc = CountingDescriptor::new("counting.clone");
    let dyn_desc: Arc<dyn TypeDescriptor> = desc.clone();

    let original = AnyValue::from_value(Value::I32(9), dyn_desc).expect("build");
    let copy = original.clone();
    assert_eq!(desc.live(), 2);
    assert_eq!(copy, original);

    drop(original);
    assert_eq!(desc.live(), 1);
    assert_eq!(copy.to_value(), Ok(Value::I32(9)));
    drop(copy);
    assert_eq!(desc.live(), 0);
}

#[test]
fn test_reference_never_destroys() {
    let desc = CountingDescriptor::new("counting.reference");
    let dyn_desc: Arc<dyn TypeDescriptor> = desc.clone();
    let owner = AnyValue::from_value(Value::I32(1), dyn_desc).expect("build");
    {
        let borrowed = owner.as_ref();
        let again = borrowed.clone();
        assert_eq!(again.to_value(), Ok(Value::I32(1)));
    }
    assert_eq!(desc.live(), 1);
    drop(owner);
    assert_eq!(desc.live(), 0);
}

#[test]
fn test_convert_same_type_borrows() {
    let value = AnyValue::from_native(42i32);
    let converted = value.convert(&type_of::<i32>()).expect("same type");
    assert!(!converted.did_allocate());
    assert_eq!(converted.as_ref().to_native::<i32>(), Ok(42));
}

#[test]
fn test_convert_widening_allocates() {
    let value = AnyValue::from_native(42i32);
    let converted = value.convert(&type_of::<i64>()).expect("widen");
    assert!(converted.did_allocate());
    let owned = converted.into_owned().expect("owned");
    assert_eq!(owned.downcast_ref::<i64>(), Some(&42));
}

#[test]
fn test_convert_overflow_reported() {
    let value = AnyValue::from_native(1000u32);
    let err = value.convert(&type_of::<u8>()).expect_err("overflow");
    assert!(matches!(err, ConversionError::Overflow { .. }));
}

#[test]
fn test_invalid_value_behaviour() {
    let value = AnyValue::default();
    assert!(!value.is_valid());
    assert!(value.signature().is_none());
    assert_eq!(value.to_value(), Err(ConversionError::Invalid));
    assert!(!value.clone().is_valid());
}

#[test]
fn test_native_extraction_converts() {
    let value = AnyValue::from_native(vec![1u8, 2, 3]);
    assert_eq!(value.to_native::<Vec<i64>>(), Ok(vec![1, 2, 3]));
    assert_eq!(value.into_native::<Vec<u8>>(), Ok(vec![1, 2, 3]));

    let value = AnyValue::from_native(7u16);
    assert_eq!(value.into_native::<i32>(), Ok(7));
}

#[test]
fn test_from_dynamic_uses_inferred_signature() {
    let value = AnyValue::from_dynamic(Value::List(vec![Value::I32(1), Value::from("a")]));
    assert_eq!(value.signature().map(|s| s.to_string()).as_deref(), Some("[m]"));
    assert_eq!(
        value.to_value(),
        Ok(Value::List(vec![
            Value::dynamic(Value::I32(1)),
            Value::dynamic("a".into())
        ]))
    );
}

#[test]
fn test_signature_descriptor_roundtrip() {
    let desc = type_for_signature(&Element::map(Element::String, Element::Int32));
    let value = AnyValue::from_value(
        Value::Map(vec![("a".into(), Value::I64(1)), ("b".into(), Value::U8(2))]),
        desc,
    )
    .expect("convertible");
    assert_eq!(
        value.to_native::<std::collections::BTreeMap<String, i32>>(),
        Ok([("a".to_owned(), 1), ("b".to_owned(), 2)].into_iter().collect())
    );
}

#[test]
fn test_signature_inference() {
    assert_eq!(Value::List(vec![]).signature().to_string(), "[m]");
    assert_eq!(
        Value::List(vec![Value::I32(1), Value::I32(2)]).signature().to_string(),
        "[i]"
    );
    assert_eq!(
        Value::Map(vec![("a".into(), Value::I32(1)), ("b".into(), Value::Bool(true))])
            .signature()
            .to_string(),
        "{sm}"
    );
    assert_eq!(Value::Pointer(None).signature().to_string(), "v*");
    assert_eq!(
        Value::Tuple(vec![Value::U8(1), Value::dynamic(Value::Void)])
            .signature()
            .to_string(),
        "(Cm)"
    );
}

#[test]
fn test_map_equality_ignores_order() {
    let a = Value::Map(vec![("x".into(), Value::I32(1)), ("y".into(), Value::I32(2))]);
    let b = Value::Map(vec![("y".into(), Value::I32(2)), ("x".into(), Value::I32(1))]);
    let c = Value::Map(vec![("y".into(), Value::I32(2)), ("x".into(), Value::I32(3))]);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.map_get(&"y".into()), Some(&Value::I32(2)));
}

#[test]
fn test_accessors_see_through_dynamic() {
    let v = Value::dynamic(Value::U32(5));
    assert_eq!(v.as_i64(), Some(5));
    assert_eq!(v.as_u64(), Some(5));
    assert_eq!(v.as_f64(), Some(5.0));
    assert_eq!(Value::I8(-1).as_u64(), None);
    assert_eq!(Value::U64(u64::MAX).as_i64(), None);
}
