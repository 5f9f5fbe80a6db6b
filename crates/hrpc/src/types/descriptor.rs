// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in descriptor implementations.

use super::native::NativeType;
use super::{Storage, TypeDescriptor, TypeKey};
use crate::signature::{Element, Signature};
use crate::value::{convert, ConversionError, Value};
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Descriptor of a native Rust type; storage is a `T`.
pub struct NativeDescriptor<T> {
    key: TypeKey,
    element: Element,
    signature: Signature,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NativeType> NativeDescriptor<T> {
    /// Create a new descriptor for `T`.
    #[must_use]
    pub fn new() -> Self {
        let element = T::element();
        Self {
            key: TypeKey::Native(TypeId::of::<T>()),
            signature: Signature::from_element(element.clone()),
            element,
            _marker: PhantomData,
        }
    }

    fn downcast<'s>(&self, storage: &'s dyn Any) -> Result<&'s T, ConversionError> {
        storage
            .downcast_ref::<T>()
            .ok_or_else(|| ConversionError::StorageMismatch {
                type_name: std::any::type_name::<T>().to_owned(),
            })
    }
}

impl<T: NativeType> Default for NativeDescriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NativeType> TypeDescriptor for NativeDescriptor<T> {
    fn key(&self) -> &TypeKey {
        &self.key
    }

    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn element(&self) -> &Element {
        &self.element
    }

    fn clone_storage(&self, storage: &dyn Any) -> Result<Storage, ConversionError> {
        Ok(Box::new(self.downcast(storage)?.clone()))
    }

    fn to_value(&self, storage: &dyn Any) -> Result<Value, ConversionError> {
        self.downcast(storage).map(T::to_value)
    }

    fn from_value(&self, value: Value) -> Result<Storage, ConversionError> {
        Ok(Box::new(T::from_value(value)?))
    }
}

/// Descriptor of a type known only by signature (optionally named).
///
/// Storage is a [`Value`] that conforms to the signature.
pub struct DynamicDescriptor {
    key: TypeKey,
    name: String,
    element: Element,
    signature: Signature,
}

impl DynamicDescriptor {
    /// Anonymous descriptor keyed by its signature.
    #[must_use]
    pub fn for_element(element: Element) -> Self {
        Self {
            key: TypeKey::Signature(element.clone()),
            name: element.to_string(),
            signature: Signature::from_element(element.clone()),
            element,
        }
    }

    /// Named descriptor (e.g. a struct type declared by a peer).
    #[must_use]
    pub fn named(name: &str, element: Element) -> Self {
        Self {
            key: TypeKey::Named(Arc::from(name)),
            name: name.to_owned(),
            signature: Signature::from_element(element.clone()),
            element,
        }
    }

    fn downcast<'s>(&self, storage: &'s dyn Any) -> Result<&'s Value, ConversionError> {
        storage
            .downcast_ref::<Value>()
            .ok_or_else(|| ConversionError::StorageMismatch {
                type_name: self.name.clone(),
            })
    }
}

impl TypeDescriptor for DynamicDescriptor {
    fn key(&self) -> &TypeKey {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn element(&self) -> &Element {
        &self.element
    }

    fn clone_storage(&self, storage: &dyn Any) -> Result<Storage, ConversionError> {
        Ok(Box::new(self.downcast(storage)?.clone()))
    }

    fn to_value(&self, storage: &dyn Any) -> Result<Value, ConversionError> {
        self.downcast(storage).cloned()
    }

    fn from_value(&self, value: Value) -> Result<Storage, ConversionError> {
        Ok(Box::new(convert(&value, &self.element)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    #[test]
    fn test_native_descriptor_roundtrip() {
        let desc = NativeDescriptor::<Vec<i32>>::new();
        let storage = desc
            .from_value(Value::List(vec![Value::I8(1), Value::I64(2)]))
            .expect("convertible");
        assert_eq!(storage.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2]));
        assert_eq!(
            desc.to_value(storage.as_ref()).expect("reify"),
            Value::List(vec![Value::I32(1), Value::I32(2)])
        );
        assert!(matches!(desc.kind(), TypeKind::List { element: Element::Int32 }));
    }

    #[test]
    fn test_storage_mismatch_detected() {
        let desc = NativeDescriptor::<u32>::new();
        let foreign: Storage = Box::new(String::from("x"));
        assert!(matches!(
            desc.to_value(foreign.as_ref()),
            Err(ConversionError::StorageMismatch { .. })
        ));
    }

    #[test]
    fn test_dynamic_descriptor_conforms_storage() {
        let desc = DynamicDescriptor::named(
            "Point",
            Element::tuple(vec![Element::Float64, Element::Float64]),
        );
        let storage = desc
            .from_value(Value::Tuple(vec![Value::I32(1), Value::F32(2.0)]))
            .expect("convertible");
        assert_eq!(
            desc.to_value(storage.as_ref()).expect("reify"),
            Value::Tuple(vec![Value::F64(1.0), Value::F64(2.0)])
        );
        assert_eq!(desc.name(), "Point");
        assert_eq!(desc.key(), &TypeKey::Named(Arc::from("Point")));
    }
}
