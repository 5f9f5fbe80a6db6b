// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bindings between native Rust types and the dynamic value model.

use crate::signature::Element;
use crate::value::{convert, ConversionError, ObjectRef, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// A Rust type with a fixed signature.
///
/// `from_value` is lenient: it applies the value conversion rules, so an
/// `i64` parameter accepts an `I8` value and a `Vec<i32>` accepts `[l]`
/// items that fit.
pub trait NativeType: Clone + Send + Sync + 'static {
    /// Signature element of the type.
    fn element() -> Element;

    /// Reify into a value tree.
    fn to_value(&self) -> Value;

    /// Build from a value tree.
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

/// Opaque byte run (`r`), distinct from `Vec<u8>` (`[C]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Raw(pub Vec<u8>);

macro_rules! impl_native_scalar {
    ($($ty:ty => $variant:ident / $element:ident),* $(,)?) => {
        $(
            impl NativeType for $ty {
                fn element() -> Element {
                    Element::$element
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => match convert(&other, &Element::$element)? {
                            Value::$variant(v) => Ok(v),
                            converted => Err(ConversionError::incompatible(
                                converted.kind_name(),
                                Element::$element,
                            )),
                        },
                    }
                }
            }
        )*
    };
}

impl_native_scalar! {
    bool => Bool / Bool,
    i8 => I8 / Int8,
    u8 => U8 / UInt8,
    i16 => I16 / Int16,
    u16 => U16 / UInt16,
    i32 => I32 / Int32,
    u32 => U32 / UInt32,
    i64 => I64 / Int64,
    u64 => U64 / UInt64,
    f32 => F32 / Float32,
    f64 => F64 / Float64,
    ObjectRef => Object / Object,
}

impl NativeType for () {
    fn element() -> Element {
        Element::Void
    }

    fn to_value(&self) -> Value {
        Value::Void
    }

    fn from_value(_value: Value) -> Result<Self, ConversionError> {
        Ok(())
    }
}

impl NativeType for String {
    fn element() -> Element {
        Element::String
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.into_unwrapped() {
            Value::String(s) => Ok(s),
            Value::Pointer(Some(target)) => Self::from_value(*target),
            other => Err(ConversionError::incompatible(other.kind_name(), "s")),
        }
    }
}

impl NativeType for Raw {
    fn element() -> Element {
        Element::Raw
    }

    fn to_value(&self) -> Value {
        Value::Raw(self.0.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.into_unwrapped() {
            Value::Raw(bytes) => Ok(Raw(bytes)),
            Value::Pointer(Some(target)) => Self::from_value(*target),
            other => Err(ConversionError::incompatible(other.kind_name(), "r")),
        }
    }
}

/// `Value` itself binds to the dynamic element `m`.
impl NativeType for Value {
    fn element() -> Element {
        Element::Dynamic
    }

    fn to_value(&self) -> Value {
        match self {
            Value::Dynamic(_) => self.clone(),
            other => Value::dynamic(other.clone()),
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value.into_unwrapped())
    }
}

impl<T: NativeType> NativeType for Vec<T> {
    fn element() -> Element {
        Element::list(T::element())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(T::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.into_unwrapped() {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|e| e.at(i)))
                .collect(),
            Value::Pointer(Some(target)) => Self::from_value(*target),
            other => Err(ConversionError::incompatible(
                other.kind_name(),
                Self::element(),
            )),
        }
    }
}

impl<T: NativeType> NativeType for Option<T> {
    fn element() -> Element {
        Element::pointer(T::element())
    }

    fn to_value(&self) -> Value {
        Value::Pointer(self.as_ref().map(|v| Box::new(v.to_value())))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.into_unwrapped() {
            Value::Pointer(None) | Value::Void => Ok(None),
            Value::Pointer(Some(target)) => T::from_value(*target).map(Some),
            other => T::from_value(other).map(Some),
        }
    }
}

fn map_entries<K: NativeType, V: NativeType>(
    value: Value,
    target: fn() -> Element,
) -> Result<Vec<(K, V)>, ConversionError> {
    match value.into_unwrapped() {
        Value::Map(entries) => entries
            .into_iter()
            .enumerate()
            .map(|(i, (k, v))| {
                Ok((
                    K::from_value(k).map_err(|e| e.at(i))?,
                    V::from_value(v).map_err(|e| e.at(i))?,
                ))
            })
            .collect(),
        Value::Pointer(Some(inner)) => map_entries(*inner, target),
        other => Err(ConversionError::incompatible(other.kind_name(), target())),
    }
}

impl<K, V> NativeType for HashMap<K, V>
where
    K: NativeType + Eq + Hash,
    V: NativeType,
{
    fn element() -> Element {
        Element::map(K::element(), V::element())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        map_entries(value, Self::element).map(|entries| entries.into_iter().collect())
    }
}

impl<K, V> NativeType for BTreeMap<K, V>
where
    K: NativeType + Ord,
    V: NativeType,
{
    fn element() -> Element {
        Element::map(K::element(), V::element())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        map_entries(value, Self::element).map(|entries| entries.into_iter().collect())
    }
}

fn tuple_fields<const N: usize>(value: Value) -> Result<[Value; N], ConversionError> {
    match value.into_unwrapped() {
        Value::Tuple(fields) => {
            fields
                .try_into()
                .map_err(|fields: Vec<Value>| ConversionError::ArityMismatch {
                    expected: N,
                    found: fields.len(),
                })
        }
        Value::Pointer(Some(inner)) => tuple_fields(*inner),
        other => Err(ConversionError::incompatible(other.kind_name(), "tuple")),
    }
}

macro_rules! impl_native_tuple {
    ($len:literal => $($name:ident . $idx:tt),+) => {
        impl<$($name: NativeType),+> NativeType for ($($name,)+) {
            fn element() -> Element {
                Element::tuple(vec![$($name::element()),+])
            }

            fn to_value(&self) -> Value {
                Value::Tuple(vec![$(self.$idx.to_value()),+])
            }

            #[allow(non_snake_case)]
            fn from_value(value: Value) -> Result<Self, ConversionError> {
                let [$($name),+] = tuple_fields::<$len>(value)?;
                Ok(($($name::from_value($name).map_err(|e| e.at($idx))?,)+))
            }
        }
    };
}

impl_native_tuple!(1 => A.0);
impl_native_tuple!(2 => A.0, B.1);
impl_native_tuple!(3 => A.0, B.1, C.2);
impl_native_tuple!(4 => A.0, B.1, C.2, D.3);
impl_native_tuple!(5 => A.0, B.1, C.2, D.3, E.4);
impl_native_tuple!(6 => A.0, B.1, C.2, D.3, E.4, F.5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_from_value_converts() {
        assert_eq!(i64::from_value(Value::I8(-2)), Ok(-2));
        assert_eq!(u8::from_value(Value::dynamic(Value::I32(7))), Ok(7));
        assert!(u8::from_value(Value::I32(700)).is_err());
        assert_eq!(f64::from_value(Value::U16(3)), Ok(3.0));
        assert_eq!(bool::from_value(Value::I32(0)), Ok(false));
    }

    #[test]
    fn test_elements() {
        assert_eq!(<Vec<String>>::element().to_string(), "[s]");
        assert_eq!(<HashMap<String, i32>>::element().to_string(), "{si}");
        assert_eq!(<(i32, Vec<String>, bool)>::element().to_string(), "(i[s]b)");
        assert_eq!(<Option<u64>>::element().to_string(), "L*");
        assert_eq!(Value::element().to_string(), "m");
        assert_eq!(Raw::element().to_string(), "r");
        assert_eq!(<()>::element().to_string(), "v");
    }

    #[test]
    fn test_tuple_roundtrip_and_arity() {
        let native = (5i32, String::from("x"), vec![1u8, 2]);
        let value = native.to_value();
        assert_eq!(<(i32, String, Vec<u8>)>::from_value(value), Ok(native));

        let err = <(i32, i32)>::from_value(Value::Tuple(vec![Value::I32(1)]))
            .expect_err("arity mismatch");
        assert_eq!(err, ConversionError::ArityMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_nested_error_index() {
        let value = Value::List(vec![Value::I32(1), Value::from("no")]);
        let err = <Vec<i32>>::from_value(value).expect_err("string item");
        assert!(matches!(err, ConversionError::Element { index: 1, .. }));
    }

    #[test]
    fn test_option_maps_to_pointer() {
        assert_eq!(<Option<i32>>::from_value(Value::Pointer(None)), Ok(None));
        assert_eq!(<Option<i32>>::from_value(Value::I16(4)), Ok(Some(4)));
        assert_eq!(Some(3i32).to_value(), Value::pointer(Value::I32(3)));
    }

    #[test]
    fn test_value_binds_to_dynamic() {
        let v = Value::from("hi");
        assert_eq!(v.to_value(), Value::dynamic("hi".into()));
        assert_eq!(Value::from_value(Value::dynamic("hi".into())), Ok(v));
    }

    #[test]
    fn test_btreemap_from_map() {
        let value = Value::Map(vec![("b".into(), Value::I8(2)), ("a".into(), Value::I8(1))]);
        let map = <BTreeMap<String, i64>>::from_value(value).expect("map");
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
