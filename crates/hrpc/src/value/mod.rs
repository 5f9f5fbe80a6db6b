// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values.
//!
//! [`Value`] is the kind-tagged tree every typed value can be reified into.
//! The codec, conversion and printing all work on it. [`AnyValue`] and
//! [`AnyReference`] pair raw storage with a type descriptor: the first owns
//! its storage, the second borrows it.
//!
//! # Example
//!
//! ```
//! use hrpc::value::{AnyValue, Value};
//! use hrpc::signature::Element;
//!
//! let v = Value::List(vec![Value::I32(1), Value::I32(2)]);
//! assert_eq!(v.signature(), Element::list(Element::Int32));
//!
//! let any = AnyValue::from_native(vec![1i32, 2]);
//! assert_eq!(any.to_value().unwrap(), v);
//! ```

mod any;
mod convert;
mod display;
mod error;
mod visit;

#[cfg(test)]
mod tests;

pub use any::{AnyReference, AnyValue, Converted};
pub use convert::{conforms, convert};
pub use error::ConversionError;
pub use visit::{FloatValue, IntValue, ValueVisitor};

use crate::signature::Element;

/// Address of a remote object: service id and object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectRef {
    pub service: u32,
    pub object: u32,
}

impl ObjectRef {
    #[must_use]
    pub fn new(service: u32, object: u32) -> Self {
        Self { service, object }
    }
}

/// A dynamic value of any signature.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Void,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Raw(Vec<u8>),
    List(Vec<Value>),
    /// Entries in insertion order; equality ignores order.
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    Object(ObjectRef),
    Pointer(Option<Box<Value>>),
    Dynamic(Box<Value>),
}

impl Value {
    /// Wrap a value as dynamic (`m`).
    #[must_use]
    pub fn dynamic(inner: Value) -> Self {
        Value::Dynamic(Box::new(inner))
    }

    /// Pointer to `inner`.
    #[must_use]
    pub fn pointer(inner: Value) -> Self {
        Value::Pointer(Some(Box::new(inner)))
    }

    /// Inferred signature element.
    ///
    /// Homogeneous lists and maps take their items' signature. Empty or
    /// mixed containers infer dynamic items (`[m]`, `{mm}`).
    #[must_use]
    pub fn signature(&self) -> Element {
        match self {
            Value::Void => Element::Void,
            Value::Bool(_) => Element::Bool,
            Value::I8(_) => Element::Int8,
            Value::U8(_) => Element::UInt8,
            Value::I16(_) => Element::Int16,
            Value::U16(_) => Element::UInt16,
            Value::I32(_) => Element::Int32,
            Value::U32(_) => Element::UInt32,
            Value::I64(_) => Element::Int64,
            Value::U64(_) => Element::UInt64,
            Value::F32(_) => Element::Float32,
            Value::F64(_) => Element::Float64,
            Value::String(_) => Element::String,
            Value::Raw(_) => Element::Raw,
            Value::Object(_) => Element::Object,
            Value::Dynamic(_) => Element::Dynamic,
            Value::List(items) => Element::list(common_signature(items.iter())),
            Value::Map(entries) => Element::map(
                common_signature(entries.iter().map(|(k, _)| k)),
                common_signature(entries.iter().map(|(_, v)| v)),
            ),
            Value::Tuple(fields) => Element::tuple(fields.iter().map(Value::signature).collect()),
            Value::Pointer(Some(target)) => Element::pointer(target.signature()),
            Value::Pointer(None) => Element::pointer(Element::Void),
        }
    }

    /// Short kind name for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::I8(_) => "int8",
            Value::U8(_) => "uint8",
            Value::I16(_) => "int16",
            Value::U16(_) => "uint16",
            Value::I32(_) => "int32",
            Value::U32(_) => "uint32",
            Value::I64(_) => "int64",
            Value::U64(_) => "uint64",
            Value::F32(_) => "float32",
            Value::F64(_) => "float64",
            Value::String(_) => "string",
            Value::Raw(_) => "raw",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Tuple(_) => "tuple",
            Value::Object(_) => "object",
            Value::Pointer(_) => "pointer",
            Value::Dynamic(_) => "dynamic",
        }
    }

    /// Strip `Dynamic` wrappers.
    #[must_use]
    pub fn unwrap_dynamic(&self) -> &Value {
        let mut current = self;
        while let Value::Dynamic(inner) = current {
            current = inner;
        }
        current
    }

    /// Strip `Dynamic` wrappers, by value.
    #[must_use]
    pub fn into_unwrapped(self) -> Value {
        let mut current = self;
        while let Value::Dynamic(inner) = current {
            current = *inner;
        }
        current
    }

    #[inline]
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self.unwrap_dynamic() {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer kind widened to i64, when it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self.unwrap_dynamic() {
            Value::I8(v) => Some(i64::from(*v)),
            Value::U8(v) => Some(i64::from(*v)),
            Value::I16(v) => Some(i64::from(*v)),
            Value::U16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::U32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Any non-negative integer kind widened to u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self.unwrap_dynamic() {
            Value::U64(v) => Some(*v),
            other => other.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    /// Any numeric kind as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self.unwrap_dynamic() {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            Value::U64(v) => Some(*v as f64),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self.unwrap_dynamic() {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as byte run.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self.unwrap_dynamic() {
            Value::Raw(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get list items.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self.unwrap_dynamic() {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get map entries.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self.unwrap_dynamic() {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get tuple fields.
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self.unwrap_dynamic() {
            Value::Tuple(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as object reference.
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self.unwrap_dynamic() {
            Value::Object(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a map entry by key.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Signature shared by every item, or `m` when empty or mixed.
fn common_signature<'a>(mut items: impl Iterator<Item = &'a Value>) -> Element {
    let Some(first) = items.next() else {
        return Element::Dynamic;
    };
    let sig = first.signature();
    for item in items {
        if item.signature() != sig {
            return Element::Dynamic;
        }
    }
    sig
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Raw(a), Value::Raw(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => maps_equal(a, b),
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Pointer(a), Value::Pointer(b)) => a == b,
            (Value::Dynamic(a), Value::Dynamic(b)) => a == b,
            _ => false,
        }
    }
}

/// Multiset comparison of map entries.
fn maps_equal(a: &[(Value, Value)], b: &[(Value, Value)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for entry in a {
        for (idx, candidate) in b.iter().enumerate() {
            if !used[idx] && candidate == entry {
                used[idx] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

// =======================================================================
// From conversions
// =======================================================================

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    ObjectRef => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Void
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Pointer(v.map(|inner| Box::new(inner.into())))
    }
}
