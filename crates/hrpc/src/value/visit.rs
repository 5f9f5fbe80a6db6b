// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kind-dispatched traversal of a [`Value`].

use super::{ObjectRef, Value};

/// Integer seen by a visitor: width, signedness and bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntValue {
    pub bytes: u8,
    pub signed: bool,
    bits: u64,
}

impl IntValue {
    #[inline]
    fn signed(bytes: u8, v: i64) -> Self {
        Self {
            bytes,
            signed: true,
            bits: v as u64,
        }
    }

    #[inline]
    fn unsigned(bytes: u8, v: u64) -> Self {
        Self {
            bytes,
            signed: false,
            bits: v,
        }
    }

    /// Value as i128 (exact for every width and signedness).
    #[must_use]
    pub fn as_i128(&self) -> i128 {
        if self.signed {
            i128::from(self.bits as i64)
        } else {
            i128::from(self.bits)
        }
    }

    /// Little-endian bytes, truncated to the declared width.
    #[must_use]
    pub fn to_le_bytes(&self) -> ([u8; 8], usize) {
        (self.bits.to_le_bytes(), usize::from(self.bytes))
    }
}

/// Float seen by a visitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatValue {
    F32(f32),
    F64(f64),
}

/// One callback per value kind.
///
/// `Value::accept` dispatches to the matching callback. Containers pass
/// their children; the visitor decides whether and how to recurse.
pub trait ValueVisitor {
    type Output;

    fn visit_void(&mut self) -> Self::Output;
    fn visit_bool(&mut self, v: bool) -> Self::Output;
    fn visit_int(&mut self, v: IntValue) -> Self::Output;
    fn visit_float(&mut self, v: FloatValue) -> Self::Output;
    fn visit_string(&mut self, v: &str) -> Self::Output;
    fn visit_raw(&mut self, v: &[u8]) -> Self::Output;
    fn visit_list(&mut self, items: &[Value]) -> Self::Output;
    fn visit_map(&mut self, entries: &[(Value, Value)]) -> Self::Output;
    fn visit_tuple(&mut self, fields: &[Value]) -> Self::Output;
    fn visit_object(&mut self, object: ObjectRef) -> Self::Output;
    fn visit_pointer(&mut self, target: Option<&Value>) -> Self::Output;
    fn visit_dynamic(&mut self, inner: &Value) -> Self::Output;
}

impl Value {
    /// Dispatch to the visitor callback matching this value's kind.
    pub fn accept<V: ValueVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Value::Void => visitor.visit_void(),
            Value::Bool(v) => visitor.visit_bool(*v),
            Value::I8(v) => visitor.visit_int(IntValue::signed(1, i64::from(*v))),
            Value::U8(v) => visitor.visit_int(IntValue::unsigned(1, u64::from(*v))),
            Value::I16(v) => visitor.visit_int(IntValue::signed(2, i64::from(*v))),
            Value::U16(v) => visitor.visit_int(IntValue::unsigned(2, u64::from(*v))),
            Value::I32(v) => visitor.visit_int(IntValue::signed(4, i64::from(*v))),
            Value::U32(v) => visitor.visit_int(IntValue::unsigned(4, u64::from(*v))),
            Value::I64(v) => visitor.visit_int(IntValue::signed(8, *v)),
            Value::U64(v) => visitor.visit_int(IntValue::unsigned(8, *v)),
            Value::F32(v) => visitor.visit_float(FloatValue::F32(*v)),
            Value::F64(v) => visitor.visit_float(FloatValue::F64(*v)),
            Value::String(v) => visitor.visit_string(v),
            Value::Raw(v) => visitor.visit_raw(v),
            Value::List(items) => visitor.visit_list(items),
            Value::Map(entries) => visitor.visit_map(entries),
            Value::Tuple(fields) => visitor.visit_tuple(fields),
            Value::Object(object) => visitor.visit_object(*object),
            Value::Pointer(target) => visitor.visit_pointer(target.as_deref()),
            Value::Dynamic(inner) => visitor.visit_dynamic(inner),
        }
    }
}
