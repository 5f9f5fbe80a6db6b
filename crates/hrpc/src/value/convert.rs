// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion of a [`Value`] to a target signature element.
//!
//! Rules:
//! - integers widen freely; narrowing and sign changes succeed when the
//!   value fits, otherwise `Overflow`
//! - int -> float always; float -> int only for finite integral values in range
//! - bool <-> numeric as 0/1
//! - string and raw only to themselves
//! - containers convert element-wise and fail as a whole
//! - anything -> dynamic wraps; dynamic -> anything unwraps then converts
//! - `T -> T*` wraps; a non-null `T* -> T` dereferences

use super::error::ConversionError;
use super::Value;
use crate::signature::{Element, TupleElement};

/// Numeric view used by the scalar rules.
#[derive(Clone, Copy)]
enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Bool(v) => Number::Int(i128::from(*v)),
            Value::I8(v) => Number::Int(i128::from(*v)),
            Value::U8(v) => Number::Int(i128::from(*v)),
            Value::I16(v) => Number::Int(i128::from(*v)),
            Value::U16(v) => Number::Int(i128::from(*v)),
            Value::I32(v) => Number::Int(i128::from(*v)),
            Value::U32(v) => Number::Int(i128::from(*v)),
            Value::I64(v) => Number::Int(i128::from(*v)),
            Value::U64(v) => Number::Int(i128::from(*v)),
            Value::F32(v) => Number::Float(f64::from(*v)),
            Value::F64(v) => Number::Float(*v),
            _ => return None,
        })
    }

    fn describe(self) -> String {
        match self {
            Number::Int(v) => v.to_string(),
            Number::Float(v) => v.to_string(),
        }
    }
}

/// True when `value` already has exactly the shape of `target`, so it can
/// be used without conversion.
#[must_use]
pub fn conforms(value: &Value, target: &Element) -> bool {
    match (target, value) {
        (Element::Void, Value::Void)
        | (Element::Bool, Value::Bool(_))
        | (Element::Int8, Value::I8(_))
        | (Element::UInt8, Value::U8(_))
        | (Element::Int16, Value::I16(_))
        | (Element::UInt16, Value::U16(_))
        | (Element::Int32, Value::I32(_))
        | (Element::UInt32, Value::U32(_))
        | (Element::Int64, Value::I64(_))
        | (Element::UInt64, Value::U64(_))
        | (Element::Float32, Value::F32(_))
        | (Element::Float64, Value::F64(_))
        | (Element::String, Value::String(_))
        | (Element::Raw, Value::Raw(_))
        | (Element::Object, Value::Object(_))
        | (Element::Dynamic, Value::Dynamic(_)) => true,
        (Element::List(inner), Value::List(items)) => items.iter().all(|v| conforms(v, inner)),
        (Element::Map(k, v), Value::Map(entries)) => entries
            .iter()
            .all(|(ek, ev)| conforms(ek, k) && conforms(ev, v)),
        (Element::Tuple(tuple), Value::Tuple(fields)) => {
            tuple.fields.len() == fields.len()
                && fields.iter().zip(&tuple.fields).all(|(v, e)| conforms(v, e))
        }
        (Element::Pointer(_), Value::Pointer(None)) => true,
        (Element::Pointer(inner), Value::Pointer(Some(target))) => conforms(target, inner),
        _ => false,
    }
}

/// Convert `value` to the shape of `target`.
pub fn convert(value: &Value, target: &Element) -> Result<Value, ConversionError> {
    if conforms(value, target) {
        return Ok(value.clone());
    }
    convert_slow(value, target)
}

fn convert_slow(value: &Value, target: &Element) -> Result<Value, ConversionError> {
    match (target, value) {
        (Element::Dynamic, Value::Dynamic(_)) => Ok(value.clone()),
        (Element::Dynamic, other) => Ok(Value::dynamic(other.clone())),
        (_, Value::Dynamic(inner)) => convert(inner, target),

        (Element::Pointer(inner), Value::Pointer(Some(v))) => {
            Ok(Value::pointer(convert(v, inner)?))
        }
        (Element::Pointer(_), Value::Pointer(None) | Value::Void) => Ok(Value::Pointer(None)),
        (Element::Pointer(inner), other) => Ok(Value::pointer(convert(other, inner)?)),
        (_, Value::Pointer(Some(v))) => convert(v, target),
        (_, Value::Pointer(None)) => Err(ConversionError::NullPointer {
            to: target.to_string(),
        }),

        (Element::Void, _) => Ok(Value::Void),

        (t, v) if t.is_numeric() => match Number::of(v) {
            Some(n) => number_to(n, t),
            None => Err(ConversionError::incompatible(v.kind_name(), t)),
        },

        (Element::List(inner), Value::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| convert(item, inner).map_err(|e| e.at(i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),

        (Element::Map(k, v), Value::Map(entries)) => entries
            .iter()
            .enumerate()
            .map(|(i, (ek, ev))| {
                Ok((
                    convert(ek, k).map_err(|e| e.at(i))?,
                    convert(ev, v).map_err(|e| e.at(i))?,
                ))
            })
            .collect::<Result<Vec<_>, ConversionError>>()
            .map(Value::Map),

        (Element::Tuple(tuple), Value::Tuple(fields)) => convert_tuple(fields, tuple),

        (t, v) => Err(ConversionError::incompatible(v.kind_name(), t)),
    }
}

fn convert_tuple(fields: &[Value], tuple: &TupleElement) -> Result<Value, ConversionError> {
    if fields.len() != tuple.fields.len() {
        return Err(ConversionError::ArityMismatch {
            expected: tuple.fields.len(),
            found: fields.len(),
        });
    }
    fields
        .iter()
        .zip(&tuple.fields)
        .enumerate()
        .map(|(i, (v, e))| convert(v, e).map_err(|err| err.at(i)))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Tuple)
}

fn number_to(n: Number, target: &Element) -> Result<Value, ConversionError> {
    match target {
        Element::Bool => Ok(Value::Bool(match n {
            Number::Int(v) => v != 0,
            Number::Float(v) => v != 0.0,
        })),
        Element::Float32 => Ok(Value::F32(match n {
            Number::Int(v) => v as f32,
            Number::Float(v) => v as f32,
        })),
        Element::Float64 => Ok(Value::F64(match n {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        })),
        _ => {
            let int = match n {
                Number::Int(v) => v,
                Number::Float(v) => float_to_int(v, target)?,
            };
            int_to(int, target)
        }
    }
}

fn float_to_int(v: f64, target: &Element) -> Result<i128, ConversionError> {
    if !v.is_finite() || v.fract() != 0.0 {
        return Err(ConversionError::Lossy {
            value: v.to_string(),
            to: target.to_string(),
        });
    }
    // |v| beyond 2^64 overflows every integer target.
    if v.abs() > 1.9e19 {
        return Err(ConversionError::Overflow {
            value: v.to_string(),
            to: target.to_string(),
        });
    }
    Ok(v as i128)
}

fn int_to(v: i128, target: &Element) -> Result<Value, ConversionError> {
    let overflow = || ConversionError::Overflow {
        value: Number::Int(v).describe(),
        to: target.to_string(),
    };
    Ok(match target {
        Element::Int8 => Value::I8(i8::try_from(v).map_err(|_| overflow())?),
        Element::UInt8 => Value::U8(u8::try_from(v).map_err(|_| overflow())?),
        Element::Int16 => Value::I16(i16::try_from(v).map_err(|_| overflow())?),
        Element::UInt16 => Value::U16(u16::try_from(v).map_err(|_| overflow())?),
        Element::Int32 => Value::I32(i32::try_from(v).map_err(|_| overflow())?),
        Element::UInt32 => Value::U32(u32::try_from(v).map_err(|_| overflow())?),
        Element::Int64 => Value::I64(i64::try_from(v).map_err(|_| overflow())?),
        Element::UInt64 => Value::U64(u64::try_from(v).map_err(|_| overflow())?),
        other => return Err(ConversionError::incompatible("integer", other)),
    })
}
