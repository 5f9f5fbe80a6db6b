// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signature-driven value encoder.
//!
//! The encoder is a [`ValueVisitor`]: each value is dispatched through
//! [`Value::accept`] while the encoder holds the element it must be written
//! as. Values are expected to conform already (see [`convert`]); a value
//! whose kind does not match its element is reported, never guessed at.

use super::cursor::WriteLe;
use super::CodecError;
use crate::signature::Element;
use crate::value::{
    conforms, convert, ConversionError, FloatValue, IntValue, ObjectRef, Value, ValueVisitor,
};
use std::borrow::Cow;

static ROOT: Element = Element::Void;

pub(crate) struct Encoder<'a, 'e> {
    out: &'a mut Vec<u8>,
    /// Element the value being visited is written as.
    target: &'e Element,
    /// Kind of that value, for mismatch errors.
    kind: &'static str,
}

impl<'a, 'e> Encoder<'a, 'e> {
    pub(crate) fn new(out: &'a mut Vec<u8>) -> Self {
        Self {
            out,
            target: &ROOT,
            kind: "void",
        }
    }

    pub(crate) fn write(&mut self, value: &Value, element: &'e Element) -> Result<(), CodecError> {
        // Void occupies no bytes whatever the value.
        if matches!(element, Element::Void) {
            return Ok(());
        }
        let saved = (self.target, self.kind);
        self.target = element;
        self.kind = value.kind_name();
        let result = value.accept(self);
        (self.target, self.kind) = saved;
        result
    }

    /// Signature string of the value's inferred type, then the value in it.
    fn write_dynamic(&mut self, value: &Value) -> Result<(), CodecError> {
        let element = value.signature();
        self.out.put_sized(element.to_string().as_bytes());
        let value = if conforms(value, &element) {
            Cow::Borrowed(value)
        } else {
            Cow::Owned(convert(value, &element)?)
        };
        Encoder::new(&mut *self.out).write(&value, &element)
    }

    fn write_count(&mut self, count: usize) {
        self.out.put_u32(count as u32);
    }

    fn mismatch(&self) -> Result<(), CodecError> {
        Err(ConversionError::incompatible(self.kind, self.target).into())
    }
}

impl<'e> ValueVisitor for Encoder<'_, 'e> {
    type Output = Result<(), CodecError>;

    fn visit_void(&mut self) -> Self::Output {
        self.mismatch()
    }

    fn visit_bool(&mut self, v: bool) -> Self::Output {
        if !matches!(self.target, Element::Bool) {
            return self.mismatch();
        }
        self.out.put_u8(u8::from(v));
        Ok(())
    }

    fn visit_int(&mut self, v: IntValue) -> Self::Output {
        if self.target.int_info() != Some((v.bytes, v.signed)) {
            return self.mismatch();
        }
        let (bytes, width) = v.to_le_bytes();
        self.out.extend_from_slice(&bytes[..width]);
        Ok(())
    }

    fn visit_float(&mut self, v: FloatValue) -> Self::Output {
        match (self.target, v) {
            (Element::Float32, FloatValue::F32(f)) => self.out.extend_from_slice(&f.to_le_bytes()),
            (Element::Float64, FloatValue::F64(f)) => self.out.extend_from_slice(&f.to_le_bytes()),
            _ => return self.mismatch(),
        }
        Ok(())
    }

    fn visit_string(&mut self, v: &str) -> Self::Output {
        if !matches!(self.target, Element::String) {
            return self.mismatch();
        }
        self.out.put_sized(v.as_bytes());
        Ok(())
    }

    fn visit_raw(&mut self, v: &[u8]) -> Self::Output {
        if !matches!(self.target, Element::Raw) {
            return self.mismatch();
        }
        self.out.put_sized(v);
        Ok(())
    }

    fn visit_list(&mut self, items: &[Value]) -> Self::Output {
        let target = self.target;
        let Element::List(inner) = target else {
            return self.mismatch();
        };
        self.write_count(items.len());
        for item in items {
            self.write(item, inner)?;
        }
        Ok(())
    }

    fn visit_map(&mut self, entries: &[(Value, Value)]) -> Self::Output {
        let target = self.target;
        let Element::Map(key, val) = target else {
            return self.mismatch();
        };
        self.write_count(entries.len());
        for (k, v) in entries {
            self.write(k, key)?;
            self.write(v, val)?;
        }
        Ok(())
    }

    fn visit_tuple(&mut self, fields: &[Value]) -> Self::Output {
        let target = self.target;
        match target {
            Element::Tuple(tuple) if tuple.fields.len() == fields.len() => {
                for (field, element) in fields.iter().zip(&tuple.fields) {
                    self.write(field, element)?;
                }
                Ok(())
            }
            _ => self.mismatch(),
        }
    }

    fn visit_object(&mut self, object: ObjectRef) -> Self::Output {
        if !matches!(self.target, Element::Object) {
            return self.mismatch();
        }
        self.out.put_u32(object.service);
        self.out.put_u32(object.object);
        Ok(())
    }

    fn visit_pointer(&mut self, pointee: Option<&Value>) -> Self::Output {
        let target = self.target;
        let Element::Pointer(inner) = target else {
            return self.mismatch();
        };
        match pointee {
            None => self.out.put_u8(0),
            Some(value) => {
                self.out.put_u8(1);
                self.write(value, inner)?;
            }
        }
        Ok(())
    }

    fn visit_dynamic(&mut self, inner: &Value) -> Self::Output {
        if !matches!(self.target, Element::Dynamic) {
            return self.mismatch();
        }
        self.write_dynamic(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_written_at_element_width() {
        let element = Element::list(Element::Int16);
        let value = Value::List(vec![Value::I16(-2), Value::I16(258)]);
        let mut out = Vec::new();
        Encoder::new(&mut out).write(&value, &element).expect("encode");
        assert_eq!(out, [2, 0, 0, 0, 0xfe, 0xff, 0x02, 0x01]);
    }

    #[test]
    fn test_mismatch_reports_innermost_value() {
        let element = Element::tuple(vec![Element::Int32, Element::String]);
        let value = Value::Tuple(vec![Value::I32(1), Value::U32(2)]);
        let mut out = Vec::new();
        let err = Encoder::new(&mut out)
            .write(&value, &element)
            .expect_err("uint32 is not a string");
        assert_eq!(
            err,
            CodecError::Conversion(ConversionError::Incompatible {
                from: "uint32".into(),
                to: "s".into(),
            })
        );
    }

    #[test]
    fn test_void_element_ignores_value() {
        let mut out = Vec::new();
        Encoder::new(&mut out)
            .write(&Value::String("dropped".into()), &Element::Void)
            .expect("void");
        assert!(out.is_empty());
    }
}
