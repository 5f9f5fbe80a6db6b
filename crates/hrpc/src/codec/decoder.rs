// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signature-driven value decoder.

use super::cursor::Cursor;
use super::CodecError;
use crate::config::Limits;
use crate::signature::{Element, Signature};
use crate::value::{ObjectRef, Value};

pub(crate) struct Decoder<'a> {
    cursor: Cursor<'a>,
    limits: Limits,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(bytes: &'a [u8], limits: Limits) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            limits,
        }
    }

    /// Fail unless every byte was consumed.
    pub(crate) fn finish(&self) -> Result<(), CodecError> {
        match self.cursor.remaining() {
            0 => Ok(()),
            count => Err(CodecError::TrailingBytes {
                offset: self.cursor.offset(),
                count,
            }),
        }
    }

    pub(crate) fn read_value(&mut self, element: &Element, depth: usize) -> Result<Value, CodecError> {
        if depth > self.limits.max_depth {
            return Err(CodecError::DepthExceeded {
                max: self.limits.max_depth,
            });
        }
        let c = &mut self.cursor;
        let value = match element {
            Element::Void => Value::Void,
            Element::Bool => Value::Bool(c.read_u8()? != 0),
            Element::Int8 => Value::I8(c.read_i8()?),
            Element::UInt8 => Value::U8(c.read_u8()?),
            Element::Int16 => Value::I16(c.read_i16()?),
            Element::UInt16 => Value::U16(c.read_u16()?),
            Element::Int32 => Value::I32(c.read_i32()?),
            Element::UInt32 => Value::U32(c.read_u32()?),
            Element::Int64 => Value::I64(c.read_i64()?),
            Element::UInt64 => Value::U64(c.read_u64()?),
            Element::Float32 => Value::F32(c.read_f32()?),
            Element::Float64 => Value::F64(c.read_f64()?),
            Element::String => Value::String(c.read_str()?.to_owned()),
            Element::Raw => Value::Raw(c.read_sized()?.to_vec()),
            Element::Object => {
                let service = c.read_u32()?;
                let object = c.read_u32()?;
                Value::Object(ObjectRef { service, object })
            }
            Element::List(inner) => {
                let count = self.read_count(min_encoded_size(inner))?;
                let mut items = Vec::with_capacity(count.min(self.cursor.remaining()));
                for _ in 0..count {
                    items.push(self.read_value(inner, depth + 1)?);
                }
                Value::List(items)
            }
            Element::Map(key, val) => {
                let count = self.read_count(min_encoded_size(key) + min_encoded_size(val))?;
                let mut entries = Vec::with_capacity(count.min(self.cursor.remaining()));
                for _ in 0..count {
                    let k = self.read_value(key, depth + 1)?;
                    let v = self.read_value(val, depth + 1)?;
                    entries.push((k, v));
                }
                Value::Map(entries)
            }
            Element::Tuple(tuple) => {
                let mut fields = Vec::with_capacity(tuple.fields.len());
                for field in &tuple.fields {
                    fields.push(self.read_value(field, depth + 1)?);
                }
                Value::Tuple(fields)
            }
            Element::Pointer(inner) => {
                let offset = c.offset();
                match c.read_u8()? {
                    0 => Value::Pointer(None),
                    1 => Value::pointer(self.read_value(inner, depth + 1)?),
                    byte => return Err(CodecError::InvalidPresence { offset, byte }),
                }
            }
            Element::Dynamic => {
                let element = self.read_signature()?;
                Value::dynamic(self.read_value(&element, depth + 1)?)
            }
        };
        Ok(value)
    }

    /// Signature string of a dynamic value; must hold exactly one element.
    fn read_signature(&mut self) -> Result<Element, CodecError> {
        let offset = self.cursor.offset();
        let text = self.cursor.read_str()?;
        let unknown = || CodecError::UnknownKind {
            offset,
            signature: text.to_owned(),
        };
        Signature::parse(text)
            .map_err(|_| unknown())?
            .into_elements()
            .into_iter()
            .try_fold(None, |acc: Option<Element>, e| match acc {
                None => Ok(Some(e)),
                Some(_) => Err(unknown()),
            })?
            .ok_or_else(unknown)
    }

    /// List/map count, checked against the cap and the bytes left.
    fn read_count(&mut self, min_item_size: usize) -> Result<usize, CodecError> {
        let offset = self.cursor.offset();
        let count = self.cursor.read_u32()? as usize;
        let by_bytes = match min_item_size {
            0 => usize::MAX,
            size => self.cursor.remaining() / size,
        };
        let max = self.limits.max_element_count.min(by_bytes);
        if count > max {
            return Err(CodecError::UnexpectedElementCount { offset, count, max });
        }
        Ok(count)
    }
}

/// Smallest number of bytes any value of `element` occupies.
fn min_encoded_size(element: &Element) -> usize {
    match element {
        Element::Void => 0,
        Element::Bool | Element::Int8 | Element::UInt8 | Element::Pointer(_) => 1,
        Element::Int16 | Element::UInt16 => 2,
        Element::Int32
        | Element::UInt32
        | Element::Float32
        | Element::String
        | Element::Raw
        | Element::List(_)
        | Element::Map(..)
        | Element::Dynamic => 4,
        Element::Int64 | Element::UInt64 | Element::Float64 | Element::Object => 8,
        Element::Tuple(tuple) => tuple.fields.iter().map(min_encoded_size).sum(),
    }
}
