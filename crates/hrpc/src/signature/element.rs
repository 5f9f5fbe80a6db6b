// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signature elements and their one-character type codes.

use std::fmt;

/// Type codes of the signature grammar.
pub mod code {
    pub const VOID: u8 = b'v';
    pub const BOOL: u8 = b'b';
    pub const INT8: u8 = b'c';
    pub const UINT8: u8 = b'C';
    pub const INT16: u8 = b'w';
    pub const UINT16: u8 = b'W';
    pub const INT32: u8 = b'i';
    pub const UINT32: u8 = b'I';
    pub const INT64: u8 = b'l';
    pub const UINT64: u8 = b'L';
    pub const FLOAT32: u8 = b'f';
    pub const FLOAT64: u8 = b'd';
    pub const STRING: u8 = b's';
    pub const RAW: u8 = b'r';
    pub const OBJECT: u8 = b'o';
    pub const DYNAMIC: u8 = b'm';
    pub const LIST_OPEN: u8 = b'[';
    pub const LIST_CLOSE: u8 = b']';
    pub const MAP_OPEN: u8 = b'{';
    pub const MAP_CLOSE: u8 = b'}';
    pub const TUPLE_OPEN: u8 = b'(';
    pub const TUPLE_CLOSE: u8 = b')';
    pub const ANNOTATION_OPEN: u8 = b'<';
    pub const ANNOTATION_CLOSE: u8 = b'>';
    pub const POINTER: u8 = b'*';
}

/// Tuple element: ordered fields plus an optional struct annotation.
///
/// The annotation (`(is)<Point,x,name>`) names the tuple and its fields.
/// It never changes the wire layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TupleElement {
    pub fields: Vec<Element>,
    pub name: Option<String>,
    pub field_names: Vec<String>,
}

impl TupleElement {
    /// Anonymous tuple.
    #[must_use]
    pub fn new(fields: Vec<Element>) -> Self {
        Self {
            fields,
            name: None,
            field_names: Vec::new(),
        }
    }

    /// Named tuple (struct). `field_names` must be empty or match the field count.
    #[must_use]
    pub fn named(name: impl Into<String>, fields: Vec<Element>, field_names: Vec<String>) -> Self {
        Self {
            fields,
            name: Some(name.into()),
            field_names,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_annotated(&self) -> bool {
        self.name.is_some() || !self.field_names.is_empty()
    }
}

/// One element of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Void,
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    /// Opaque byte run.
    Raw,
    /// Remote object reference.
    Object,
    /// Value carrying its own signature.
    Dynamic,
    List(Box<Element>),
    Map(Box<Element>, Box<Element>),
    Tuple(TupleElement),
    Pointer(Box<Element>),
}

impl Element {
    #[must_use]
    pub fn list(element: Element) -> Self {
        Element::List(Box::new(element))
    }

    #[must_use]
    pub fn map(key: Element, value: Element) -> Self {
        Element::Map(Box::new(key), Box::new(value))
    }

    #[must_use]
    pub fn tuple(fields: Vec<Element>) -> Self {
        Element::Tuple(TupleElement::new(fields))
    }

    #[must_use]
    pub fn pointer(element: Element) -> Self {
        Element::Pointer(Box::new(element))
    }

    /// Element for a single-character primitive code, if any.
    #[must_use]
    pub fn from_code(c: u8) -> Option<Self> {
        let element = match c {
            code::VOID => Element::Void,
            code::BOOL => Element::Bool,
            code::INT8 => Element::Int8,
            code::UINT8 => Element::UInt8,
            code::INT16 => Element::Int16,
            code::UINT16 => Element::UInt16,
            code::INT32 => Element::Int32,
            code::UINT32 => Element::UInt32,
            code::INT64 => Element::Int64,
            code::UINT64 => Element::UInt64,
            code::FLOAT32 => Element::Float32,
            code::FLOAT64 => Element::Float64,
            code::STRING => Element::String,
            code::RAW => Element::Raw,
            code::OBJECT => Element::Object,
            code::DYNAMIC => Element::Dynamic,
            _ => return None,
        };
        Some(element)
    }

    /// Leading character of the element's text form.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            Element::Void => code::VOID,
            Element::Bool => code::BOOL,
            Element::Int8 => code::INT8,
            Element::UInt8 => code::UINT8,
            Element::Int16 => code::INT16,
            Element::UInt16 => code::UINT16,
            Element::Int32 => code::INT32,
            Element::UInt32 => code::UINT32,
            Element::Int64 => code::INT64,
            Element::UInt64 => code::UINT64,
            Element::Float32 => code::FLOAT32,
            Element::Float64 => code::FLOAT64,
            Element::String => code::STRING,
            Element::Raw => code::RAW,
            Element::Object => code::OBJECT,
            Element::Dynamic => code::DYNAMIC,
            Element::List(_) => code::LIST_OPEN,
            Element::Map(..) => code::MAP_OPEN,
            Element::Tuple(_) => code::TUPLE_OPEN,
            Element::Pointer(inner) => inner.code(),
        }
    }

    /// Width in bytes and signedness of an integer element.
    #[must_use]
    pub fn int_info(&self) -> Option<(u8, bool)> {
        match self {
            Element::Int8 => Some((1, true)),
            Element::UInt8 => Some((1, false)),
            Element::Int16 => Some((2, true)),
            Element::UInt16 => Some((2, false)),
            Element::Int32 => Some((4, true)),
            Element::UInt32 => Some((4, false)),
            Element::Int64 => Some((8, true)),
            Element::UInt64 => Some((8, false)),
            _ => None,
        }
    }

    /// Width in bytes of a floating-point element.
    #[must_use]
    pub fn float_width(&self) -> Option<u8> {
        match self {
            Element::Float32 => Some(4),
            Element::Float64 => Some(8),
            _ => None,
        }
    }

    /// Bool, integer or float.
    #[inline]
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Element::Bool) || self.int_info().is_some() || self.float_width().is_some()
    }

    /// Element signature of a list (`[E]` -> `E`) or value signature of a map.
    #[must_use]
    pub fn element_of(&self) -> Option<&Element> {
        match self {
            Element::List(inner) | Element::Pointer(inner) => Some(inner),
            Element::Map(_, value) => Some(value),
            _ => None,
        }
    }

    /// Structural equality ignoring tuple annotations.
    #[must_use]
    pub fn same_shape(&self, other: &Element) -> bool {
        match (self, other) {
            (Element::List(a), Element::List(b)) | (Element::Pointer(a), Element::Pointer(b)) => {
                a.same_shape(b)
            }
            (Element::Map(ka, va), Element::Map(kb, vb)) => ka.same_shape(kb) && va.same_shape(vb),
            (Element::Tuple(a), Element::Tuple(b)) => {
                a.fields.len() == b.fields.len()
                    && a.fields.iter().zip(&b.fields).all(|(x, y)| x.same_shape(y))
            }
            _ => self == other,
        }
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        match self {
            Element::List(inner) => {
                out.push('[');
                inner.write_to(out);
                out.push(']');
            }
            Element::Map(key, value) => {
                out.push('{');
                key.write_to(out);
                value.write_to(out);
                out.push('}');
            }
            Element::Tuple(tuple) => {
                out.push('(');
                for field in &tuple.fields {
                    field.write_to(out);
                }
                out.push(')');
                if tuple.is_annotated() {
                    out.push('<');
                    out.push_str(tuple.name.as_deref().unwrap_or(""));
                    for name in &tuple.field_names {
                        out.push(',');
                        out.push_str(name);
                    }
                    out.push('>');
                }
            }
            Element::Pointer(inner) => {
                inner.write_to(out);
                out.push('*');
            }
            primitive => out.push(char::from(primitive.code())),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::new();
        self.write_to(&mut text);
        f.write_str(&text)
    }
}
