// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type signature grammar.
//!
//! A signature is a compact text description of a sequence of types, one
//! character per primitive:
//!
//! | code | type | code | type |
//! |------|------|------|------|
//! | `v` | void | `b` | bool |
//! | `c`/`C` | int8/uint8 | `w`/`W` | int16/uint16 |
//! | `i`/`I` | int32/uint32 | `l`/`L` | int64/uint64 |
//! | `f`/`d` | float32/float64 | `s` | string |
//! | `r` | raw bytes | `o` | object |
//! | `m` | dynamic | | |
//!
//! Containers are `[E]` (list), `{KV}` (map) and `(E...)` (tuple, optionally
//! annotated `(is)<Name,field1,field2>`). A trailing `*` marks a pointer to
//! the preceding element, containers included.
//!
//! # Example
//!
//! ```
//! use hrpc::signature::{Element, Signature};
//!
//! let sig = Signature::parse("(i[s]{si})").unwrap();
//! assert_eq!(sig.len(), 1);
//! assert_eq!(sig.to_string(), "(i[s]{si})");
//!
//! let list = Signature::parse("[d]").unwrap();
//! assert_eq!(list.single().and_then(Element::element_of), Some(&Element::Float64));
//! ```

mod compat;
mod element;
mod parser;
mod qualified;


pub use compat::{is_convertible, Compatibility};
pub use element::{code, Element, TupleElement};
pub use parser::{ParseError, ParseErrorKind};
pub use qualified::{split_qualified, Qualified};

use std::fmt;
use std::str::FromStr;

/// Ordered sequence of signature elements. Empty is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    elements: Vec<Element>,
}

impl Signature {
    /// Parse signature text.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parser::parse_elements(text).map(|elements| Self { elements })
    }

    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Zero-element signature.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-element signature.
    #[must_use]
    pub fn from_element(element: Element) -> Self {
        Self {
            elements: vec![element],
        }
    }

    /// The `v` signature.
    #[must_use]
    pub fn void() -> Self {
        Self::from_element(Element::Void)
    }

    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[inline]
    #[must_use]
    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The only element, when the signature has exactly one.
    #[must_use]
    pub fn single(&self) -> Option<&Element> {
        match self.elements.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// All elements wrapped in one tuple element (argument-list payloads).
    #[must_use]
    pub fn to_tuple(&self) -> Element {
        Element::tuple(self.elements.clone())
    }

    /// Sub-signature of a container signature: the list element, the map
    /// value, or the tuple fields.
    #[must_use]
    pub fn sub_signature(&self) -> Option<Signature> {
        match self.single()? {
            Element::Tuple(tuple) => Some(Signature::new(tuple.fields.clone())),
            other => other.element_of().cloned().map(Signature::from_element),
        }
    }

    /// Canonical text form (same as `to_string()`).
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for element in &self.elements {
            element.write_to(&mut out);
        }
        out
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for Signature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Element> for Signature {
    fn from(element: Element) -> Self {
        Self::from_element(element)
    }
}

/// Number of top-level elements in `text` (nested elements not counted).
///
/// Used to validate argument counts before binding.
pub fn count(text: &str) -> Result<usize, ParseError> {
    Signature::parse(text).map(|s| s.len())
}
