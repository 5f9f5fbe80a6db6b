// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signature-level convertibility, used to score overload candidates.

use super::element::Element;

/// How well a value of one signature fits a parameter of another.
///
/// Ordered: `Incompatible < Convertible < Exact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Compatibility {
    Incompatible,
    Convertible,
    Exact,
}

impl Compatibility {
    /// Resolution score contribution: exact 2, convertible 1.
    #[inline]
    #[must_use]
    pub fn score(self) -> Option<u32> {
        match self {
            Compatibility::Exact => Some(2),
            Compatibility::Convertible => Some(1),
            Compatibility::Incompatible => None,
        }
    }
}

/// Compatibility of a value shaped `from` with a slot shaped `to`.
///
/// This is the static counterpart of value conversion: `Convertible` means
/// a conversion may succeed (narrowing can still overflow at run time).
#[must_use]
pub fn is_convertible(from: &Element, to: &Element) -> Compatibility {
    if from.same_shape(to) {
        return Compatibility::Exact;
    }
    match (from, to) {
        (Element::Dynamic, _) | (_, Element::Dynamic) => Compatibility::Convertible,
        (f, t) if f.is_numeric() && t.is_numeric() => Compatibility::Convertible,
        (Element::List(a), Element::List(b)) => nested(is_convertible(a, b)),
        (Element::Map(ka, va), Element::Map(kb, vb)) => {
            nested(is_convertible(ka, kb).min(is_convertible(va, vb)))
        }
        (Element::Tuple(a), Element::Tuple(b)) if a.fields.len() == b.fields.len() => nested(
            a.fields
                .iter()
                .zip(&b.fields)
                .map(|(x, y)| is_convertible(x, y))
                .min()
                .unwrap_or(Compatibility::Exact),
        ),
        (Element::Pointer(a), Element::Pointer(b)) => nested(is_convertible(a, b)),
        (Element::Void, Element::Pointer(_)) => Compatibility::Convertible,
        (_, Element::Pointer(b)) => nested(is_convertible(from, b)),
        (Element::Pointer(a), _) => nested(is_convertible(a, to)),
        _ => Compatibility::Incompatible,
    }
}

#[inline]
fn nested(inner: Compatibility) -> Compatibility {
    inner.min(Compatibility::Convertible)
}
