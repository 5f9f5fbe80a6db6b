// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

/// Value conversion failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// No conversion exists between the two kinds.
    Incompatible { from: String, to: String },
    /// Numeric value does not fit the target type.
    Overflow { value: String, to: String },
    /// Float with a fractional part (or non-finite) converted to an integer.
    Lossy { value: String, to: String },
    /// Tuple field count differs from the target.
    ArityMismatch { expected: usize, found: usize },
    /// Null pointer where a value is required.
    NullPointer { to: String },
    /// Failure inside a container, at `index`.
    Element {
        index: usize,
        source: Box<ConversionError>,
    },
    /// Storage does not belong to the descriptor that reads it.
    StorageMismatch { type_name: String },
    /// Operation on an invalid (destroyed or default) value.
    Invalid,
}

impl ConversionError {
    pub(crate) fn incompatible(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        ConversionError::Incompatible {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub(crate) fn at(self, index: usize) -> Self {
        ConversionError::Element {
            index,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::Incompatible { from, to } => {
                write!(f, "cannot convert {} to {}", from, to)
            }
            ConversionError::Overflow { value, to } => {
                write!(f, "{} does not fit in {}", value, to)
            }
            ConversionError::Lossy { value, to } => {
                write!(f, "{} cannot be represented exactly as {}", value, to)
            }
            ConversionError::ArityMismatch { expected, found } => {
                write!(f, "expected {} field(s), found {}", expected, found)
            }
            ConversionError::NullPointer { to } => {
                write!(f, "null pointer cannot convert to {}", to)
            }
            ConversionError::Element { index, source } => {
                write!(f, "element {}: {}", index, source)
            }
            ConversionError::StorageMismatch { type_name } => {
                write!(f, "storage is not a {}", type_name)
            }
            ConversionError::Invalid => write!(f, "value is invalid"),
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConversionError::Element { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
