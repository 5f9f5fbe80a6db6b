// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::signature::ParseError;
use crate::value::ConversionError;
use std::fmt;

/// Overload resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No method of that name accepts the arguments.
    NotFound { name: String, signature: String },
    /// Several overloads score equally.
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
    /// Qualified name with an unparsable signature part.
    BadQualifiedName(ParseError),
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::NotFound { name, signature } => {
                write!(f, "no method {} accepting ({})", name, signature)
            }
            ResolutionError::Ambiguous { name, candidates } => write!(
                f,
                "ambiguous call to {}: candidates {}",
                name,
                candidates.join(", ")
            ),
            ResolutionError::BadQualifiedName(e) => write!(f, "bad qualified name: {}", e),
        }
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolutionError::BadQualifiedName(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for ResolutionError {
    fn from(e: ParseError) -> Self {
        ResolutionError::BadQualifiedName(e)
    }
}

/// Object construction or meta-object decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    /// A member with this qualified name already exists.
    Duplicate { name: String, id: u32 },
    /// Member signature does not parse.
    BadSignature(ParseError),
    /// Property initial value does not convert to the property type.
    InvalidInitialValue {
        name: String,
        source: ConversionError,
    },
    /// Serialized meta-object does not have the expected shape.
    MalformedMetaObject(String),
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectError::Duplicate { name, id } => {
                write!(f, "member {} already advertised with id {}", name, id)
            }
            ObjectError::BadSignature(e) => write!(f, "bad member signature: {}", e),
            ObjectError::InvalidInitialValue { name, source } => {
                write!(f, "initial value of property {}: {}", name, source)
            }
            ObjectError::MalformedMetaObject(why) => write!(f, "malformed meta-object: {}", why),
        }
    }
}

impl std::error::Error for ObjectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ObjectError::BadSignature(e) => Some(e),
            ObjectError::InvalidInitialValue { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for ObjectError {
    fn from(e: ParseError) -> Self {
        ObjectError::BadSignature(e)
    }
}
