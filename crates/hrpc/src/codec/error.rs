// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::value::ConversionError;
use std::fmt;

/// Binary encode/decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read needed `need` bytes at `offset`, only `have` remained.
    TruncatedBuffer {
        offset: usize,
        need: usize,
        have: usize,
    },
    /// A list/map count above the configured cap or the bytes available.
    UnexpectedElementCount {
        offset: usize,
        count: usize,
        max: usize,
    },
    /// Dynamic value announcing a signature that is not a single element.
    UnknownKind { offset: usize, signature: String },
    /// String bytes are not UTF-8.
    InvalidUtf8 { offset: usize },
    /// Pointer presence byte other than 0 or 1.
    InvalidPresence { offset: usize, byte: u8 },
    /// Nesting deeper than the configured cap.
    DepthExceeded { max: usize },
    /// Bytes left over after the value.
    TrailingBytes { offset: usize, count: usize },
    /// Value does not fit the requested signature or descriptor.
    Conversion(ConversionError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedBuffer { offset, need, have } => write!(
                f,
                "truncated buffer at offset {}: need {} bytes, have {}",
                offset, need, have
            ),
            Self::UnexpectedElementCount { offset, count, max } => write!(
                f,
                "element count {} at offset {} exceeds {}",
                count, offset, max
            ),
            Self::UnknownKind { offset, signature } => {
                write!(f, "unknown dynamic kind '{}' at offset {}", signature, offset)
            }
            Self::InvalidUtf8 { offset } => write!(f, "invalid UTF-8 string at offset {}", offset),
            Self::InvalidPresence { offset, byte } => {
                write!(f, "invalid pointer presence byte {:#04x} at offset {}", byte, offset)
            }
            Self::DepthExceeded { max } => write!(f, "value nesting exceeds {}", max),
            Self::TrailingBytes { offset, count } => {
                write!(f, "{} trailing byte(s) after value at offset {}", count, offset)
            }
            Self::Conversion(e) => write!(f, "conversion failed: {}", e),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Conversion(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConversionError> for CodecError {
    fn from(e: ConversionError) -> Self {
        Self::Conversion(e)
    }
}
