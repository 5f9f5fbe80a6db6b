// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::signature::ParseError;
use std::fmt;

/// Frame decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the header or the announced length requires.
    Truncated { need: usize, have: usize },
    /// Announced frame size above the configured maximum.
    Oversized { size: usize, max: usize },
    /// Message kind byte not in the protocol.
    UnknownKind(u8),
    /// Flag bits this implementation does not understand.
    UnknownFlags(u8),
    /// Header payload length disagrees with the frame length.
    PayloadLength { declared: usize, actual: usize },
    /// Embedded payload signature does not parse.
    BadSignature(ParseError),
    /// Embedded payload signature is not valid UTF-8.
    InvalidSignatureText,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Truncated { need, have } => {
                write!(f, "truncated frame: need {} bytes, have {}", need, have)
            }
            FrameError::Oversized { size, max } => {
                write!(f, "frame too large: {} bytes (max {})", size, max)
            }
            FrameError::UnknownKind(kind) => write!(f, "unknown message kind {}", kind),
            FrameError::UnknownFlags(flags) => write!(f, "unknown flag bits {:#04x}", flags),
            FrameError::PayloadLength { declared, actual } => write!(
                f,
                "payload length mismatch: header says {}, frame carries {}",
                declared, actual
            ),
            FrameError::BadSignature(e) => write!(f, "bad payload signature: {}", e),
            FrameError::InvalidSignatureText => f.write_str("payload signature is not UTF-8"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::BadSignature(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for FrameError {
    fn from(e: ParseError) -> Self {
        FrameError::BadSignature(e)
    }
}
