// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-level error types.

use crate::codec::CodecError;
use crate::message::FrameError;
use crate::object::{ObjectError, ResolutionError};
use crate::signature::ParseError;
use crate::value::ConversionError;
use std::fmt;

/// Result type for hrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a call did not produce a value.
///
/// Carried by completion handles, so every variant is cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// No method matched the name and arguments.
    Resolution(ResolutionError),
    /// An argument or the result did not convert.
    Conversion(ConversionError),
    /// Payload could not be encoded or decoded.
    Codec(CodecError),
    /// Wrong number of arguments for the method.
    ArgumentCount { expected: usize, found: usize },
    /// The method reported a failure.
    Method(String),
    /// The method panicked.
    Panicked(String),
    /// The peer answered with an Error frame.
    Remote(String),
    /// The transport went away before an answer arrived.
    Disconnected,
    /// The call was canceled locally or by the peer.
    Canceled,
    /// The transport refused the outgoing bytes.
    SendFailed(String),
    /// Unknown method, signal, property or object id.
    Unknown { what: &'static str, id: u32 },
    /// No answer within the requested time.
    Timeout,
}

impl CallError {
    /// Error text sent to a peer in an Error frame.
    #[must_use]
    pub fn remote_message(&self) -> String {
        match self {
            CallError::Remote(msg) | CallError::Method(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolution(e) => write!(f, "{}", e),
            Self::Conversion(e) => write!(f, "conversion failed: {}", e),
            Self::Codec(e) => write!(f, "codec error: {}", e),
            Self::ArgumentCount { expected, found } => {
                write!(f, "expected {} argument(s), got {}", expected, found)
            }
            Self::Method(msg) => write!(f, "{}", msg),
            Self::Panicked(msg) => write!(f, "method panicked: {}", msg),
            Self::Remote(msg) => write!(f, "remote error: {}", msg),
            Self::Disconnected => write!(f, "transport disconnected"),
            Self::Canceled => write!(f, "call canceled"),
            Self::SendFailed(msg) => write!(f, "send failed: {}", msg),
            Self::Unknown { what, id } => write!(f, "unknown {} {}", what, id),
            Self::Timeout => write!(f, "call timed out"),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolution(e) => Some(e),
            Self::Conversion(e) => Some(e),
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResolutionError> for CallError {
    fn from(e: ResolutionError) -> Self {
        Self::Resolution(e)
    }
}

impl From<ConversionError> for CallError {
    fn from(e: ConversionError) -> Self {
        Self::Conversion(e)
    }
}

impl From<CodecError> for CallError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Conversion(inner) => Self::Conversion(inner),
            other => Self::Codec(other),
        }
    }
}

/// Any hrpc failure.
#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Conversion(ConversionError),
    Codec(CodecError),
    Frame(FrameError),
    Resolution(ResolutionError),
    Object(ObjectError),
    Call(CallError),
    /// Service directory refused an operation.
    Directory(String),
    /// Configuration file or value rejected.
    Config(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "signature error: {}", e),
            Error::Conversion(e) => write!(f, "conversion error: {}", e),
            Error::Codec(e) => write!(f, "codec error: {}", e),
            Error::Frame(e) => write!(f, "frame error: {}", e),
            Error::Resolution(e) => write!(f, "resolution error: {}", e),
            Error::Object(e) => write!(f, "object error: {}", e),
            Error::Call(e) => write!(f, "call error: {}", e),
            Error::Directory(msg) => write!(f, "directory error: {}", msg),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Conversion(e) => Some(e),
            Error::Codec(e) => Some(e),
            Error::Frame(e) => Some(e),
            Error::Resolution(e) => Some(e),
            Error::Object(e) => Some(e),
            Error::Call(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Directory(_) | Error::Config(_) => None,
        }
    }
}

macro_rules! impl_from_error {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(e: $ty) -> Self {
                    Error::$variant(e)
                }
            }
        )*
    };
}

impl_from_error! {
    ParseError => Parse,
    ConversionError => Conversion,
    CodecError => Codec,
    FrameError => Frame,
    ResolutionError => Resolution,
    ObjectError => Object,
    CallError => Call,
    std::io::Error => Io,
}
