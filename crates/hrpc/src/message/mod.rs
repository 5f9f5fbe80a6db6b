// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message frames and stream framing.
//!
//! ```text
//! +-------------+----------------------------------------------+---------+
//! | len (u32LE) | id | kind|flags<<8 | service | object | action | plen | payload |
//! +-------------+----------------------------------------------+---------+
//! ```
//!
//! `len` counts the header (24 bytes) plus the payload run. With
//! [`FLAG_SIGNATURE`] set, the payload run starts with the payload's
//! signature (u32 length + text); with [`FLAG_DYNAMIC_PAYLOAD`] the payload
//! is a single dynamic (`m`) value.
//!
//! Payload conventions per kind:
//!
//! | kind | payload |
//! |------|---------|
//! | Call, Post, Event | argument tuple, signature carried in the frame |
//! | Reply | dynamic value |
//! | Error | dynamic string |
//! | Cancel | `I`: id of the call to cancel |
//! | Canceled | empty |

mod error;
mod reader;


pub use error::FrameError;
pub use reader::FrameReader;

use crate::codec::{self, CodecError, Cursor, WriteLe};
use crate::config::{
    Limits, FLAG_DYNAMIC_PAYLOAD, FLAG_SIGNATURE, FRAME_PREFIX_SIZE, HEADER_SIZE, KNOWN_FLAGS,
};
use crate::signature::Signature;
use crate::value::Value;
use std::fmt;

/// Message kind (low byte of the second header word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Call = 1,
    Reply = 2,
    Error = 3,
    Post = 4,
    Event = 5,
    Cancel = 7,
    Canceled = 8,
}

impl MessageKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(MessageKind::Call),
            2 => Some(MessageKind::Reply),
            3 => Some(MessageKind::Error),
            4 => Some(MessageKind::Post),
            5 => Some(MessageKind::Event),
            7 => Some(MessageKind::Cancel),
            8 => Some(MessageKind::Canceled),
            _ => None,
        }
    }

    /// Replies, errors and cancellations answer a pending call.
    #[inline]
    pub fn is_response(self) -> bool {
        matches!(
            self,
            MessageKind::Reply | MessageKind::Error | MessageKind::Canceled
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Call => "Call",
            MessageKind::Reply => "Reply",
            MessageKind::Error => "Error",
            MessageKind::Post => "Post",
            MessageKind::Event => "Event",
            MessageKind::Cancel => "Cancel",
            MessageKind::Canceled => "Canceled",
        };
        f.write_str(name)
    }
}

/// Target of a message: service, object, action (method/signal/property id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageAddress {
    pub service: u32,
    pub object: u32,
    pub action: u32,
}

impl MessageAddress {
    #[must_use]
    pub const fn new(service: u32, object: u32, action: u32) -> Self {
        Self {
            service,
            object,
            action,
        }
    }
}

impl fmt::Display for MessageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.service, self.object, self.action)
    }
}

/// One protocol message.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: u32,
    pub kind: MessageKind,
    /// Extra flag bits; `FLAG_SIGNATURE` is derived from `signature` on encode.
    pub flags: u8,
    pub address: MessageAddress,
    /// Signature of `payload`, when carried in the frame.
    pub signature: Option<Signature>,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Frame with an empty payload.
    #[must_use]
    pub fn new(kind: MessageKind, id: u32, address: MessageAddress) -> Self {
        Self {
            id,
            kind,
            flags: 0,
            address,
            signature: None,
            payload: Vec::new(),
        }
    }

    /// Frame carrying `args` encoded as `params`, signature included.
    pub fn with_args(
        kind: MessageKind,
        id: u32,
        address: MessageAddress,
        params: &Signature,
        args: &[Value],
    ) -> Result<Self, CodecError> {
        let payload = codec::encode_args(args, params)?;
        Ok(Self {
            signature: Some(params.clone()),
            payload,
            ..Self::new(kind, id, address)
        })
    }

    /// Frame carrying one dynamic value.
    #[must_use]
    pub fn with_dynamic(kind: MessageKind, id: u32, address: MessageAddress, value: &Value) -> Self {
        let mut payload = Vec::new();
        codec::encode_value_into(&Value::dynamic(value.clone()), &mut payload);
        Self {
            flags: FLAG_DYNAMIC_PAYLOAD,
            payload,
            ..Self::new(kind, id, address)
        }
    }

    /// Reply to `request` with a value.
    #[must_use]
    pub fn reply_to(request: &Frame, value: &Value) -> Self {
        Self::with_dynamic(MessageKind::Reply, request.id, request.address, value)
    }

    /// Error answer to `request`.
    #[must_use]
    pub fn error_to(request: &Frame, message: &str) -> Self {
        Self::with_dynamic(MessageKind::Error, request.id, request.address, &message.into())
    }

    /// Cancel request for call `target`, sent as message `id`.
    #[must_use]
    pub fn cancel(id: u32, address: MessageAddress, target: u32) -> Self {
        Self {
            payload: target.to_le_bytes().to_vec(),
            ..Self::new(MessageKind::Cancel, id, address)
        }
    }

    #[inline]
    pub fn has_dynamic_payload(&self) -> bool {
        self.flags & FLAG_DYNAMIC_PAYLOAD != 0
    }

    /// Argument list carried in the payload, decoded with its signature.
    ///
    /// A frame without signature must have an empty payload (no arguments).
    pub fn args(&self, limits: &Limits) -> Result<Vec<Value>, CodecError> {
        match &self.signature {
            Some(signature) => codec::decode_args(&self.payload, signature, limits),
            None => codec::decode_args(&self.payload, &Signature::empty(), limits),
        }
    }

    /// The dynamic value carried in the payload, unwrapped.
    ///
    /// An empty payload without the dynamic flag reads as void.
    pub fn dynamic_value(&self, limits: &Limits) -> Result<Value, CodecError> {
        if !self.has_dynamic_payload() && self.payload.is_empty() {
            return Ok(Value::Void);
        }
        let element = Signature::from_element(crate::signature::Element::Dynamic);
        codec::decode_value_with(&self.payload, &element, limits).map(Value::into_unwrapped)
    }

    /// Target call id of a Cancel frame.
    pub fn cancel_target(&self) -> Result<u32, CodecError> {
        let mut cursor = Cursor::new(&self.payload);
        let target = cursor.read_u32()?;
        if !cursor.is_eof() {
            return Err(CodecError::TrailingBytes {
                offset: cursor.offset(),
                count: cursor.remaining(),
            });
        }
        Ok(target)
    }

    /// Serialize with length prefix.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_PREFIX_SIZE + HEADER_SIZE + self.payload.len());
        self.encode_into(&mut out);
        out
    }

    /// Append the serialized frame (with length prefix) to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let signature = self.signature.as_ref().map(Signature::canonical);
        let mut flags = self.flags & !FLAG_SIGNATURE;
        let mut run = self.payload.len();
        if let Some(text) = &signature {
            flags |= FLAG_SIGNATURE;
            run += 4 + text.len();
        }

        out.put_u32((HEADER_SIZE + run) as u32);
        out.put_u32(self.id);
        out.put_u32(u32::from(self.kind as u8) | (u32::from(flags) << 8));
        out.put_u32(self.address.service);
        out.put_u32(self.address.object);
        out.put_u32(self.address.action);
        out.put_u32(run as u32);
        if let Some(text) = &signature {
            out.put_sized(text.as_bytes());
        }
        out.extend_from_slice(&self.payload);
    }

    /// Parse exactly one frame, length prefix included.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < FRAME_PREFIX_SIZE {
            return Err(FrameError::Truncated {
                need: FRAME_PREFIX_SIZE,
                have: bytes.len(),
            });
        }
        let mut prefix = [0u8; FRAME_PREFIX_SIZE];
        prefix.copy_from_slice(&bytes[..FRAME_PREFIX_SIZE]);
        let len = u32::from_le_bytes(prefix) as usize;
        let body = &bytes[FRAME_PREFIX_SIZE..];
        if body.len() != len {
            return Err(FrameError::PayloadLength {
                declared: len,
                actual: body.len(),
            });
        }
        Self::decode_body(body)
    }

    /// Parse a frame body (header + payload run, no length prefix).
    pub fn decode_body(body: &[u8]) -> Result<Self, FrameError> {
        let truncated = |_| FrameError::Truncated {
            need: HEADER_SIZE,
            have: body.len(),
        };
        let mut cursor = Cursor::new(body);
        let id = cursor.read_u32().map_err(truncated)?;
        let word = cursor.read_u32().map_err(truncated)?;
        let service = cursor.read_u32().map_err(truncated)?;
        let object = cursor.read_u32().map_err(truncated)?;
        let action = cursor.read_u32().map_err(truncated)?;
        let run = cursor.read_u32().map_err(truncated)? as usize;

        let kind_byte = (word & 0xff) as u8;
        let flags = ((word >> 8) & 0xff) as u8;
        let kind = MessageKind::from_u8(kind_byte).ok_or(FrameError::UnknownKind(kind_byte))?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(FrameError::UnknownFlags(flags & !KNOWN_FLAGS));
        }
        if run != cursor.remaining() {
            return Err(FrameError::PayloadLength {
                declared: run,
                actual: cursor.remaining(),
            });
        }

        let signature = if flags & FLAG_SIGNATURE != 0 {
            let text = cursor.read_sized().map_err(|_| FrameError::Truncated {
                need: HEADER_SIZE + 4,
                have: body.len(),
            })?;
            let text = std::str::from_utf8(text).map_err(|_| FrameError::InvalidSignatureText)?;
            Some(Signature::parse(text)?)
        } else {
            None
        };
        let payload = body[cursor.offset()..].to_vec();

        Ok(Self {
            id,
            kind,
            flags: flags & !FLAG_SIGNATURE,
            address: MessageAddress::new(service, object, action),
            signature,
            payload,
        })
    }
}
