// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary wire codec.
//!
//! Layout, all integers little-endian:
//!
//! | kind | bytes |
//! |------|-------|
//! | bool | 1 byte, 0 or 1 |
//! | intN / floatN | N/8 bytes |
//! | string, raw | u32 byte count, then the bytes (no terminator) |
//! | list | u32 count, then each element |
//! | map | u32 count, then key, value, key, value... |
//! | tuple | fields in order, no header |
//! | pointer | presence byte (0/1), then the element when present |
//! | object | service u32, object u32 |
//! | dynamic | signature string, then the value in that signature |
//! | void | nothing |
//!
//! A multi-element signature is encoded as the tuple of its elements, which
//! is how argument lists travel.
//!
//! # Example
//!
//! ```
//! use hrpc::codec::{decode_value, encode_as};
//! use hrpc::signature::Signature;
//! use hrpc::Value;
//!
//! let sig = Signature::parse("[w]").unwrap();
//! let bytes = encode_as(&Value::List(vec![Value::I32(1), Value::I32(-2)]), &sig).unwrap();
//! assert_eq!(bytes, [2, 0, 0, 0, 1, 0, 0xfe, 0xff]);
//! assert_eq!(
//!     decode_value(&bytes, &sig).unwrap(),
//!     Value::List(vec![Value::I16(1), Value::I16(-2)])
//! );
//! ```

mod cursor;
mod decoder;
mod encoder;
mod error;


pub use cursor::Cursor;
pub(crate) use cursor::WriteLe;
pub use error::CodecError;

use crate::config::Limits;
use crate::signature::{Element, Signature};
use crate::types::TypeDescriptor;
use crate::value::{conforms, convert, AnyReference, AnyValue, ConversionError, Value};
use decoder::Decoder;
use encoder::Encoder;
use std::borrow::Cow;
use std::sync::Arc;

/// Element a whole signature is written as: its only element, or the tuple
/// of all of them.
fn target_element(signature: &Signature) -> Cow<'_, Element> {
    match signature.single() {
        Some(element) => Cow::Borrowed(element),
        None => Cow::Owned(signature.to_tuple()),
    }
}

/// Encode a value in the layout of its own inferred signature.
///
/// Lists and maps whose items do not share a signature are written with
/// dynamic items, so this never fails.
#[must_use]
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value_into(value, &mut out);
    out
}

/// [`encode_value`] appending to an existing buffer.
pub fn encode_value_into(value: &Value, out: &mut Vec<u8>) {
    let element = value.signature();
    let result = match convert(value, &element) {
        Ok(conformed) => Encoder::new(out).write(&conformed, &element),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        // Inference always yields a signature the value converts to.
        log::error!("[codec] value rejected its inferred signature {}: {}", element, e);
    }
}

/// Encode a value as `signature`, converting it first.
///
/// Fails with [`CodecError::Conversion`] when the value cannot take that
/// shape; nothing is written in that case.
pub fn encode_as(value: &Value, signature: &Signature) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    encode_as_into(value, signature, &mut out)?;
    Ok(out)
}

/// [`encode_as`] appending to an existing buffer.
pub fn encode_as_into(
    value: &Value,
    signature: &Signature,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let element = target_element(signature);
    let value = if conforms(value, &element) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(convert(value, &element)?)
    };
    let mut scratch = Vec::new();
    Encoder::new(&mut scratch).write(&value, &element)?;
    out.extend_from_slice(&scratch);
    Ok(())
}

/// Encode a type-erased value with its descriptor's signature.
pub fn encode(value: &AnyReference<'_>) -> Result<Vec<u8>, CodecError> {
    let signature = value.signature().ok_or(ConversionError::Invalid)?;
    encode_as(&value.to_value()?, signature)
}

/// Encode an argument list against the declared parameter signature.
pub fn encode_args(args: &[Value], params: &Signature) -> Result<Vec<u8>, CodecError> {
    if args.len() != params.len() {
        return Err(ConversionError::ArityMismatch {
            expected: params.len(),
            found: args.len(),
        }
        .into());
    }
    let mut out = Vec::new();
    for (i, (arg, element)) in args.iter().zip(params.elements()).enumerate() {
        let arg = convert(arg, element).map_err(|e| e.at(i))?;
        Encoder::new(&mut out).write(&arg, element)?;
    }
    Ok(out)
}

/// Decode a value of `signature` with default limits.
pub fn decode_value(bytes: &[u8], signature: &Signature) -> Result<Value, CodecError> {
    decode_value_with(bytes, signature, &Limits::default())
}

/// Decode a value of `signature`. Every byte must be consumed.
pub fn decode_value_with(
    bytes: &[u8],
    signature: &Signature,
    limits: &Limits,
) -> Result<Value, CodecError> {
    let element = target_element(signature);
    let mut decoder = Decoder::new(bytes, *limits);
    let value = decoder.read_value(&element, 0)?;
    decoder.finish()?;
    Ok(value)
}

/// Decode an argument list: one value per element of `params`.
pub fn decode_args(
    bytes: &[u8],
    params: &Signature,
    limits: &Limits,
) -> Result<Vec<Value>, CodecError> {
    let mut decoder = Decoder::new(bytes, *limits);
    let args = params
        .elements()
        .iter()
        .map(|element| decoder.read_value(element, 0))
        .collect::<Result<Vec<_>, _>>()?;
    decoder.finish()?;
    Ok(args)
}

/// Decode into owned storage of `descriptor`.
pub fn decode(bytes: &[u8], descriptor: &Arc<dyn TypeDescriptor>) -> Result<AnyValue, CodecError> {
    let value = decode_value(bytes, descriptor.signature())?;
    Ok(AnyValue::from_value(value, Arc::clone(descriptor))?)
}
