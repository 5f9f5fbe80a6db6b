// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked little-endian read cursor.

use super::CodecError;

/// Generate read methods for primitive types
///
/// Each generated method checks the remaining length before reading and
/// reports `TruncatedBuffer` with the current offset on overflow.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type, CodecError> {
            let bytes = self.read_bytes($size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(bytes);
            Ok(<$type>::from_le_bytes(raw))
        }
    };
}

/// Immutable cursor for reading (bounds-checked, zero-copy)
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i64, i64, 8);
    impl_read_le!(read_f32, f32, 4);
    impl_read_le!(read_f64, f64, 8);

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::TruncatedBuffer {
                offset: self.offset,
                need: len,
                have: self.remaining(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// `u32` length followed by that many bytes.
    pub fn read_sized(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }

    /// Length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<&'a str, CodecError> {
        let start = self.offset;
        let bytes = self.read_sized()?;
        std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { offset: start })
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}

/// Append helpers used by the encoder and the frame writer.
pub(crate) trait WriteLe {
    fn put_u8(&mut self, v: u8);
    fn put_u32(&mut self, v: u32);
    fn put_sized(&mut self, bytes: &[u8]);
}

impl WriteLe for Vec<u8> {
    #[inline]
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }

    #[inline]
    fn put_u32(&mut self, v: u32) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    fn put_sized(&mut self, bytes: &[u8]) {
        self.put_u32(bytes.len() as u32);
        self.extend_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_overflow_reports_offset() {
        let buffer = [0x01, 0x02, 0x03];
        let mut cursor = Cursor::new(&buffer);
        assert_eq!(cursor.read_u16().expect("two bytes"), 0x0201);
        let err = cursor.read_u32().expect_err("only one byte left");
        assert_eq!(
            err,
            CodecError::TruncatedBuffer {
                offset: 2,
                need: 4,
                have: 1
            }
        );
        assert_eq!(cursor.offset(), 2);
    }

    #[test]
    fn test_read_str() {
        let mut buffer = Vec::new();
        buffer.put_sized(b"hey");
        buffer.put_sized(&[0xff, 0xfe]);
        let mut cursor = Cursor::new(&buffer);
        assert_eq!(cursor.read_str().expect("utf8"), "hey");
        assert_eq!(
            cursor.read_str().expect_err("not utf8"),
            CodecError::InvalidUtf8 { offset: 7 }
        );
    }

    #[test]
    fn test_sized_length_past_end() {
        let mut buffer = Vec::new();
        buffer.put_u32(100);
        buffer.extend_from_slice(b"short");
        let mut cursor = Cursor::new(&buffer);
        assert!(matches!(
            cursor.read_sized(),
            Err(CodecError::TruncatedBuffer { offset: 4, need: 100, have: 5 })
        ));
    }

    #[test]
    fn test_floats_little_endian() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&1.5f64.to_le_bytes());
        buffer.extend_from_slice(&(-2.25f32).to_le_bytes());
        let mut cursor = Cursor::new(&buffer);
        assert_eq!(cursor.read_f64().expect("f64"), 1.5);
        assert_eq!(cursor.read_f32().expect("f32"), -2.25);
        assert!(cursor.is_eof());
    }
}
