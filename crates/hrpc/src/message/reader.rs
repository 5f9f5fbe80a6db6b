// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reassembly of length-prefixed frames from arbitrary byte chunks.

use super::{Frame, FrameError};
use crate::config::{DEFAULT_MAX_FRAME_SIZE, FRAME_PREFIX_SIZE};

/// Incremental frame reader.
///
/// Transports hand it whatever chunks they receive with [`feed`]; complete
/// frame bodies come out of [`next_body`] / [`next_frame`]. A frame
/// announcing more than `max_size` bytes is reported once as
/// [`FrameError::Oversized`] and its body is skipped as it arrives, so the
/// stream stays in sync.
///
/// [`feed`]: FrameReader::feed
/// [`next_body`]: FrameReader::next_body
/// [`next_frame`]: FrameReader::next_frame
#[derive(Debug)]
pub struct FrameReader {
    state: ReadState,
    accumulator: Vec<u8>,
    accumulator_pos: usize,
    max_size: usize,
    frames_decoded: u64,
    bytes_decoded: u64,
    frames_rejected: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    ReadingLength,
    ReadingBody { expected_len: usize },
    SkippingBody { remaining: usize },
}

impl FrameReader {
    pub fn new(max_size: usize) -> Self {
        Self {
            state: ReadState::ReadingLength,
            accumulator: Vec::with_capacity(16384),
            accumulator_pos: 0,
            max_size,
            frames_decoded: 0,
            bytes_decoded: 0,
            frames_rejected: 0,
        }
    }

    pub fn with_default_max() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the size cap; applies from the next length prefix on.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    pub fn bytes_decoded(&self) -> u64 {
        self.bytes_decoded
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    /// Drop buffered bytes and partial state (e.g. after reconnecting).
    pub fn reset(&mut self) {
        self.state = ReadState::ReadingLength;
        self.accumulator.clear();
        self.accumulator_pos = 0;
    }

    /// Append received bytes.
    pub fn feed(&mut self, data: &[u8]) {
        // Compact once more than half of the buffer has been consumed
        if self.accumulator_pos > 0 && self.accumulator_pos > self.accumulator.len() / 2 {
            self.accumulator.drain(..self.accumulator_pos);
            self.accumulator_pos = 0;
        }
        self.accumulator.extend_from_slice(data);
    }

    /// Bytes fed but not yet returned as part of a frame.
    pub fn has_buffered_data(&self) -> bool {
        self.accumulator_pos < self.accumulator.len()
    }

    /// True while in the middle of a frame.
    pub fn is_partial(&self) -> bool {
        self.state != ReadState::ReadingLength || self.has_buffered_data()
    }

    /// Next complete frame body (header + payload run, no prefix).
    ///
    /// `None` means more bytes are needed.
    pub fn next_body(&mut self) -> Option<Result<Vec<u8>, FrameError>> {
        loop {
            let available = &self.accumulator[self.accumulator_pos..];
            match self.state {
                ReadState::ReadingLength => {
                    if available.len() < FRAME_PREFIX_SIZE {
                        return None;
                    }
                    let mut prefix = [0u8; FRAME_PREFIX_SIZE];
                    prefix.copy_from_slice(&available[..FRAME_PREFIX_SIZE]);
                    self.accumulator_pos += FRAME_PREFIX_SIZE;
                    let len = u32::from_le_bytes(prefix) as usize;

                    if len > self.max_size {
                        self.frames_rejected += 1;
                        self.state = ReadState::SkippingBody { remaining: len };
                        log::warn!(
                            "[framing] skipping frame of {} bytes (max {})",
                            len,
                            self.max_size
                        );
                        return Some(Err(FrameError::Oversized {
                            size: len,
                            max: self.max_size,
                        }));
                    }
                    self.state = ReadState::ReadingBody { expected_len: len };
                }

                ReadState::ReadingBody { expected_len } => {
                    if available.len() < expected_len {
                        return None;
                    }
                    let body = available[..expected_len].to_vec();
                    self.accumulator_pos += expected_len;
                    self.frames_decoded += 1;
                    self.bytes_decoded += expected_len as u64;
                    self.state = ReadState::ReadingLength;
                    return Some(Ok(body));
                }

                ReadState::SkippingBody { remaining } => {
                    let skip = remaining.min(available.len());
                    self.accumulator_pos += skip;
                    if skip < remaining {
                        self.state = ReadState::SkippingBody {
                            remaining: remaining - skip,
                        };
                        return None;
                    }
                    self.state = ReadState::ReadingLength;
                }
            }
        }
    }

    /// Next complete frame, parsed.
    pub fn next_frame(&mut self) -> Option<Result<Frame, FrameError>> {
        self.next_body()
            .map(|body| body.and_then(|body| Frame::decode_body(&body)))
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::with_default_max()
    }
}
