// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hrpc::config::Limits;
use hrpc::message::{Frame, FrameReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whole frame, header included
    if let Ok(frame) = Frame::decode(data) {
        let limits = Limits::default();
        let _ = frame.args(&limits);
        let _ = frame.dynamic_value(&limits);
        let _ = frame.cancel_target();
    }

    // Same bytes as a stream, fed in uneven chunks
    let mut reader = FrameReader::new(4096);
    for chunk in data.chunks(7) {
        reader.feed(chunk);
        while let Some(body) = reader.next_body() {
            if let Ok(body) = body {
                let _ = Frame::decode_body(&body);
            }
        }
    }
});
