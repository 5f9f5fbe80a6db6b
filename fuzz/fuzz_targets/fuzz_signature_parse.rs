// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hrpc::Signature;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(signature) = Signature::parse(text) {
        // Printing must give text that parses back to the same signature
        let printed = signature.to_string();
        let reparsed = Signature::parse(&printed).expect("printed signature parses");
        assert_eq!(reparsed, signature);
    }
});
