// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hrpc::codec::decode_value_with;
use hrpc::config::Limits;
use hrpc::Signature;
use libfuzzer_sys::fuzz_target;

const SIGNATURES: &[&str] = &["m", "(is[d]{ss})", "[m]", "{im}", "o", "(Issss)"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let text = SIGNATURES[selector as usize % SIGNATURES.len()];
    let Ok(signature) = Signature::parse(text) else {
        return;
    };
    let limits = Limits {
        max_depth: 16,
        ..Limits::default()
    };
    let _ = decode_value_with(payload, &signature, &limits);
});
