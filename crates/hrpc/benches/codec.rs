// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec Benchmark
//!
//! Measures encode/decode of:
//! - Flat argument tuples (the common call shape)
//! - Lists of structs at growing sizes
//! - Signature parsing

#![allow(clippy::uninlined_format_args)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hrpc::codec::{decode_value, encode_as};
use hrpc::{Signature, Value};
use std::hint::black_box as bb;

fn record(i: usize) -> Value {
    Value::Tuple(vec![
        Value::I32(i as i32),
        Value::String(format!("sensor-{}", i)),
        Value::List(vec![Value::F64(1.5), Value::F64(-2.25), Value::F64(i as f64)]),
        Value::Map(vec![("unit".into(), "C".into()), ("zone".into(), "north".into())]),
    ])
}

fn bench_flat_args(c: &mut Criterion) {
    let signature = Signature::parse("(isd)").expect("signature");
    let value = Value::Tuple(vec![Value::I32(42), "add".into(), Value::F64(0.5)]);
    let bytes = encode_as(&value, &signature).expect("encode");

    c.bench_function("codec/encode_flat", |b| {
        b.iter(|| encode_as(bb(&value), bb(&signature)))
    });
    c.bench_function("codec/decode_flat", |b| {
        b.iter(|| decode_value(bb(&bytes), bb(&signature)))
    });
}

fn bench_record_lists(c: &mut Criterion) {
    let signature = Signature::parse("[(is[d]{ss})]").expect("signature");
    let mut group = c.benchmark_group("codec_record_list");

    for count in [1usize, 16, 256, 4096] {
        let value = Value::List((0..count).map(record).collect());
        let bytes = encode_as(&value, &signature).expect("encode");
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", count), &value, |b, value| {
            b.iter(|| encode_as(bb(value), &signature))
        });
        group.bench_with_input(BenchmarkId::new("decode", count), &bytes, |b, bytes| {
            b.iter(|| decode_value(bb(bytes), &signature))
        });
    }
    group.finish();
}

fn bench_signature_parse(c: &mut Criterion) {
    let texts = [
        "i",
        "(i[s]{si})",
        "({I(Issss)<MetaMethod,uid,returnSignature,name,parametersSignature,description>}s)",
    ];
    let mut group = c.benchmark_group("signature_parse");
    for text in texts {
        group.bench_with_input(BenchmarkId::from_parameter(text.len()), text, |b, text| {
            b.iter(|| Signature::parse(bb(text)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flat_args, bench_record_lists, bench_signature_parse);
criterion_main!(benches);
