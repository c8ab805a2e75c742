#[macro_use]
extern crate criterion;
extern crate fastac;

use criterion::Criterion;

use fastac::{AdaptiveBitModel, AdaptiveDataModel, ArithmeticCodec};

const BITS: usize = 0x10000;
const SYMBOLS: usize = 0x10000;

fn skewed_bits() -> Vec<u32> {
    (0..BITS)
        .map(|k| u32::from(k.wrapping_mul(2_654_435_761) % 10 == 0))
        .collect()
}

fn byte_symbols() -> Vec<u32> {
    (0..SYMBOLS)
        .map(|k| ((k.wrapping_mul(2_654_435_761) >> 7) & 0xFF) as u32)
        .collect()
}

fn adaptive_bit_encoding_benchmark(c: &mut Criterion) {
    c.bench_function("adaptive_bit_encoding", |b| {
        let bits = skewed_bits();
        let mut codec = ArithmeticCodec::with_capacity(BITS).unwrap();
        b.iter(|| {
            let mut model = AdaptiveBitModel::new();
            codec.start_encoder().unwrap();
            for &bit in &bits {
                codec.encode_adaptive_bit(&mut model, bit).unwrap();
            }
            codec.stop_encoder().unwrap()
        })
    });
}

fn adaptive_symbol_encoding_benchmark(c: &mut Criterion) {
    c.bench_function("adaptive_symbol_encoding", |b| {
        let symbols = byte_symbols();
        let mut codec = ArithmeticCodec::with_capacity(2 * SYMBOLS).unwrap();
        b.iter(|| {
            let mut model = AdaptiveDataModel::new(256).unwrap();
            codec.start_encoder().unwrap();
            for &sym in &symbols {
                codec.encode_adaptive_symbol(&mut model, sym).unwrap();
            }
            codec.stop_encoder().unwrap()
        })
    });
}

fn adaptive_symbol_decoding_benchmark(c: &mut Criterion) {
    c.bench_function("adaptive_symbol_decoding", |b| {
        let symbols = byte_symbols();
        let mut codec = ArithmeticCodec::with_capacity(2 * SYMBOLS).unwrap();
        let mut model = AdaptiveDataModel::new(256).unwrap();
        codec.start_encoder().unwrap();
        for &sym in &symbols {
            codec.encode_adaptive_symbol(&mut model, sym).unwrap();
        }
        codec.stop_encoder().unwrap();

        b.iter(|| {
            let mut model = AdaptiveDataModel::new(256).unwrap();
            codec.start_decoder().unwrap();
            let mut decoded = 0u32;
            for _ in 0..SYMBOLS {
                decoded = decoded.wrapping_add(codec.decode_adaptive_symbol(&mut model));
            }
            codec.stop_decoder().unwrap();
            decoded
        })
    });
}

fn fp_adaptive_symbol_encoding_benchmark(c: &mut Criterion) {
    c.bench_function("fp_adaptive_symbol_encoding", |b| {
        let symbols = byte_symbols();
        let mut codec = fastac::fp::ArithmeticCodec::with_capacity(2 * SYMBOLS).unwrap();
        b.iter(|| {
            let mut model = fastac::fp::AdaptiveDataModel::new(256).unwrap();
            codec.start_encoder().unwrap();
            for &sym in &symbols {
                codec.encode_adaptive_symbol(&mut model, sym).unwrap();
            }
            codec.stop_encoder().unwrap()
        })
    });
}

criterion_group!(
    benches,
    adaptive_bit_encoding_benchmark,
    adaptive_symbol_encoding_benchmark,
    adaptive_symbol_decoding_benchmark,
    fp_adaptive_symbol_encoding_benchmark
);
criterion_main!(benches);
