use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fastac::{
    AdaptiveBitModel, AdaptiveDataModel, ArithmeticCodec, StaticBitModel, StaticDataModel,
};

fn geometric_weights(symbols: usize, ratio: f64) -> Vec<f64> {
    let mut weights = Vec::with_capacity(symbols);
    let mut w = 1.0;
    for _ in 0..symbols {
        weights.push(w);
        w *= ratio;
    }
    weights
}

fn entropy(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    weights
        .iter()
        .map(|w| {
            let p = w / total;
            -p * p.log2()
        })
        .sum()
}

#[test]
fn test_adaptive_bit_skewed_source() {
    let mut rng = ChaCha8Rng::seed_from_u64(20040425);
    let bits: Vec<u32> = (0..1_000_000)
        .map(|_| u32::from(!rng.gen_bool(0.9)))
        .collect();

    let mut codec = ArithmeticCodec::with_capacity(0x20000).unwrap();
    let mut model = AdaptiveBitModel::new();
    codec.start_encoder().unwrap();
    for &bit in &bits {
        codec.encode_adaptive_bit(&mut model, bit).unwrap();
    }
    let code_bytes = codec.stop_encoder().unwrap();

    // H(0.9) is about 0.469 bit per bit
    let rate = code_bytes as f64 * 8.0 / bits.len() as f64;
    assert!(rate > 0.46 && rate < 0.51, "rate = {}", rate);
    assert!(code_bytes < 75_000);

    model.reset();
    codec.start_decoder().unwrap();
    for &bit in &bits {
        assert_eq!(codec.decode_adaptive_bit(&mut model), bit);
    }
    codec.stop_decoder().unwrap();
}

#[test]
fn test_static_bit_probability_sweep() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for &p0 in &[0.0001, 0.1, 0.3, 0.5, 0.7, 0.9, 0.9999] {
        let bits: Vec<u32> = (0..20_000).map(|_| u32::from(!rng.gen_bool(p0))).collect();

        let mut model = StaticBitModel::new();
        model.set_probability_0(p0).unwrap();

        let mut codec = ArithmeticCodec::with_capacity(0x8000).unwrap();
        codec.start_encoder().unwrap();
        for &bit in &bits {
            codec.encode_bit(&model, bit).unwrap();
        }
        codec.stop_encoder().unwrap();

        codec.start_decoder().unwrap();
        for &bit in &bits {
            assert_eq!(codec.decode_bit(&model), bit, "p0 = {}", p0);
        }
        codec.stop_decoder().unwrap();
    }
}

#[test]
fn test_static_data_uniform_256() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let symbols: Vec<u32> = (0..1_000_000).map(|_| rng.gen_range(0..256u32)).collect();

    let mut model = StaticDataModel::new();
    model.set_uniform(256).unwrap();

    let mut codec = ArithmeticCodec::with_capacity(0x0010_0100).unwrap();
    codec.start_encoder().unwrap();
    for &sym in &symbols {
        codec.encode_symbol(&model, sym).unwrap();
    }
    let code_bytes = codec.stop_encoder().unwrap();

    // an incompressible source codes at almost exactly 8 bits per symbol
    let rate = code_bytes as f64 * 8.0 / symbols.len() as f64;
    assert!((rate - 8.0).abs() < 0.001, "rate = {}", rate);

    codec.start_decoder().unwrap();
    for &sym in &symbols {
        assert_eq!(codec.decode_symbol(&model), sym);
    }
    codec.stop_decoder().unwrap();
}

#[test]
fn test_static_and_adaptive_data_dyadic_16() {
    // p = 2^-(i+1) for the first ten symbols, remainder spread on the tail
    let mut probability = vec![0.0f64; 16];
    for (i, p) in probability.iter_mut().take(10).enumerate() {
        *p = 0.5f64.powi(i as i32 + 1);
    }
    let assigned: f64 = probability.iter().sum();
    for p in probability.iter_mut().skip(10) {
        *p = (1.0 - assigned) / 6.0;
    }

    let weighted = WeightedIndex::new(&probability).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let symbols: Vec<u32> = (0..100_000).map(|_| weighted.sample(&mut rng) as u32).collect();

    let mut codec = ArithmeticCodec::with_capacity(0x10000).unwrap();

    let mut static_model = StaticDataModel::new();
    static_model.set_distribution(&probability).unwrap();
    codec.start_encoder().unwrap();
    for &sym in &symbols {
        codec.encode_symbol(&static_model, sym).unwrap();
    }
    let static_bytes = codec.stop_encoder().unwrap();
    codec.start_decoder().unwrap();
    for &sym in &symbols {
        assert_eq!(codec.decode_symbol(&static_model), sym);
    }
    codec.stop_decoder().unwrap();

    let mut adaptive_model = AdaptiveDataModel::new(16).unwrap();
    codec.start_encoder().unwrap();
    for &sym in &symbols {
        codec.encode_adaptive_symbol(&mut adaptive_model, sym).unwrap();
    }
    let adaptive_bytes = codec.stop_encoder().unwrap();
    adaptive_model.reset();
    codec.start_decoder().unwrap();
    for &sym in &symbols {
        assert_eq!(codec.decode_adaptive_symbol(&mut adaptive_model), sym);
    }
    codec.stop_decoder().unwrap();

    let h = entropy(&probability);
    let static_rate = static_bytes as f64 * 8.0 / symbols.len() as f64;
    let adaptive_rate = adaptive_bytes as f64 * 8.0 / symbols.len() as f64;
    // the code cannot beat the source entropy, and the adaptive model
    // converges to within a few percent of it
    assert!(static_rate > h - 0.02, "static rate = {}, H = {}", static_rate, h);
    assert!(static_rate < h + 0.05, "static rate = {}, H = {}", static_rate, h);
    assert!(
        adaptive_rate < h * 1.02 + 0.02,
        "adaptive rate = {}, H = {}",
        adaptive_rate,
        h
    );
}

#[test]
fn test_adaptive_data_geometric_sweep() {
    let cases: &[(usize, f64, usize)] = &[
        (2, 0.35, 60_000),
        (8, 0.6, 60_000),
        (256, 0.97, 120_000),
        (1024, 0.995, 120_000),
    ];
    for &(symbols, ratio, count) in cases {
        let weights = geometric_weights(symbols, ratio);
        let weighted = WeightedIndex::new(&weights).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(symbols as u64);
        let data: Vec<u32> = (0..count).map(|_| weighted.sample(&mut rng) as u32).collect();

        let mut codec = ArithmeticCodec::with_capacity(0x40000).unwrap();
        let mut model = AdaptiveDataModel::new(symbols as u32).unwrap();
        codec.start_encoder().unwrap();
        for &sym in &data {
            codec.encode_adaptive_symbol(&mut model, sym).unwrap();
        }
        let code_bytes = codec.stop_encoder().unwrap();

        // rate stays above the source entropy
        let h = entropy(&weights);
        assert!(
            code_bytes as f64 * 8.0 >= h * count as f64 * 0.98,
            "N = {}: rate below entropy",
            symbols
        );

        model.reset();
        codec.start_decoder().unwrap();
        for &sym in &data {
            assert_eq!(codec.decode_adaptive_symbol(&mut model), sym, "N = {}", symbols);
        }
        codec.stop_decoder().unwrap();
    }
}

#[test]
fn test_static_matches_adaptive_on_stationary_source() {
    let weights = geometric_weights(8, 0.5);
    let weighted = WeightedIndex::new(&weights).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let data: Vec<u32> = (0..50_000).map(|_| weighted.sample(&mut rng) as u32).collect();

    // static model fed with the empirical frequencies of the input
    let mut counts = [0usize; 8];
    for &sym in &data {
        counts[sym as usize] += 1;
    }
    let n = data.len() as f64;
    let probability: Vec<f64> = counts.iter().map(|&c| c as f64 / n).collect();

    let mut static_model = StaticDataModel::new();
    static_model.set_distribution(&probability).unwrap();
    let mut codec = ArithmeticCodec::with_capacity(0x10000).unwrap();
    codec.start_encoder().unwrap();
    for &sym in &data {
        codec.encode_symbol(&static_model, sym).unwrap();
    }
    let static_bytes = codec.stop_encoder().unwrap();
    codec.start_decoder().unwrap();
    for &sym in &data {
        assert_eq!(codec.decode_symbol(&static_model), sym);
    }
    codec.stop_decoder().unwrap();

    let mut adaptive_model = AdaptiveDataModel::new(8).unwrap();
    codec.start_encoder().unwrap();
    for &sym in &data {
        codec.encode_adaptive_symbol(&mut adaptive_model, sym).unwrap();
    }
    let adaptive_bytes = codec.stop_encoder().unwrap();

    // a matched static model should not lose more than 1% to the
    // adaptive one
    assert!(
        static_bytes as f64 <= adaptive_bytes as f64 * 1.01 + 16.0,
        "static = {}, adaptive = {}",
        static_bytes,
        adaptive_bytes
    );
}

#[test]
fn test_put_bits_carry_stress() {
    let mut codec = ArithmeticCodec::with_capacity(0x4000).unwrap();
    codec.start_encoder().unwrap();
    for _ in 0..1000 {
        codec.put_bits(0, 20).unwrap();
        codec.put_bits(0xF_FFFF, 20).unwrap();
    }
    codec.stop_encoder().unwrap();

    codec.start_decoder().unwrap();
    for _ in 0..1000 {
        assert_eq!(codec.get_bits(20), 0);
        assert_eq!(codec.get_bits(20), 0xF_FFFF);
    }
    codec.stop_decoder().unwrap();
}

#[test]
fn test_mixed_operations_round_trip() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let bits: Vec<u32> = (0..50_000).map(|_| u32::from(rng.gen_bool(0.2))).collect();
    let symbols: Vec<u32> = (0..50_000).map(|_| rng.gen_range(0..32u32)).collect();
    let raw: Vec<u32> = (0..10_000).map(|_| rng.gen_range(0..1024u32)).collect();

    let mut codec = ArithmeticCodec::with_capacity(0x20000).unwrap();
    let mut bit_model = AdaptiveBitModel::new();
    let mut data_model = AdaptiveDataModel::new(32).unwrap();

    codec.start_encoder().unwrap();
    for k in 0..50_000usize {
        codec.encode_adaptive_bit(&mut bit_model, bits[k]).unwrap();
        codec
            .encode_adaptive_symbol(&mut data_model, symbols[k])
            .unwrap();
        if k % 5 == 0 {
            codec.put_bits(raw[k / 5], 10).unwrap();
        }
    }
    codec.stop_encoder().unwrap();

    bit_model.reset();
    data_model.reset();
    codec.start_decoder().unwrap();
    for k in 0..50_000usize {
        assert_eq!(codec.decode_adaptive_bit(&mut bit_model), bits[k]);
        assert_eq!(codec.decode_adaptive_symbol(&mut data_model), symbols[k]);
        if k % 5 == 0 {
            assert_eq!(codec.get_bits(10), raw[k / 5]);
        }
    }
    codec.stop_decoder().unwrap();
}
