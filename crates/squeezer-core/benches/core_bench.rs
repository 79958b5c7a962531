//! Criterion benchmarks for squeezer-core
//!
//! Run with: cargo bench -p squeezer-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use squeezer_core::{
    Compressor, Detector, GainComputer, GainStageKind, RingBuffer, SideChain, level_to_decibel,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_gain_computer(c: &mut Criterion) {
    let mut group = c.benchmark_group("GainComputer");

    for knee in [0.0_f32, 6.0] {
        let mut computer = GainComputer::new();
        computer.set_threshold(-20.0);
        computer.set_ratio(4.0);
        computer.set_knee_width(knee);

        group.bench_with_input(BenchmarkId::new("process_gain", knee), &knee, |b, _| {
            b.iter(|| {
                for level in -60..0 {
                    black_box(computer.process_gain(black_box(level as f32)));
                }
            });
        });
    }

    group.finish();
}

fn bench_side_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("SideChain");
    let input: Vec<f32> = generate_test_signal(1024)
        .iter()
        .map(|&s| level_to_decibel(s) + 20.0)
        .collect();

    for detector in Detector::ALL {
        for stage in GainStageKind::ALL {
            let id = format!("{detector}/{stage}");
            group.bench_function(BenchmarkId::new("process_sample", id), |b| {
                let mut side_chain = SideChain::new(SAMPLE_RATE);
                side_chain.set_detector(detector);
                side_chain.set_gain_stage(stage);
                b.iter(|| {
                    for &level in &input {
                        black_box(side_chain.process_sample(black_box(level)));
                    }
                });
            });
        }
    }

    group.finish();
}

fn bench_compressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("Compressor");

    for &block_size in BLOCK_SIZES {
        let signal = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("stereo_block", block_size),
            &block_size,
            |b, _| {
                let mut compressor = Compressor::new(2, SAMPLE_RATE);
                compressor.set_threshold(-20.0);
                compressor.set_ratio(4.0);
                let mut left = signal.clone();
                let mut right = signal.clone();
                b.iter(|| {
                    left.copy_from_slice(&signal);
                    right.copy_from_slice(&signal);
                    compressor.process_block(&mut [&mut left[..], &mut right[..]]);
                    black_box(&left);
                });
            },
        );
    }

    group.finish();
}

fn bench_ring_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("RingBuffer");

    for &block_size in BLOCK_SIZES {
        let input = vec![generate_test_signal(block_size); 2];

        group.bench_with_input(
            BenchmarkId::new("add_remove", block_size),
            &block_size,
            |b, &size| {
                let mut ring = RingBuffer::<f32>::new(2, 4096, 256, 512);
                let mut output = vec![vec![0.0_f32; size]; 2];
                b.iter(|| {
                    ring.add_from(&input, 0, size);
                    ring.remove_to(&mut output, 0, size);
                    black_box(&output);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_gain_computer,
    bench_side_chain,
    bench_compressor,
    bench_ring_buffer
);
criterion_main!(benches);
