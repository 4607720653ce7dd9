//! Render-path benchmarks.
//!
//! Run with: cargo bench -p ss-engine --bench engine_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ss_engine::{AdsrParams, Delay, Engine, Frame, LowPass, Octave, Waveform};

const SAMPLE_RATE: f32 = 44_100.0;
const BLOCK: usize = 512;

fn held_engine(effects: usize) -> Engine {
    let mut engine = Engine::with_seed(SAMPLE_RATE, 1);
    engine.update_adsr(AdsrParams::new(0.01, 0.1, 0.8, 0.3));
    engine.configure_secondary_oscillator(true, 0.3, 7.0, -1);
    if effects > 0 {
        engine.add_effect(LowPass::new(1200.0, SAMPLE_RATE));
    }
    if effects > 1 {
        engine.add_effect(Delay::new(0.3, 0.5, 0.4, SAMPLE_RATE));
    }
    if effects > 2 {
        engine.add_effect(Octave::default());
    }
    engine.trigger(220.0);
    engine
}

fn bench_next_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_sample");
    group.throughput(Throughput::Elements(BLOCK as u64));

    for effects in [0usize, 1, 3] {
        group.bench_with_input(BenchmarkId::new("effects", effects), &effects, |b, &n| {
            let mut engine = held_engine(n);
            let mut block = [Frame::silence(); BLOCK];
            b.iter(|| {
                engine.render(&mut block);
                black_box(&block);
            })
        });
    }

    group.finish();
}

fn bench_waveforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("waveform");
    for waveform in [Waveform::Sine, Waveform::Square, Waveform::Sawtooth, Waveform::Triangle] {
        group.bench_function(waveform.name(), |b| {
            let mut phase = 0.0;
            b.iter(|| {
                let mut acc = 0.0;
                for _ in 0..BLOCK {
                    acc += waveform.generate(black_box(440.0), SAMPLE_RATE, &mut phase);
                }
                black_box(acc)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_next_sample, bench_waveforms);
criterion_main!(benches);
