extern crate criterion;
use criterion::{criterion_group, criterion_main, Criterion};

use mixdown::{MemorySource, Mixer, MixerConfig, SampleFormat, SampleSource, WarpOptions};

fn noise(len: usize) -> Vec<f32> {
    // cheap deterministic pseudo noise, no RNG needed for throughput numbers
    (0..len)
        .map(|n| (((n as u32).wrapping_mul(2654435761) >> 16) as f32 / 32768.0) - 1.0)
        .collect()
}

fn config(rate: f64) -> MixerConfig {
    MixerConfig {
        channels: 2,
        rate,
        format: SampleFormat::Float,
        interleaved: true,
        buffer_size: 1024,
        high_quality: false,
        apply_gains: true,
        may_throw: false,
    }
}

fn bench_same_rate(c: &mut Criterion) {
    let rate = 44100.0;
    let track = MemorySource::new(noise(44100), rate);
    let seconds = 1.0;
    c.bench_function("mix 1 s same rate", |b| {
        b.iter(|| {
            let inputs: Vec<&dyn SampleSource> = vec![&track];
            let mut mixer = Mixer::new(
                inputs,
                WarpOptions::constant(),
                0.0,
                seconds,
                config(rate),
                None,
            );
            while mixer.process(1024).unwrap() > 0 {}
        })
    });
}

fn bench_resampled(c: &mut Criterion) {
    let rate = 48000.0;
    let track = MemorySource::new(noise(48000), rate);
    let seconds = 1.0;
    c.bench_function("mix 1 s resampled to 44.1k", |b| {
        b.iter(|| {
            let inputs: Vec<&dyn SampleSource> = vec![&track];
            let mut mixer = Mixer::new(
                inputs,
                WarpOptions::constant(),
                0.0,
                seconds,
                config(44100.0),
                None,
            );
            while mixer.process(1024).unwrap() > 0 {}
        })
    });
}

criterion_group!(benches, bench_same_rate, bench_resampled);
criterion_main!(benches);
