extern crate mixdown;
use mixdown::{
    ChannelKind, MemorySource, Mixer, MixerConfig, SampleFormat, SampleSource, WarpOptions,
};
use std::env;
use std::fs::File;
use std::io::prelude::Write;
use std::time::Instant;

fn sine(freq: f64, rate: f64, seconds: f64) -> Vec<f32> {
    let len = (rate * seconds) as usize;
    (0..len)
        .map(|n| (2.0 * std::f64::consts::PI * freq * n as f64 / rate).sin() as f32 * 0.5)
        .collect()
}

/// Mix a stereo pair of test tones down to interleaved 16-bit output and
/// write the raw frames to a file.
fn main() {
    let _ = env_logger::try_init();

    let file_out = env::args().nth(1).expect("Please specify an output file.");
    let rate = 44100.0;
    let seconds = 1.0;

    let left = MemorySource::new(sine(440.0, rate, seconds), rate)
        .with_channel(ChannelKind::Left)
        .with_channel_count(2);
    let right = MemorySource::new(sine(660.0, rate, seconds), rate)
        .with_channel(ChannelKind::Right);

    let inputs: Vec<&dyn SampleSource> = vec![&left, &right];
    let buffer_size = 1024;
    let mut mixer = Mixer::new(
        inputs,
        WarpOptions::constant(),
        0.0,
        seconds,
        MixerConfig {
            channels: 2,
            rate,
            format: SampleFormat::Int16,
            interleaved: true,
            buffer_size,
            high_quality: true,
            apply_gains: false,
            may_throw: false,
        },
        None,
    );

    let mut f_out = File::create(file_out).expect("Can't create file");
    let start = Instant::now();
    let mut frames = 0usize;
    loop {
        let produced = mixer.process(buffer_size).expect("mixdown failed");
        if produced == 0 {
            break;
        }
        frames += produced;
        let bytes = produced * 2 * SampleFormat::Int16.bytes_per_sample();
        f_out
            .write_all(&mixer.buffer()[..bytes])
            .expect("Can't write output");
    }
    let duration = start.elapsed();

    println!("Mixed {} frames in {:?}", frames, duration);
}
