//! The sample source interface the engine consumes, plus an in-memory
//! implementation.

use crate::envelope::PiecewiseEnvelope;
use crate::error::{MixError, MixResult};

/// Channel designation of an input track, used to derive routing when no
/// explicit [RouteMap](crate::RouteMap) is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Routed to every output channel.
    Mono,
    /// Routed to output channel 0.
    Left,
    /// Routed to output channel 1, or channel 0 of a mono output.
    Right,
}

/// Random access to the float samples and gain envelope of one input track.
///
/// A source covers a single channel of audio. Tracks belonging to one logical
/// multi-channel source appear as a contiguous run of inputs whose length is
/// the [channel_count](SampleSource::channel_count) reported by the run's
/// first track.
pub trait SampleSource {
    /// Fill `buffer` with consecutive samples starting at sample index
    /// `start`.
    ///
    /// Returns `Ok(false)` when the samples are unavailable; the engine then
    /// substitutes silence. An implementation may return an error instead,
    /// but only when `may_throw` is true.
    fn read_floats(&self, start: i64, buffer: &mut [f32], may_throw: bool) -> MixResult<bool>;

    /// Fill `out` with the track's gain envelope evaluated at
    /// `start_time + i / rate`.
    fn envelope_values(&self, out: &mut [f32], start_time: f64);

    /// Native sample rate in Hz.
    fn rate(&self) -> f64;

    /// Channel designation.
    fn channel(&self) -> ChannelKind {
        ChannelKind::Mono
    }

    /// Number of channels in the logical source this track leads.
    ///
    /// Consulted only on the first track of a run.
    fn channel_count(&self) -> usize {
        1
    }

    /// Start of the track's audio, in seconds.
    fn start_time(&self) -> f64;

    /// End of the track's audio, in seconds.
    fn end_time(&self) -> f64;

    /// Gain this track contributes to the given output channel.
    fn channel_gain(&self, channel: usize) -> f32 {
        let _ = channel;
        1.0
    }

    /// Map a time in seconds to a sample index, rounding half up.
    fn time_to_samples(&self, t: f64) -> i64 {
        (t * self.rate() + 0.5).floor() as i64
    }
}

/// An in-memory [SampleSource] backed by a `Vec<f32>`.
///
/// Sample index `time_to_samples(start)` maps to the first stored sample;
/// reads outside the stored range produce silence.
#[derive(Debug, Clone)]
pub struct MemorySource {
    samples: Vec<f32>,
    rate: f64,
    start: f64,
    channel: ChannelKind,
    channel_count: usize,
    gains: Vec<f32>,
    envelope: Option<PiecewiseEnvelope>,
    fail_reads: bool,
}

impl MemorySource {
    pub fn new(samples: Vec<f32>, rate: f64) -> Self {
        assert!(rate > 0.0 && rate.is_finite());
        Self {
            samples,
            rate,
            start: 0.0,
            channel: ChannelKind::Mono,
            channel_count: 1,
            gains: Vec::new(),
            envelope: None,
            fail_reads: false,
        }
    }

    pub fn with_start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    pub fn with_channel(mut self, channel: ChannelKind) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_channel_count(mut self, channel_count: usize) -> Self {
        assert!(channel_count >= 1);
        self.channel_count = channel_count;
        self
    }

    /// Per-output-channel gains; channels past the end of the vector get 1.0.
    pub fn with_gains(mut self, gains: Vec<f32>) -> Self {
        self.gains = gains;
        self
    }

    pub fn with_envelope(mut self, envelope: PiecewiseEnvelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    /// Make every read report its samples as unavailable.
    pub fn failing(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    fn origin(&self) -> i64 {
        self.time_to_samples(self.start)
    }
}

impl SampleSource for MemorySource {
    fn read_floats(&self, start: i64, buffer: &mut [f32], may_throw: bool) -> MixResult<bool> {
        if self.fail_reads {
            if may_throw {
                return Err(MixError::SampleRead {
                    start,
                    len: buffer.len(),
                });
            }
            return Ok(false);
        }
        buffer.fill(0.0);
        let origin = self.origin();
        let first = start - origin;
        let last = first + buffer.len() as i64;
        let stored = self.samples.len() as i64;
        let lo = first.clamp(0, stored);
        let hi = last.clamp(0, stored);
        if lo < hi {
            let offset = (lo - first) as usize;
            buffer[offset..offset + (hi - lo) as usize]
                .copy_from_slice(&self.samples[lo as usize..hi as usize]);
        }
        Ok(true)
    }

    fn envelope_values(&self, out: &mut [f32], start_time: f64) {
        match &self.envelope {
            Some(env) => env.fill(out, start_time, 1.0 / self.rate),
            None => out.fill(1.0),
        }
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn channel(&self) -> ChannelKind {
        self.channel
    }

    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn start_time(&self) -> f64 {
        self.start
    }

    fn end_time(&self) -> f64 {
        self.start + self.samples.len() as f64 / self.rate
    }

    fn channel_gain(&self, channel: usize) -> f32 {
        self.gains.get(channel).copied().unwrap_or(1.0)
    }
}
