//! The mixdown engine: per-track pipelines feeding summed output channels.
//!
//! A [Mixer] owns one track mixer per input. Each `process` call asks every
//! input for up to a block of samples, sums the per-track results into float
//! accumulators under the routing and gain rules, and converts the
//! accumulated floats to the output format with dither.

use crate::dither::{convert_samples, DitherMode, Ditherer, SampleFormat};
use crate::envelope::BoundedEnvelope;
use crate::error::MixResult;
use crate::queue::{SampleQueue, PROCESS_LEN, QUEUE_MAX};
use crate::resample::{DefaultResamplerFactory, Resampler, ResamplerFactory};
use crate::routing::RouteMap;
use crate::source::{ChannelKind, SampleSource};
use crate::warp::{slice_warp_factor, ResampleParameters, WarpOptions};

/// Static output configuration of a [Mixer].
#[derive(Debug, Clone)]
pub struct MixerConfig {
    /// Number of output channels.
    pub channels: usize,
    /// Output sample rate in Hz.
    pub rate: f64,
    /// Output sample encoding.
    pub format: SampleFormat,
    /// One interleaved buffer instead of a buffer per channel.
    pub interleaved: bool,
    /// Largest block a single `process` call can produce.
    pub buffer_size: usize,
    /// Use the high quality resampler and shaped dither.
    pub high_quality: bool,
    /// Apply per-track channel gains while summing.
    pub apply_gains: bool,
    /// Propagate sample read errors instead of substituting silence.
    pub may_throw: bool,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            rate: 44100.0,
            format: SampleFormat::Float,
            interleaved: true,
            buffer_size: 1024,
            high_quality: false,
            apply_gains: true,
            may_throw: false,
        }
    }
}

/// Per-input pipeline: fetch, envelope-multiply, reverse, resample.
struct TrackMixer<'a> {
    source: &'a dyn SampleSource,
    /// Sample index of the next read boundary.
    pos: i64,
    queue: SampleQueue,
    resampler: Box<dyn Resampler>,
    params: ResampleParameters,
    /// This input needs the resampling path: its rate differs from the
    /// output rate or the warp configuration is not constant.
    variable_rates: bool,
}

impl<'a> TrackMixer<'a> {
    fn t_end(&self, backwards: bool, t1: f64) -> f64 {
        if backwards {
            self.source.start_time().max(t1)
        } else {
            self.source.end_time().min(t1)
        }
    }

    /// Copy samples straight from the source when no rate conversion is
    /// needed.
    ///
    /// `max_out` is the write ceiling; `out` carries at least one slot
    /// beyond it.
    fn mix_same_rate(
        &mut self,
        backwards: bool,
        t1: f64,
        may_throw: bool,
        env_values: &mut [f32],
        max_out: usize,
        out: &mut [f32],
    ) -> MixResult<usize> {
        debug_assert!(out.len() > max_out);
        let rate = self.source.rate();
        let t = self.pos as f64 / rate;
        let t_end = self.t_end(backwards, t1);
        if backwards {
            if t <= t_end {
                return Ok(0);
            }
        } else if t >= t_end {
            return Ok(0);
        }
        let span = if backwards { t - t_end } else { t_end - t };
        let slen = max_out.min((span * rate + 0.5).floor() as usize);
        if slen == 0 {
            return Ok(0);
        }
        let read_start = if backwards {
            self.pos - slen as i64
        } else {
            self.pos
        };
        let dest = &mut out[..slen];
        let ok = self.source.read_floats(read_start, dest, may_throw)?;
        if !ok {
            dest.fill(0.0);
        }
        self.source
            .envelope_values(&mut env_values[..slen], read_start as f64 / rate);
        for (s, e) in dest.iter_mut().zip(env_values[..slen].iter()) {
            *s *= e;
        }
        if backwards {
            dest.reverse();
            self.pos -= slen as i64;
        } else {
            self.pos += slen as i64;
        }
        Ok(slen)
    }

    /// Produce output through the queue and the resampler, re-evaluating the
    /// warp factor per processing slice.
    ///
    /// `max_out` is the write ceiling; `out` carries at least one slot
    /// beyond it, and the resampler is always handed that extra slot.
    #[allow(clippy::too_many_arguments)]
    fn mix_variable_rates(
        &mut self,
        backwards: bool,
        t1: f64,
        out_rate: f64,
        speed: f64,
        envelope: Option<&dyn BoundedEnvelope>,
        may_throw: bool,
        env_values: &mut [f32],
        max_out: usize,
        out: &mut [f32],
    ) -> MixResult<usize> {
        debug_assert!(out.len() > max_out);
        let rate = self.source.rate();
        let initial_warp = out_rate / speed / rate;
        let t_end = self.t_end(backwards, t1);
        let end_pos = self.source.time_to_samples(t_end);
        let queued = self.queue.len() as f64;
        let mut t = (self.pos as f64 + if backwards { queued } else { -queued }) / rate;
        let mut written = 0;
        while written < max_out {
            self.queue
                .refill(self.source, &mut self.pos, end_pos, backwards, env_values, may_throw)?;
            let slice = self.queue.len().min(PROCESS_LEN);
            let is_last = self.queue.len() < PROCESS_LEN;
            let mut factor = initial_warp;
            if let Some(env) = envelope {
                factor *= slice_warp_factor(env, t, slice, rate, backwards)
                    .clamp(self.params.min_factor, self.params.max_factor);
            }
            let input = self.queue.window(slice);
            let result = self
                .resampler
                .process(factor, input, is_last, &mut out[written..max_out + 1]);
            self.queue.consume(result.input_used);
            written += result.output_produced;
            let advanced = result.input_used as f64 / rate;
            t += if backwards { -advanced } else { advanced };
            if is_last {
                break;
            }
        }
        debug_assert!(written <= max_out);
        Ok(written)
    }
}

/// The mixdown engine.
///
/// Constructed once per session with the full set of inputs; inputs are not
/// added or removed afterwards. Tracks and the warp envelope are borrowed
/// for the engine's lifetime.
pub struct Mixer<'a> {
    tracks: Vec<TrackMixer<'a>>,
    num_channels: usize,
    rate: f64,
    format: SampleFormat,
    interleaved: bool,
    buffer_size: usize,
    high_quality: bool,
    apply_gains: bool,
    may_throw: bool,
    envelope: Option<&'a dyn BoundedEnvelope>,
    speed: f64,
    t0: f64,
    t1: f64,
    time: f64,
    route_map: Option<RouteMap>,
    factory: Box<dyn ResamplerFactory + 'a>,
    /// Per-channel float accumulators.
    accum: Vec<Vec<f32>>,
    /// Per-track-channel scratch. One slot past the block size: some
    /// resampler backends read one element beyond the write window.
    scratch: [Vec<f32>; 2],
    env_values: Vec<f32>,
    out_buffers: Vec<Vec<u8>>,
    dither: Ditherer,
}

impl<'a> Mixer<'a> {
    /// Create a mixer over `inputs`, covering `[t0, t1]` (or `[t1, t0]`
    /// reversed when `t1 < t0`).
    ///
    /// `route_map` is honored only when its channel count matches the output
    /// channel count and its track count matches the number of inputs;
    /// otherwise routing derives from the tracks' channel designations.
    pub fn new(
        inputs: Vec<&'a dyn SampleSource>,
        warp: WarpOptions<'a>,
        t0: f64,
        t1: f64,
        config: MixerConfig,
        route_map: Option<RouteMap>,
    ) -> Self {
        Self::with_factory(
            inputs,
            warp,
            t0,
            t1,
            config,
            route_map,
            Box::new(DefaultResamplerFactory),
        )
    }

    /// Like [new](Mixer::new), with a custom resampler factory.
    pub fn with_factory(
        inputs: Vec<&'a dyn SampleSource>,
        warp: WarpOptions<'a>,
        t0: f64,
        t1: f64,
        config: MixerConfig,
        route_map: Option<RouteMap>,
        factory: Box<dyn ResamplerFactory + 'a>,
    ) -> Self {
        assert!(config.channels > 0, "at least one output channel");
        assert!(config.buffer_size > 0, "a positive buffer size");
        assert!(config.rate.is_finite() && config.rate > 0.0);
        assert!(t0.is_finite() || t1.is_finite());
        let variable_warp = warp.is_variable();
        let route_map = route_map.filter(|m| {
            m.num_channels() == config.channels && m.num_tracks() == inputs.len()
        });
        let tracks: Vec<TrackMixer<'a>> = inputs
            .into_iter()
            .map(|source| {
                let params = ResampleParameters::for_track(source.rate(), config.rate, &warp);
                TrackMixer {
                    source,
                    pos: 0,
                    queue: SampleQueue::new(),
                    resampler: factory.make(
                        config.high_quality,
                        params.min_factor,
                        params.max_factor,
                    ),
                    params,
                    variable_rates: variable_warp || source.rate() != config.rate,
                }
            })
            .collect();
        debug!(
            "mixing {} inputs into {} channels at {} Hz, block size {}",
            tracks.len(),
            config.channels,
            config.rate,
            config.buffer_size
        );
        let b = config.buffer_size;
        let c = config.channels;
        let bytes = config.format.bytes_per_sample();
        let out_buffers = if config.interleaved {
            vec![vec![0u8; b * c * bytes]]
        } else {
            vec![vec![0u8; b * bytes]; c]
        };
        let dither_mode = match config.format {
            SampleFormat::Float => DitherMode::None,
            _ if config.high_quality => DitherMode::Shaped,
            _ => DitherMode::Triangular,
        };
        let mut mixer = Mixer {
            tracks,
            num_channels: c,
            rate: config.rate,
            format: config.format,
            interleaved: config.interleaved,
            buffer_size: b,
            high_quality: config.high_quality,
            apply_gains: config.apply_gains,
            may_throw: config.may_throw,
            envelope: warp.envelope_ref(),
            speed: warp.initial_speed().abs(),
            t0,
            t1,
            time: t0,
            route_map,
            factory,
            accum: vec![vec![0.0; b]; c],
            scratch: [vec![0.0; b + 1], vec![0.0; b + 1]],
            env_values: vec![0.0; QUEUE_MAX.max(b)],
            out_buffers,
            dither: Ditherer::new(dither_mode),
        };
        mixer.reposition(t0, false);
        mixer
    }

    /// Produce the next block of up to `max_to_process` output samples.
    ///
    /// Returns the number of samples written to the output buffer(s), which
    /// falls short of `max_to_process` only when the mixdown interval or
    /// every track is exhausted. Subsequent calls then return zero.
    pub fn process(&mut self, max_to_process: usize) -> MixResult<usize> {
        assert!(
            max_to_process <= self.buffer_size,
            "block of {} exceeds the buffer size {}",
            max_to_process,
            self.buffer_size
        );
        let backwards = self.t1 < self.t0;
        for channel in self.accum.iter_mut() {
            channel.fill(0.0);
        }
        let mut max_out = 0usize;
        let mut new_time = if backwards { f64::MAX } else { f64::MIN };

        let mut i = 0;
        while i < self.tracks.len() {
            let n_in = self.tracks[i]
                .source
                .channel_count()
                .max(1)
                .min(self.tracks.len() - i);
            // TODO: more than two channels per track group
            let n_mix = n_in.min(2);
            let mut mixed = [0usize; 2];
            for j in 0..n_mix {
                let track = &mut self.tracks[i + j];
                // one slot past the ceiling, for the resampler's read-ahead
                let out = &mut self.scratch[j][..max_to_process + 1];
                let n = if track.variable_rates {
                    track.mix_variable_rates(
                        backwards,
                        self.t1,
                        self.rate,
                        self.speed,
                        self.envelope,
                        self.may_throw,
                        &mut self.env_values,
                        max_to_process,
                        out,
                    )?
                } else {
                    track.mix_same_rate(
                        backwards,
                        self.t1,
                        self.may_throw,
                        &mut self.env_values,
                        max_to_process,
                        out,
                    )?
                };
                mixed[j] = n;
                max_out = max_out.max(n);
                let t = track.pos as f64 / track.source.rate();
                new_time = if backwards {
                    new_time.min(t)
                } else {
                    new_time.max(t)
                };
            }
            for j in 0..n_mix {
                let track = &self.tracks[i + j];
                let mut gains = vec![1.0f32; self.num_channels];
                if self.apply_gains {
                    for (c, gain) in gains.iter_mut().enumerate() {
                        *gain = track.source.channel_gain(c);
                    }
                }
                let flags = self.channel_flags(i + j, track.source.channel());
                for (c, &flag) in flags.iter().enumerate() {
                    if !flag {
                        continue;
                    }
                    let gain = gains[c];
                    for (acc, &s) in self.accum[c][..mixed[j]]
                        .iter_mut()
                        .zip(self.scratch[j][..mixed[j]].iter())
                    {
                        *acc += gain * s;
                    }
                }
            }
            i += n_in;
        }

        self.time = if backwards {
            new_time.clamp(self.t1, self.time)
        } else {
            new_time.clamp(self.time, self.t1)
        };

        let bytes = self.format.bytes_per_sample();
        if self.interleaved {
            for c in 0..self.num_channels {
                convert_samples(
                    &self.accum[c][..max_out],
                    &mut self.out_buffers[0][c * bytes..],
                    self.num_channels,
                    self.format,
                    &mut self.dither,
                );
            }
        } else {
            for c in 0..self.num_channels {
                convert_samples(
                    &self.accum[c][..max_out],
                    &mut self.out_buffers[c],
                    1,
                    self.format,
                    &mut self.dither,
                );
            }
        }
        Ok(max_out)
    }

    /// Routing flags for one input track across the output channels.
    fn channel_flags(&self, track_index: usize, kind: ChannelKind) -> Vec<bool> {
        if let Some(map) = &self.route_map {
            return map.row(track_index).to_vec();
        }
        let mut flags = vec![false; self.num_channels];
        match kind {
            ChannelKind::Mono => flags.fill(true),
            ChannelKind::Left => flags[0] = true,
            ChannelKind::Right => {
                if self.num_channels > 1 {
                    flags[1] = true;
                } else {
                    flags[0] = true;
                }
            }
        }
        flags
    }

    /// The output buffer. With an interleaved layout this is the single
    /// buffer of `buffer_size * channels` samples; with a planar layout it
    /// is channel zero's buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.out_buffers[0]
    }

    /// The output buffer for one channel of a planar layout.
    pub fn channel_buffer(&self, channel: usize) -> &[u8] {
        if self.interleaved {
            &self.out_buffers[0]
        } else {
            &self.out_buffers[channel]
        }
    }

    /// The time the mixdown has reached, in seconds.
    pub fn current_time(&self) -> f64 {
        self.time
    }

    /// The largest block `process` accepts.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Jump to time `t` (clamped into the mixdown interval) and restart
    /// every input pipeline there.
    ///
    /// `skipping` discards and recreates the resamplers; required when the
    /// jump follows a completed mixdown, since flushed resamplers must not
    /// be reused.
    pub fn reposition(&mut self, t: f64, skipping: bool) {
        let (lo, hi) = if self.t0 < self.t1 {
            (self.t0, self.t1)
        } else {
            (self.t1, self.t0)
        };
        self.time = t.clamp(lo, hi);
        trace!("repositioning to {} (skipping: {})", self.time, skipping);
        for track in self.tracks.iter_mut() {
            track.pos = track.source.time_to_samples(self.time);
            track.queue.reset();
        }
        if skipping {
            for track in self.tracks.iter_mut() {
                track.resampler = self.factory.make(
                    self.high_quality,
                    track.params.min_factor,
                    track.params.max_factor,
                );
            }
        }
    }

    /// Change the mixdown interval and playback speed, then reposition to
    /// `t0`.
    pub fn set_times_and_speed(&mut self, t0: f64, t1: f64, speed: f64, skipping: bool) {
        assert!(speed.is_finite(), "playback speed must be finite");
        self.t0 = t0;
        self.t1 = t1;
        self.speed = speed.abs();
        self.reposition(t0, skipping);
    }

    /// Adjust the speed during keyboard scrubbing.
    ///
    /// When the sign of `speed` disagrees with the current direction, the
    /// interval is flipped open-ended in the new direction (the engine never
    /// reads outside the tracks anyway) and the pipelines restart at
    /// `start_time`.
    pub fn set_speed_for_keyboard_scrubbing(&mut self, speed: f64, start_time: f64) {
        assert!(speed.is_finite(), "playback speed must be finite");
        if (speed > 0.0 && self.t1 < self.t0) || (speed < 0.0 && self.t1 > self.t0) {
            if speed > 0.0 {
                self.t0 = 0.0;
                self.t1 = f64::MAX;
            } else {
                self.t0 = f64::MAX;
                self.t1 = 0.0;
            }
            self.reposition(start_time, true);
        }
        self.speed = speed.abs();
    }

    #[cfg(test)]
    pub(crate) fn track_pos(&self, track: usize) -> i64 {
        self.tracks[track].pos
    }
}
