//! Band-limited sinc resampling, the high quality option.

use crate::resample::{Processed, Resampler};
use crate::sinc::make_sincs;
use crate::windows::WindowFunction;

const SINC_LEN: usize = 64;
const OVERSAMPLING: usize = 128;
const CUTOFF: f64 = 0.95;

/// Resampler interpolating with an oversampled windowed-sinc filter bank.
///
/// The filter is evaluated against a ring of the most recent `SINC_LEN`
/// input samples; output points falling between the precomputed phases are
/// interpolated linearly from the two neighbouring phases. The ring is
/// primed so that output and input are aligned: output sample `k` of a
/// unity-factor stream corresponds to input sample `k`, with only the
/// filter's own rolloff affecting the first and last half kernel.
///
/// The cutoff is scaled by the lowest conversion factor the instance was
/// created for, keeping downsampling band-limited across the whole factor
/// range.
pub struct SincResampler {
    phases: Vec<Vec<f32>>,
    hist: Vec<f32>,
    hist_pos: usize,
    /// Whole and fractional input samples still to pull before the next
    /// output point.
    frac: f64,
    flush_remaining: usize,
    exhausted: bool,
}

impl SincResampler {
    pub fn new(min_factor: f64, max_factor: f64) -> Self {
        assert!(
            min_factor > 0.0 && min_factor <= max_factor && max_factor.is_finite(),
            "factor bounds must be finite, positive and ordered"
        );
        let cutoff = CUTOFF * min_factor.min(1.0);
        debug!(
            "creating sinc resampler for factors {} to {}, cutoff {}",
            min_factor, max_factor, cutoff
        );
        Self {
            phases: make_sincs(SINC_LEN, OVERSAMPLING, cutoff, WindowFunction::BlackmanHarris),
            hist: vec![0.0; SINC_LEN],
            hist_pos: 0,
            frac: (SINC_LEN / 2 + 1) as f64,
            flush_remaining: SINC_LEN / 2,
            exhausted: false,
        }
    }

    fn push(&mut self, sample: f32) {
        self.hist[self.hist_pos] = sample;
        self.hist_pos = (self.hist_pos + 1) % SINC_LEN;
    }

    /// Filter the ring at the fractional offset `frac` in [0, 1).
    fn interpolate(&self, frac: f64) -> f32 {
        let phase = frac * OVERSAMPLING as f64;
        let index = phase as usize;
        let weight = (phase - index as f64) as f32;
        let lower = &self.phases[index];
        let upper = &self.phases[index + 1];
        let mut acc = 0.0f32;
        for j in 0..SINC_LEN {
            let sample = self.hist[(self.hist_pos + j) % SINC_LEN];
            acc += sample * (lower[j] + (upper[j] - lower[j]) * weight);
        }
        acc
    }
}

impl Resampler for SincResampler {
    fn process(
        &mut self,
        factor: f64,
        input: &[f32],
        is_last: bool,
        output: &mut [f32],
    ) -> Processed {
        if self.exhausted {
            return Processed::default();
        }
        debug_assert!(factor.is_finite() && factor > 0.0);
        let step = 1.0 / factor;
        // the final output slot is the caller's read-ahead allowance
        let ceiling = output.len().saturating_sub(1);
        let mut used = 0;
        let mut produced = 0;
        loop {
            while self.frac >= 1.0 {
                if used < input.len() {
                    self.push(input[used]);
                    used += 1;
                } else if is_last && self.flush_remaining > 0 {
                    self.push(0.0);
                    self.flush_remaining -= 1;
                } else {
                    if is_last {
                        trace!("sinc resampler flushed after {} samples", used);
                        self.exhausted = true;
                    }
                    return Processed {
                        input_used: used,
                        output_produced: produced,
                    };
                }
                self.frac -= 1.0;
            }
            if produced == ceiling {
                return Processed {
                    input_used: used,
                    output_produced: produced,
                };
            }
            output[produced] = self.interpolate(self.frac);
            produced += 1;
            self.frac += step;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::resample::{Processed, Resampler};
    use crate::resample_sinc::{SincResampler, SINC_LEN};

    fn sine(len: usize, period: f64) -> Vec<f32> {
        (0..len)
            .map(|n| (2.0 * std::f64::consts::PI * n as f64 / period).sin() as f32)
            .collect()
    }

    #[test]
    fn unity_factor_preserves_count_and_alignment() {
        let input = sine(512, 64.0);
        let mut out = vec![0.0f32; 600];
        let mut resampler = SincResampler::new(1.0, 1.0);
        let result = resampler.process(1.0, &input, true, &mut out);
        assert_eq!(result.input_used, 512);
        assert_eq!(result.output_produced, 512);
        // compare away from the edges where the kernel sees zero padding
        for k in SINC_LEN..512 - SINC_LEN {
            assert!(
                (out[k] - input[k]).abs() < 2e-3,
                "sample {}: {} vs {}",
                k,
                out[k],
                input[k]
            );
        }
    }

    #[test]
    fn dc_gain_is_unity() {
        let input = vec![0.5f32; 400];
        let mut out = vec![0.0f32; 500];
        let mut resampler = SincResampler::new(1.0, 1.0);
        let result = resampler.process(1.0, &input, true, &mut out);
        for k in SINC_LEN..result.output_produced - SINC_LEN {
            assert!((out[k] - 0.5).abs() < 1e-4, "sample {}: {}", k, out[k]);
        }
    }

    #[test]
    fn halving_factor_halves_the_count() {
        let input = sine(1024, 128.0);
        let mut out = vec![0.0f32; 1024];
        let mut resampler = SincResampler::new(0.5, 0.5);
        let result = resampler.process(0.5, &input, true, &mut out);
        let produced = result.output_produced as i64;
        assert!((produced - 512).abs() <= 1, "produced {}", produced);
    }

    #[test]
    fn downsampled_sine_tracks_the_input() {
        let period = 64.0;
        let input = sine(1024, period);
        let mut out = vec![0.0f32; 1024];
        let mut resampler = SincResampler::new(0.5, 0.5);
        let result = resampler.process(0.5, &input, true, &mut out);
        // every output sample sits two input samples apart
        for k in SINC_LEN..result.output_produced - SINC_LEN {
            let expected =
                (2.0 * std::f64::consts::PI * (2 * k) as f64 / period).sin() as f32;
            assert!(
                (out[k] - expected).abs() < 5e-2,
                "sample {}: {} vs {}",
                k,
                out[k],
                expected
            );
        }
    }

    #[test]
    fn streams_in_chunks_without_seams() {
        let input = sine(512, 64.0);
        let mut streamed = Vec::new();
        let mut resampler = SincResampler::new(1.0, 1.0);
        let mut fed = 0;
        while fed < input.len() {
            let end = (fed + 100).min(input.len());
            let mut out = vec![0.0f32; 256];
            let result = resampler.process(1.0, &input[fed..end], end == input.len(), &mut out);
            streamed.extend_from_slice(&out[..result.output_produced]);
            fed += result.input_used;
        }
        assert_eq!(streamed.len(), 512);
        for k in SINC_LEN..512 - SINC_LEN {
            assert!(
                (streamed[k] - input[k]).abs() < 2e-3,
                "sample {}: {} vs {}",
                k,
                streamed[k],
                input[k]
            );
        }
    }

    #[test]
    fn exhausted_after_flush() {
        let input = sine(64, 16.0);
        let mut out = vec![0.0f32; 256];
        let mut resampler = SincResampler::new(1.0, 1.0);
        resampler.process(1.0, &input, true, &mut out);
        let result = resampler.process(1.0, &input, true, &mut out);
        assert_eq!(result, Processed::default());
    }
}
