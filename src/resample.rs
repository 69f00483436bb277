//! Variable-factor rate conversion.

use crate::resample_linear::LinearResampler;
use crate::resample_sinc::SincResampler;

/// Amounts consumed and produced by one [Resampler::process] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Processed {
    pub input_used: usize,
    pub output_produced: usize,
}

/// A streaming converter between sample rates.
///
/// The conversion factor is output rate over input rate, so a factor above
/// one upsamples. The factor may differ between calls, within the
/// `[min_factor, max_factor]` range the instance was created for;
/// implementations clamp or tolerate excursions.
pub trait Resampler: Send {
    /// Consume up to `input.len()` samples and produce at most
    /// `output.len() - 1` samples.
    ///
    /// The output slice always carries one slot beyond the write ceiling;
    /// an implementation may use that final slot as read-ahead scratch but
    /// must not count a sample written there as produced. Neither count
    /// needs to be reached; the caller keeps unconsumed input around and
    /// presents it again. `is_last` marks the end of the stream so the
    /// implementation can drain any delayed tail. Once a flush has
    /// completed the instance is exhausted and keeps returning
    /// `Processed::default()`; a fresh instance is required to process more
    /// audio.
    fn process(&mut self, factor: f64, input: &[f32], is_last: bool, output: &mut [f32])
        -> Processed;
}

/// Creates the per-track resamplers.
///
/// The engine recreates resamplers through this factory whenever it
/// repositions with a skip, since flushed instances must not be reused.
pub trait ResamplerFactory {
    fn make(&self, high_quality: bool, min_factor: f64, max_factor: f64) -> Box<dyn Resampler>;
}

/// The factory used unless a caller supplies its own: windowed-sinc
/// conversion for high quality, linear interpolation otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResamplerFactory;

impl ResamplerFactory for DefaultResamplerFactory {
    fn make(&self, high_quality: bool, min_factor: f64, max_factor: f64) -> Box<dyn Resampler> {
        if high_quality {
            Box::new(SincResampler::new(min_factor, max_factor))
        } else {
            let _ = (min_factor, max_factor);
            Box::new(LinearResampler::new())
        }
    }
}
