//! An audio mixdown engine for Rust.
//!
//! This library renders a set of input audio tracks into successive blocks
//! of mixed output samples covering a caller-chosen time interval.
//!
//! Each input track is a [SampleSource]: a randomly accessible stream of
//! float samples with a native sample rate, a gain envelope and a channel
//! designation. The [Mixer] pulls samples from every track, applies the
//! envelope, converts between the track and output rates, sums the tracks
//! into the output channels under an optional [RouteMap], and converts the
//! result to the output format with dither.
//!
//! # Playback direction and speed
//!
//! The mixdown interval may run backwards (an end time before the start
//! time plays the audio reversed), and the playback speed can be constant,
//! adjustable within a declared range, or driven by a [BoundedEnvelope]
//! evaluated continuously over the interval. See [WarpOptions].
//!
//! # Rate conversion
//!
//! Rate conversion goes through the [Resampler] trait. Two implementations
//! are included: [LinearResampler], a zero-latency linear interpolator, and
//! [SincResampler], a band-limited sinc interpolator used when the mixer is
//! configured for high quality. Callers with their own converter supply a
//! [ResamplerFactory].
//!
//! # Output layout
//!
//! Output blocks are written either interleaved into a single byte buffer
//! or planar into one buffer per channel, in one of the [SampleFormat]
//! encodings. Conversions that lose resolution are dithered.
//!
//! # Cargo features
//!
//! ## `log`: Enable logging
//!
//! This feature enables logging via the `log` crate, intended for debugging
//! purposes. Logging calls allocate and may block, so the feature should
//! stay disabled in realtime use.
//!
//! # Example
//!
//! Mix a short mono ramp straight through to float output.
//! ```
//! use mixdown::{MemorySource, Mixer, MixerConfig, SampleFormat, SampleSource, WarpOptions};
//! let ramp: Vec<f32> = (0..8).map(|n| n as f32 / 8.0).collect();
//! let track = MemorySource::new(ramp, 44100.0);
//! let inputs: Vec<&dyn SampleSource> = vec![&track];
//! let mut mixer = Mixer::new(
//!     inputs,
//!     WarpOptions::constant(),
//!     0.0,
//!     8.0 / 44100.0,
//!     MixerConfig {
//!         channels: 1,
//!         rate: 44100.0,
//!         format: SampleFormat::Float,
//!         buffer_size: 8,
//!         apply_gains: false,
//!         ..MixerConfig::default()
//!     },
//!     None,
//! );
//! let produced = mixer.process(8).unwrap();
//! assert_eq!(produced, 8);
//! ```

#[cfg(feature = "log")]
extern crate log;

// Logging wrapper macros to avoid cluttering the code with conditionals
#[allow(unused)]
macro_rules! trace { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::trace!($($x)*)
    }
) }
#[allow(unused)]
macro_rules! debug { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::debug!($($x)*)
    }
) }
#[allow(unused)]
macro_rules! info { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::info!($($x)*)
    }
) }
#[allow(unused)]
macro_rules! warn { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::warn!($($x)*)
    }
) }
#[allow(unused)]
macro_rules! error { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::error!($($x)*)
    }
) }

mod dither;
mod envelope;
mod error;
mod mix;
mod queue;
mod resample;
mod resample_linear;
mod resample_sinc;
mod routing;
mod sample;
mod sinc;
mod source;
mod warp;
mod windows;

pub use crate::dither::{convert_samples, DitherMode, Ditherer, SampleFormat};
pub use crate::envelope::{BoundedEnvelope, PiecewiseEnvelope};
pub use crate::error::{MixError, MixResult};
pub use crate::mix::{Mixer, MixerConfig};
pub use crate::resample::{DefaultResamplerFactory, Processed, Resampler, ResamplerFactory};
pub use crate::resample_linear::LinearResampler;
pub use crate::resample_sinc::SincResampler;
pub use crate::routing::RouteMap;
pub use crate::sample::Sample;
pub use crate::source::{ChannelKind, MemorySource, SampleSource};
pub use crate::warp::{ResampleParameters, WarpOptions};
pub use crate::windows::{make_window, window_value, WindowFunction};

#[cfg(test)]
mod tests {
    use crate::{
        DefaultResamplerFactory, LinearResampler, Processed, Resampler, ResamplerFactory,
        SincResampler,
    };

    // This tests that a Resampler can be used as a boxed trait object.
    #[test]
    fn boxed_resampler() {
        for high_quality in [false, true] {
            let boxed = DefaultResamplerFactory.make(high_quality, 0.5, 2.0);
            let result = process_with_boxed(boxed);
            assert!(result.output_produced > 0);
        }
    }

    fn process_with_boxed(mut resampler: Box<dyn Resampler>) -> Processed {
        let waves = vec![0.5f32; 256];
        let mut out = vec![0.0f32; 512];
        resampler.process(1.0, &waves, true, &mut out)
    }

    fn impl_send<T: Send>() {
        fn is_send<T: Send>() {}
        is_send::<LinearResampler>();
        is_send::<SincResampler>();
        is_send::<T>();
    }

    // This tests that the built-in resamplers are Send.
    #[test]
    fn test_impl_send() {
        impl_send::<Box<dyn Resampler>>();
    }
}
