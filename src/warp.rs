//! Time-warp configuration and per-slice warp evaluation.

use crate::envelope::BoundedEnvelope;

/// How playback speed varies over a mixdown session.
///
/// Either an envelope drives the speed, or a `(min, max)` speed range
/// declares that the speed may be changed between `[set_times_and_speed]`
/// calls, or neither and the rate is constant.
///
/// [set_times_and_speed]: crate::Mixer::set_times_and_speed
#[derive(Clone, Copy)]
pub struct WarpOptions<'a> {
    envelope: Option<&'a dyn BoundedEnvelope>,
    min_speed: f64,
    max_speed: f64,
    initial_speed: f64,
}

impl<'a> WarpOptions<'a> {
    /// Speed driven by an envelope.
    pub fn envelope(envelope: &'a dyn BoundedEnvelope) -> Self {
        assert!(
            envelope.range_lower() > 0.0 && envelope.range_upper() >= envelope.range_lower(),
            "warp envelope range must be positive and ordered"
        );
        Self {
            envelope: Some(envelope),
            min_speed: 0.0,
            max_speed: 0.0,
            initial_speed: 1.0,
        }
    }

    /// Adjustable speed within `[min_speed, max_speed]`.
    pub fn speed_range(min_speed: f64, max_speed: f64) -> Self {
        assert!(
            min_speed >= 0.0 && max_speed >= min_speed && max_speed.is_finite(),
            "speed range must satisfy 0 <= min <= max"
        );
        Self {
            envelope: None,
            min_speed,
            max_speed,
            initial_speed: 1.0,
        }
    }

    /// Constant playback rate.
    pub fn constant() -> Self {
        Self {
            envelope: None,
            min_speed: 0.0,
            max_speed: 0.0,
            initial_speed: 1.0,
        }
    }

    pub fn with_initial_speed(mut self, speed: f64) -> Self {
        assert!(speed.is_finite() && speed > 0.0);
        self.initial_speed = speed;
        self
    }

    pub(crate) fn envelope_ref(&self) -> Option<&'a dyn BoundedEnvelope> {
        self.envelope
    }

    pub(crate) fn initial_speed(&self) -> f64 {
        self.initial_speed
    }

    /// True when the rate conversion factor can change while mixing.
    pub(crate) fn is_variable(&self) -> bool {
        self.envelope.is_some() || (self.min_speed > 0.0 && self.max_speed > 0.0)
    }
}

impl Default for WarpOptions<'_> {
    fn default() -> Self {
        Self::constant()
    }
}

/// Resampling factor bounds for one input track.
///
/// The factor is output rate over track rate; with a warp in play it is
/// further divided by the playback speed, so the bounds divide the nominal
/// ratio by the effective speed range.
#[derive(Debug, Clone, Copy)]
pub struct ResampleParameters {
    pub min_factor: f64,
    pub max_factor: f64,
}

impl ResampleParameters {
    pub(crate) fn for_track(track_rate: f64, out_rate: f64, warp: &WarpOptions) -> Self {
        let factor = out_rate / track_rate;
        let (min_factor, max_factor) = if let Some(env) = warp.envelope {
            (factor / env.range_upper(), factor / env.range_lower())
        } else if warp.min_speed > 0.0 && warp.max_speed > 0.0 {
            (factor / warp.max_speed, factor / warp.min_speed)
        } else {
            (factor, factor)
        };
        assert!(
            min_factor > 0.0 && min_factor <= max_factor && max_factor.is_finite(),
            "resample factors must be finite, positive and ordered"
        );
        Self {
            min_factor,
            max_factor,
        }
    }
}

/// Average warp factor for one processing slice.
///
/// The envelope is averaged over the slice's forward-time span: for
/// backwards playback the slice covers the track time just *before* `t`,
/// shifted up by one sample period so the interval ends at the sample
/// last fetched.
pub(crate) fn slice_warp_factor(
    envelope: &dyn BoundedEnvelope,
    t: f64,
    slice_len: usize,
    track_rate: f64,
    backwards: bool,
) -> f64 {
    let tstep = 1.0 / track_rate;
    let span = slice_len as f64 * tstep;
    if backwards {
        envelope.average_of_inverse(t - span + tstep, t + tstep)
    } else {
        envelope.average_of_inverse(t, t + span)
    }
}
