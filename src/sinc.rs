use crate::sample::Sample;
use crate::windows::{window_value, WindowFunction};

/// Normalized sinc, sin(pi x) / (pi x).
fn sinc(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        let x = std::f64::consts::PI * value;
        x.sin() / x
    }
}

/// Build an oversampled windowed-sinc interpolation filter bank.
///
/// Returns `oversampling + 1` phases of `npoints` coefficients each. Phase `m`
/// interpolates at the fractional offset `m / oversampling` past coefficient
/// `npoints / 2 - 1`; the extra final phase equals phase zero shifted by one
/// whole sample, so a consumer interpolating between adjacent phases never has
/// to wrap. Every phase is normalized to unity gain at DC.
///
/// `cutoff` is the relative cutoff frequency of the filter, in (0, 1].
pub fn make_sincs<T>(
    npoints: usize,
    oversampling: usize,
    cutoff: f64,
    windowfunc: WindowFunction,
) -> Vec<Vec<T>>
where
    T: Sample,
{
    assert!(npoints >= 4 && npoints % 2 == 0, "filter length must be even");
    assert!(oversampling >= 1);
    assert!(cutoff > 0.0 && cutoff <= 1.0);
    debug!(
        "making {} sinc phases of length {}, cutoff {}, window {:?}",
        oversampling + 1,
        npoints,
        cutoff,
        windowfunc
    );
    let center = (npoints / 2 - 1) as f64;
    let mut phases = Vec::with_capacity(oversampling + 1);
    for m in 0..=oversampling {
        let offset = m as f64 / oversampling as f64;
        let mut coeffs: Vec<f64> = (0..npoints)
            .map(|j| {
                // distance from the interpolation point, in input samples
                let x = j as f64 - center - offset;
                sinc(cutoff * x) * window_value(windowfunc, x / npoints as f64 + 0.5)
            })
            .collect();
        let sum: f64 = coeffs.iter().sum();
        for c in coeffs.iter_mut() {
            *c /= sum;
        }
        phases.push(coeffs.into_iter().map(T::coerce).collect());
    }
    phases
}

#[cfg(test)]
mod tests {
    use crate::sinc::make_sincs;
    use crate::windows::WindowFunction;
    use approx::assert_abs_diff_eq;

    #[test]
    fn phases_and_lengths() {
        let sincs = make_sincs::<f64>(32, 8, 0.95, WindowFunction::BlackmanHarris);
        assert_eq!(sincs.len(), 9);
        assert!(sincs.iter().all(|p| p.len() == 32));
    }

    #[test]
    fn unity_gain_at_dc() {
        let sincs = make_sincs::<f64>(64, 16, 0.9, WindowFunction::Blackman);
        for phase in &sincs {
            let sum: f64 = phase.iter().sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn integer_phase_is_delta_at_full_cutoff() {
        // with cutoff 1.0 the sinc hits exact zeros at the other taps
        let sincs = make_sincs::<f64>(32, 4, 1.0, WindowFunction::BlackmanHarris);
        let phase = &sincs[0];
        for (j, &c) in phase.iter().enumerate() {
            if j == 15 {
                assert_abs_diff_eq!(c, 1.0, epsilon = 1e-9);
            } else {
                assert_abs_diff_eq!(c, 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn last_phase_is_first_phase_shifted() {
        let sincs = make_sincs::<f64>(32, 8, 0.95, WindowFunction::Hann);
        let first = &sincs[0];
        let last = &sincs[8];
        for j in 0..31 {
            assert_abs_diff_eq!(last[j + 1], first[j], epsilon = 1e-9);
        }
    }
}
