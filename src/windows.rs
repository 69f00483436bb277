use crate::sample::Sample;

/// Window functions that can be used to shape the sinc interpolation filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFunction {
    /// Blackman. Intermediate rolloff and intermediate attenuation.
    Blackman,
    /// Blackman-Harris. Slow rolloff but good attenuation.
    BlackmanHarris,
    /// Hann. Fast rolloff but not very high attenuation.
    Hann,
}

impl WindowFunction {
    /// Cosine series coefficients, alternating in sign.
    fn coefficients(self) -> &'static [f64] {
        match self {
            WindowFunction::Blackman => &[0.42, 0.5, 0.08],
            WindowFunction::BlackmanHarris => &[0.35875, 0.48829, 0.14128, 0.01168],
            WindowFunction::Hann => &[0.5, 0.5],
        }
    }
}

/// Evaluate the window at `position`, where the window spans [0, 1] and peaks at 0.5.
pub fn window_value<T>(windowfunc: WindowFunction, position: T) -> T
where
    T: Sample,
{
    let two_pi = T::coerce(2.0) * T::PI;
    let mut value = T::zero();
    let mut sign = T::one();
    for (k, &c) in windowfunc.coefficients().iter().enumerate() {
        value = value + sign * T::coerce(c) * (T::coerce(k) * two_pi * position).cos();
        sign = -sign;
    }
    value
}

/// Make the selected window function with `npoints` points.
pub fn make_window<T>(npoints: usize, windowfunc: WindowFunction) -> Vec<T>
where
    T: Sample,
{
    trace!("making a {:?} window with {} points", windowfunc, npoints);
    let np = T::coerce(npoints);
    (0..npoints)
        .map(|x| window_value(windowfunc, T::coerce(x) / np))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::windows::{make_window, window_value, WindowFunction};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_blackman_harris() {
        let wnd = make_window::<f64>(16, WindowFunction::BlackmanHarris);
        assert_abs_diff_eq!(wnd[8], 1.0, epsilon = 0.000001);
        assert!(wnd[0] < 0.001);
        assert!(wnd[15] < 0.1);
    }

    #[test]
    fn test_blackman() {
        let wnd = make_window::<f64>(16, WindowFunction::Blackman);
        assert_abs_diff_eq!(wnd[8], 1.0, epsilon = 0.000001);
        assert!(wnd[0] < 0.000001);
        assert!(wnd[15] < 0.1);
    }

    #[test]
    fn test_hann() {
        let wnd = make_window::<f64>(16, WindowFunction::Hann);
        assert_abs_diff_eq!(wnd[8], 1.0, epsilon = 0.000001);
        assert!(wnd[0] < 0.000001);
        assert!(wnd[15] < 0.1);
    }

    #[test]
    fn test_window_value_matches_table() {
        for windowfunc in [
            WindowFunction::Blackman,
            WindowFunction::BlackmanHarris,
            WindowFunction::Hann,
        ] {
            let wnd = make_window::<f64>(32, windowfunc);
            for (x, &w) in wnd.iter().enumerate() {
                let v = window_value(windowfunc, x as f64 / 32.0);
                assert_abs_diff_eq!(v, w, epsilon = 1e-12);
            }
        }
    }
}
