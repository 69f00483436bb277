use num_traits::Float;

/// Helper trait for converting values of other types into a sample type.
pub trait CoerceFrom<V> {
    fn coerce_from(value: V) -> Self;
}

/// The trait governing a single sample.
///
/// There are two types which implements this trait, [f32] and [f64].
pub trait Sample
where
    Self: Float + CoerceFrom<usize> + CoerceFrom<f64> + Send + 'static,
{
    const PI: Self;

    /// Convert the given value into this sample type.
    fn coerce<V>(value: V) -> Self
    where
        Self: CoerceFrom<V>,
    {
        Self::coerce_from(value)
    }
}

impl CoerceFrom<usize> for f32 {
    fn coerce_from(value: usize) -> Self {
        value as f32
    }
}

impl CoerceFrom<f64> for f32 {
    fn coerce_from(value: f64) -> Self {
        value as f32
    }
}

impl CoerceFrom<usize> for f64 {
    fn coerce_from(value: usize) -> Self {
        value as f64
    }
}

impl CoerceFrom<f64> for f64 {
    fn coerce_from(value: f64) -> Self {
        value
    }
}

impl Sample for f32 {
    const PI: Self = std::f32::consts::PI;
}

impl Sample for f64 {
    const PI: Self = std::f64::consts::PI;
}
