//! Sample-format conversion with dither.
//!
//! The engine accumulates in 32-bit float and converts to the output format
//! as the last step. Conversions that lose resolution add dither noise so
//! the quantization error decorrelates from the signal.

/// Output sample encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit little endian.
    Int16,
    /// Signed 24-bit little endian, packed in three bytes.
    Int24,
    /// 32-bit float little endian.
    Float,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::Int16 => 2,
            SampleFormat::Int24 => 3,
            SampleFormat::Float => 4,
        }
    }
}

/// Dither applied while quantizing to an integer format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DitherMode {
    /// Plain rounding.
    None,
    /// Triangular-pdf noise of one quantization step peak to peak.
    Triangular,
    /// Triangular noise plus first-order error feedback, pushing the
    /// residual error spectrum out of the lower band.
    Shaped,
}

/// Dither state: xorshift64 noise plus the error feedback for [DitherMode::Shaped].
#[derive(Debug, Clone)]
pub struct Ditherer {
    mode: DitherMode,
    state: u64,
    error: f64,
}

impl Ditherer {
    pub fn new(mode: DitherMode) -> Self {
        Self {
            mode,
            state: 0x853c_49e6_748f_ea9b,
            error: 0.0,
        }
    }

    /// Uniform random value in [-1, 1].
    fn next_rand(&mut self) -> f64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        let r = self.state.wrapping_mul(0x2545_f491_4f6c_dd1d);
        (r as i64 as f64) / (i64::MAX as f64)
    }

    /// Triangular noise in [-1, 1] quantization steps.
    fn noise(&mut self) -> f64 {
        (self.next_rand() + self.next_rand()) * 0.5
    }

    /// Quantize a value already scaled to integer steps.
    fn quantize(&mut self, scaled: f64) -> f64 {
        match self.mode {
            DitherMode::None => scaled.round(),
            DitherMode::Triangular => (scaled + self.noise()).round(),
            DitherMode::Shaped => {
                let target = scaled - self.error;
                let quantized = (target + self.noise()).round();
                self.error = quantized - target;
                quantized
            }
        }
    }
}

/// Convert `src` floats to `format`, writing one sample every `stride`
/// sample slots of `dest`.
///
/// `dest` starts at the first sample's byte offset; interleaved layouts pass
/// the channel's byte offset and a stride of the channel count, planar
/// layouts pass a stride of one.
pub fn convert_samples(
    src: &[f32],
    dest: &mut [u8],
    stride: usize,
    format: SampleFormat,
    dither: &mut Ditherer,
) {
    let bytes = format.bytes_per_sample();
    match format {
        SampleFormat::Float => {
            for (k, &s) in src.iter().enumerate() {
                let o = k * stride * bytes;
                dest[o..o + 4].copy_from_slice(&s.to_le_bytes());
            }
        }
        SampleFormat::Int16 => {
            for (k, &s) in src.iter().enumerate() {
                let o = k * stride * bytes;
                let q = dither.quantize(s as f64 * 32767.0);
                let v = q.clamp(-32768.0, 32767.0) as i16;
                dest[o..o + 2].copy_from_slice(&v.to_le_bytes());
            }
        }
        SampleFormat::Int24 => {
            for (k, &s) in src.iter().enumerate() {
                let o = k * stride * bytes;
                let q = dither.quantize(s as f64 * 8_388_607.0);
                let v = q.clamp(-8_388_608.0, 8_388_607.0) as i32;
                dest[o..o + 3].copy_from_slice(&v.to_le_bytes()[..3]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dither::{convert_samples, DitherMode, Ditherer, SampleFormat};
    use rand::Rng;

    fn read_i16(bytes: &[u8]) -> i16 {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    fn read_i24(bytes: &[u8]) -> i32 {
        // sign extend the packed three bytes
        (i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]])) >> 8
    }

    #[test]
    fn float_output_is_bit_exact() {
        let src = [0.25f32, -1.0, 0.5];
        let mut dest = vec![0u8; 12];
        let mut dither = Ditherer::new(DitherMode::None);
        convert_samples(&src, &mut dest, 1, SampleFormat::Float, &mut dither);
        for (k, &s) in src.iter().enumerate() {
            let v = f32::from_le_bytes(dest[4 * k..4 * k + 4].try_into().unwrap());
            assert_eq!(v, s);
        }
    }

    #[test]
    fn int16_rounding_without_dither() {
        let src = [0.0f32, 1.0, -1.0, 0.5];
        let mut dest = vec![0u8; 8];
        let mut dither = Ditherer::new(DitherMode::None);
        convert_samples(&src, &mut dest, 1, SampleFormat::Int16, &mut dither);
        assert_eq!(read_i16(&dest[0..]), 0);
        assert_eq!(read_i16(&dest[2..]), 32767);
        assert_eq!(read_i16(&dest[4..]), -32767);
        assert_eq!(read_i16(&dest[6..]), 16384); // 16383.5 rounds away from zero
    }

    #[test]
    fn int24_is_packed_little_endian() {
        let src = [1.0f32, -1.0, 0.0];
        let mut dest = vec![0u8; 9];
        let mut dither = Ditherer::new(DitherMode::None);
        convert_samples(&src, &mut dest, 1, SampleFormat::Int24, &mut dither);
        assert_eq!(&dest[0..3], &[0xff, 0xff, 0x7f]);
        assert_eq!(read_i24(&dest[0..]), 8_388_607);
        assert_eq!(read_i24(&dest[3..]), -8_388_607);
        assert_eq!(read_i24(&dest[6..]), 0);
    }

    #[test]
    fn interleaved_stride_leaves_gaps() {
        let src = [0.5f32, 0.5];
        let mut dest = vec![0u8; 8];
        let mut dither = Ditherer::new(DitherMode::None);
        // channel 1 of a two-channel interleaved i16 buffer
        convert_samples(&src, &mut dest[2..], 2, SampleFormat::Int16, &mut dither);
        assert_eq!(read_i16(&dest[0..]), 0);
        assert_eq!(read_i16(&dest[2..]), 16384);
        assert_eq!(read_i16(&dest[4..]), 0);
        assert_eq!(read_i16(&dest[6..]), 16384);
    }

    #[test]
    fn dithered_conversion_error_is_bounded() {
        let mut rng = rand::thread_rng();
        let src: Vec<f32> = (0..2048).map(|_| rng.gen_range(-0.9f32..0.9)).collect();
        for (mode, bound) in [(DitherMode::Triangular, 2.0), (DitherMode::Shaped, 3.5)] {
            let mut dest = vec![0u8; 2 * src.len()];
            let mut dither = Ditherer::new(mode);
            convert_samples(&src, &mut dest, 1, SampleFormat::Int16, &mut dither);
            for (k, &s) in src.iter().enumerate() {
                let v = read_i16(&dest[2 * k..]) as f64;
                let err = (v - s as f64 * 32767.0).abs();
                assert!(err <= bound, "sample {} error {} in mode {:?}", k, err, mode);
            }
        }
    }

    #[test]
    fn triangular_noise_is_zero_mean() {
        let mut dither = Ditherer::new(DitherMode::Triangular);
        let mean: f64 = (0..100_000).map(|_| dither.noise()).sum::<f64>() / 100_000.0;
        assert!(mean.abs() < 0.01, "mean {}", mean);
    }
}
