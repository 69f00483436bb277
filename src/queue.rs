//! Per-input staging buffer feeding the variable-rate path.

use crate::error::MixResult;
use crate::source::SampleSource;

/// Number of queued samples submitted to the resampler per slice.
pub(crate) const PROCESS_LEN: usize = 1024;
/// Capacity of the staging buffer.
pub(crate) const QUEUE_MAX: usize = 4 * PROCESS_LEN;

/// Staging buffer holding pre-resample samples for one input track.
///
/// The live window is `data[start..start + len]`; refilling compacts the
/// window to offset zero before appending, so `start + len` never exceeds
/// the capacity.
pub(crate) struct SampleQueue {
    data: Vec<f32>,
    start: usize,
    len: usize,
}

impl SampleQueue {
    pub fn new() -> Self {
        Self {
            data: vec![0.0; QUEUE_MAX],
            start: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// The first `n` live samples.
    pub fn window(&self, n: usize) -> &[f32] {
        &self.data[self.start..self.start + n]
    }

    /// Drop the `n` oldest live samples.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len);
        self.start += n;
        self.len -= n;
    }

    pub fn reset(&mut self) {
        self.start = 0;
        self.len = 0;
    }

    /// Top the queue up from `source` until it holds a full processing slice
    /// or the track interval is exhausted.
    ///
    /// Appended samples are multiplied by the gain envelope sampled at the
    /// read range, and reversed in place for backwards playback so the queue
    /// always holds samples in playback order. `pos` advances past the read
    /// range (downwards when backwards).
    pub fn refill(
        &mut self,
        source: &dyn SampleSource,
        pos: &mut i64,
        end_pos: i64,
        backwards: bool,
        env_values: &mut [f32],
        may_throw: bool,
    ) -> MixResult<()> {
        if self.len >= PROCESS_LEN {
            return Ok(());
        }
        self.data.copy_within(self.start..self.start + self.len, 0);
        self.start = 0;
        let remaining = if backwards {
            *pos - end_pos
        } else {
            end_pos - *pos
        };
        let space = QUEUE_MAX - self.len;
        let get_len = usize::try_from(remaining.max(0))
            .unwrap_or(usize::MAX)
            .min(space);
        if get_len == 0 {
            return Ok(());
        }
        let read_start = if backwards { *pos - get_len as i64 } else { *pos };
        let dest = &mut self.data[self.len..self.len + get_len];
        let ok = source.read_floats(read_start, dest, may_throw)?;
        if !ok {
            dest.fill(0.0);
        }
        source.envelope_values(
            &mut env_values[..get_len],
            read_start as f64 / source.rate(),
        );
        for (s, e) in dest.iter_mut().zip(env_values[..get_len].iter()) {
            *s *= e;
        }
        if backwards {
            dest.reverse();
            *pos -= get_len as i64;
        } else {
            *pos += get_len as i64;
        }
        self.len += get_len;
        Ok(())
    }
}
