use thiserror::Error;

/// The error type returned when mixing fails.
#[derive(Debug, Error)]
pub enum MixError {
    /// Reading samples from an input track failed and the engine was
    /// configured to propagate read errors instead of substituting silence.
    #[error("failed to read {len} samples at index {start} from an input track")]
    SampleRead { start: i64, len: usize },
}

/// A result alias where the error case is [MixError].
pub type MixResult<T> = Result<T, MixError>;
