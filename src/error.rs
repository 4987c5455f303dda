/// Reasons a read buffer cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("capacity must be greater than 0")]
    ZeroCapacity,
    #[error("capacity must be a power of two, got {0}")]
    NotPowerOfTwo(usize),
    #[error("capacity {requested} exceeds the maximum of {max}")]
    TooLarge { requested: usize, max: usize },
}
