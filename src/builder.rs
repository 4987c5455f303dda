use crate::buffer::ticket::TicketBuffer;
use crate::buffer::{DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::error::BufferError;

/// Builder for configuring and constructing a [`TicketBuffer`].
///
/// # Example
/// ```
/// use ticketbuf::BufferBuilder;
///
/// let buffer = BufferBuilder::new().capacity(64).build();
/// assert_eq!(buffer.capacity(), 64);
///
/// assert!(BufferBuilder::new().capacity(48).try_build().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct BufferBuilder {
    capacity: usize,
}

impl BufferBuilder {
    pub fn new() -> Self {
        BufferBuilder {
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Set the number of slots (must be a power of two; default: 16).
    ///
    /// Validation is deferred to [`build`](Self::build) /
    /// [`try_build`](Self::try_build).
    pub fn capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    pub fn try_build(self) -> Result<TicketBuffer, BufferError> {
        TicketBuffer::try_with_capacity(self.capacity)
    }

    /// # Panics
    /// Panics if the configured capacity is invalid.
    pub fn build(self) -> TicketBuffer {
        TicketBuffer::with_capacity(self.capacity)
    }
}

impl Default for BufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that `capacity` is a usable slot count.
pub(crate) fn validate_capacity(capacity: usize) -> Result<usize, BufferError> {
    if capacity == 0 {
        Err(BufferError::ZeroCapacity)
    } else if capacity > MAX_CAPACITY {
        Err(BufferError::TooLarge {
            requested: capacity,
            max: MAX_CAPACITY,
        })
    } else if !capacity.is_power_of_two() {
        Err(BufferError::NotPowerOfTwo(capacity))
    } else {
        Ok(capacity)
    }
}
