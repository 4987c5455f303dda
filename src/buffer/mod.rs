//! Read buffers: lossy recorders of cache access events.
//!
//! Producers record events on the hot path; a single maintenance task drains
//! them in batches.  See [`ticket`] for the ticket-based implementation.

pub mod ticket;

use crate::metrics::stats::BufferStats;

/// Default number of slots in a read buffer.  Must be a power of two.
pub const DEFAULT_CAPACITY: usize = 16;

/// Largest accepted read buffer capacity.
pub const MAX_CAPACITY: usize = 1 << 30;

/// A bounded buffer of access events, drained by one thread at a time.
///
/// Implementations may drop events under contention or when full; owners
/// treat the buffer as a sampling of accesses, not a log.
pub trait ReadBuffer: Send + Sync {
    /// Records an event.  Returns `true` if the buffer appears saturated and
    /// the caller should schedule a drain soon.
    fn record(&self) -> bool;

    /// Drains pending events, returning how many were consumed.  Concurrent
    /// callers that cannot enter the drain return `0` immediately.
    fn drain(&self) -> usize;

    /// Number of events recorded so far.
    fn recorded(&self) -> u64;

    /// Number of events drained so far.
    fn drained(&self) -> u64;

    /// Returns a snapshot of the counters.
    fn stats(&self) -> BufferStats {
        BufferStats::new(self.recorded(), self.drained())
    }
}
