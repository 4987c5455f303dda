//! A lossy, ticket-based read buffer for batching cache access events.
//!
//! Readers of a shared structure call [`TicketBuffer::record`] on every
//! access; a maintenance task periodically calls [`TicketBuffer::drain`] to
//! apply the batch to its policy.  Recording never blocks: events are
//! dropped under contention, and a full buffer answers with a drain hint.
//!
//! ```
//! use ticketbuf::TicketBuffer;
//!
//! let buffer = TicketBuffer::new();
//! if buffer.record() {
//!     buffer.drain();
//! }
//! assert!(buffer.drained() <= buffer.recorded());
//! ```

mod builder;
mod error;
mod metrics;
pub mod buffer;
pub mod ticker;

pub use buffer::ticket::TicketBuffer;
pub use buffer::{ReadBuffer, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use builder::BufferBuilder;
pub use error::BufferError;
pub use metrics::stats::BufferStats;
pub use ticker::{DisabledTicker, SystemTicker, Ticker};
