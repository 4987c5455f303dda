//! Lossy, ticket-based read buffer.
//!
//! Cache hits are recorded by claiming the slot addressed by the current
//! write ticket with a single compare-exchange, with **no mutex acquisition**
//! on the producer side.  The maintenance thread recycles filled slots in
//! ticket order under a `try_lock` gate.
//!
//! ## Design
//!
//! The buffer is a power-of-two array of `AtomicU64` slots.  A free slot
//! stores the ticket that may claim it next; a filled slot stores that ticket
//! with the `FILLED` bit set.  A producer reads the write ticket, looks at
//! its slot and makes exactly one claim attempt:
//!
//! * slot filled: the buffer is full (or a racing write got ahead of the
//!   drain), so the producer returns a drain hint;
//! * slot waiting for another ticket: the producer lost a race and drops
//!   the event;
//! * slot waiting for this ticket: one CAS.  The winner lazily bumps the
//!   write ticket.  Win or lose, the producer never retries.
//!
//! Draining recycles slot `t & mask` to ticket `t + capacity`, so each
//! physical slot sees a strictly increasing ticket sequence spaced by the
//! capacity.  Slot occupancy, not the write counter, is the source of truth
//! for the drain.
//!
//! ## Known race
//!
//! The winner of a claim publishes the next write ticket after its CAS.  A
//! drain that runs in that window may recycle the slot first, so `drained()`
//! can transiently read one past `recorded()`.  Producers that load the old
//! ticket in the meantime find a mismatched slot and drop their event.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::buffer::{ReadBuffer, DEFAULT_CAPACITY};
use crate::builder::{validate_capacity, BufferBuilder};
use crate::error::BufferError;
use crate::metrics::stats::BufferStats;

/// Tag bit marking a slot as filled.  The low 63 bits keep the ticket that
/// claimed it.
const FILLED: u64 = 1 << 63;

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// Decoded view of one slot word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    /// Free; only the holder of this ticket may claim it.
    Writable(u64),
    /// Claimed and waiting to be drained.
    Filled,
}

impl Slot {
    #[inline]
    fn decode(raw: u64) -> Self {
        if raw & FILLED == 0 {
            Slot::Writable(raw)
        } else {
            Slot::Filled
        }
    }
}

/// Outcome of a single claim attempt for a given ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    /// Target slot was already filled.
    Full,
    /// Target slot belongs to a different ticket.
    Stale,
    /// This caller's CAS filled the slot.
    Claimed,
    /// Another producer filled the slot between the load and the CAS.
    Lost,
}

/// Pads a counter to its own cache line so producers bumping the write
/// ticket do not contend with the drainer's read ticket.
#[repr(align(64))]
struct Padded<T>(T);

// ---------------------------------------------------------------------------
// TicketBuffer
// ---------------------------------------------------------------------------

/// A bounded, lossy, non-blocking read buffer.
///
/// Any number of threads may call [`record`] concurrently.  [`drain`] may
/// also be called from any thread, but only one caller at a time runs the
/// drain body; the others return immediately.
///
/// # Example
/// ```
/// use ticketbuf::TicketBuffer;
///
/// let buffer = TicketBuffer::with_capacity(8);
/// for _ in 0..8 {
///     assert!(!buffer.record());
/// }
/// // Full: the next record asks for a drain instead of recording.
/// assert!(buffer.record());
///
/// assert_eq!(buffer.drain(), 8);
/// assert_eq!(buffer.drained(), buffer.recorded());
/// ```
///
/// [`record`]: TicketBuffer::record
/// [`drain`]: TicketBuffer::drain
pub struct TicketBuffer {
    /// Next ticket producers attempt to claim.
    write_counter: Padded<AtomicU64>,
    /// Next ticket to drain.  Only mutated by the holder of `drain_gate`.
    read_counter: Padded<AtomicU64>,
    drain_gate: Mutex<()>,
    slots: Box<[AtomicU64]>,
    mask: u64,
}

impl TicketBuffer {
    /// Creates a buffer with [`DEFAULT_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a buffer with `capacity` slots.
    ///
    /// # Panics
    /// Panics if `capacity` is zero, not a power of two, or larger than
    /// [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(buffer) => buffer,
            Err(err) => panic!("invalid read buffer capacity: {err}"),
        }
    }

    /// Creates a buffer with `capacity` slots, rejecting invalid capacities.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, BufferError> {
        let capacity = validate_capacity(capacity)?;
        debug!(capacity, "creating ticket read buffer");

        let slots: Box<[AtomicU64]> = (0..capacity as u64).map(AtomicU64::new).collect();
        Ok(TicketBuffer {
            write_counter: Padded(AtomicU64::new(0)),
            read_counter: Padded(AtomicU64::new(0)),
            drain_gate: Mutex::new(()),
            slots,
            mask: capacity as u64 - 1,
        })
    }

    /// Returns a [`BufferBuilder`] for configuring a new buffer.
    pub fn builder() -> BufferBuilder {
        BufferBuilder::new()
    }

    /// Number of slots in this buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn slot(&self, ticket: u64) -> &AtomicU64 {
        &self.slots[(ticket & self.mask) as usize]
    }

    // -----------------------------------------------------------------------
    // Producer side
    // -----------------------------------------------------------------------

    /// Records one event.
    ///
    /// Never blocks and never retries.  Returns `true` when the addressed
    /// slot is still filled, meaning the buffer looks saturated and the
    /// caller should schedule a [`drain`](TicketBuffer::drain).  Returns
    /// `false` otherwise, whether the event was recorded or dropped.
    #[inline]
    pub fn record(&self) -> bool {
        let ticket = self.write_counter.0.load(Ordering::Relaxed);
        match self.attempt(ticket) {
            Attempt::Full => {
                trace!(ticket, "read buffer saturated");
                true
            }
            Attempt::Stale | Attempt::Claimed | Attempt::Lost => false,
        }
    }

    /// Makes exactly one claim attempt for `ticket`.
    fn attempt(&self, ticket: u64) -> Attempt {
        let slot = self.slot(ticket);
        match Slot::decode(slot.load(Ordering::Acquire)) {
            Slot::Filled => Attempt::Full,
            Slot::Writable(expected) if expected != ticket => Attempt::Stale,
            Slot::Writable(_) => {
                debug_assert!(ticket < FILLED, "write ticket overflowed into the filled tag");
                match slot.compare_exchange(
                    ticket,
                    ticket | FILLED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => {
                        // Lazy publication: slot state is authoritative, the
                        // counter only needs to become visible eventually.
                        self.write_counter.0.store(ticket + 1, Ordering::Relaxed);
                        Attempt::Claimed
                    }
                    Err(_) => Attempt::Lost,
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Consumer side
    // -----------------------------------------------------------------------

    /// Recycles filled slots in ticket order, at most one full pass.
    ///
    /// Returns the number of slots recycled.  Returns `0` without doing any
    /// work if another thread currently holds the drain gate.
    pub fn drain(&self) -> usize {
        let Some(_gate) = self.drain_gate.try_lock() else {
            trace!("drain gate busy");
            return 0;
        };

        let capacity = self.slots.len() as u64;
        let start = self.read_counter.0.load(Ordering::Relaxed);
        let mut read = start;
        while read - start < capacity {
            let slot = self.slot(read);
            let raw = slot.load(Ordering::Acquire);
            if let Slot::Writable(_) = Slot::decode(raw) {
                break;
            }
            debug_assert_eq!(
                raw & !FILLED,
                read,
                "filled slot does not hold the read ticket"
            );
            slot.store(read + capacity, Ordering::Release);
            read += 1;
        }

        let recycled = read - start;
        if recycled > 0 {
            self.read_counter.0.store(read, Ordering::Relaxed);
            debug!(recycled, drained = read, "drained read buffer");
        }
        recycled as usize
    }

    /// Drains until a pass stops short of a full sweep.
    ///
    /// Returns the total number of slots recycled.  Under sustained producer
    /// load every pass may find a full buffer, so this can run for as long as
    /// producers keep up; owners on a latency budget should call
    /// [`drain`](TicketBuffer::drain) instead.
    pub fn drain_all(&self) -> usize {
        let mut total = 0;
        loop {
            let recycled = self.drain();
            total += recycled;
            if recycled < self.capacity() {
                return total;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Current write ticket: the number of events claimed so far.
    #[inline]
    pub fn recorded(&self) -> u64 {
        self.write_counter.0.load(Ordering::Relaxed)
    }

    /// Current read ticket: the number of events drained so far.
    #[inline]
    pub fn drained(&self) -> u64 {
        self.read_counter.0.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of both counters.  The two loads are independent.
    pub fn stats(&self) -> BufferStats {
        BufferStats::new(self.recorded(), self.drained())
    }
}

impl Default for TicketBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TicketBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketBuffer")
            .field("capacity", &self.capacity())
            .field("recorded", &self.recorded())
            .field("drained", &self.drained())
            .finish()
    }
}

impl ReadBuffer for TicketBuffer {
    #[inline]
    fn record(&self) -> bool {
        TicketBuffer::record(self)
    }

    fn drain(&self) -> usize {
        TicketBuffer::drain(self)
    }

    fn recorded(&self) -> u64 {
        TicketBuffer::recorded(self)
    }

    fn drained(&self) -> u64 {
        TicketBuffer::drained(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
