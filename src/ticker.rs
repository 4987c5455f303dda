//! Time sources for timestamping cache events.
//!
//! A [`Ticker`] returns nanoseconds elapsed since some fixed but arbitrary
//! point.  Owners use it for expiry and staleness decisions; the read buffer
//! itself never reads the clock.
//!
//! # Example
//! ```
//! use ticketbuf::ticker::{disabled_ticker, system_ticker, Ticker};
//!
//! let before = system_ticker().read();
//! assert!(system_ticker().read() >= before);
//! assert_eq!(disabled_ticker().read(), 0);
//! ```

use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// A monotonic nanosecond clock.
pub trait Ticker: Send + Sync {
    /// Nanoseconds elapsed since this ticker's fixed point of reference.
    fn read(&self) -> u64;
}

impl<T: Ticker + ?Sized> Ticker for Arc<T> {
    #[inline]
    fn read(&self) -> u64 {
        (**self).read()
    }
}

impl<T: Ticker + ?Sized> Ticker for &T {
    #[inline]
    fn read(&self) -> u64 {
        (**self).read()
    }
}

/// Reads the monotonic system clock relative to the instant it was created.
#[derive(Clone, Copy, Debug)]
pub struct SystemTicker {
    epoch: Instant,
}

impl SystemTicker {
    pub fn new() -> Self {
        SystemTicker {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for SystemTicker {
    #[inline]
    fn read(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// A ticker that always reads `0`, for owners with time-based policies off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisabledTicker;

impl Ticker for DisabledTicker {
    #[inline]
    fn read(&self) -> u64 {
        0
    }
}

static SYSTEM: OnceLock<SystemTicker> = OnceLock::new();
static DISABLED: DisabledTicker = DisabledTicker;

/// Process-wide system ticker, anchored on first use.
pub fn system_ticker() -> &'static SystemTicker {
    SYSTEM.get_or_init(SystemTicker::new)
}

/// Process-wide ticker that always reads `0`.
pub fn disabled_ticker() -> &'static DisabledTicker {
    &DISABLED
}
