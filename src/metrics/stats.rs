/// A point-in-time snapshot of a read buffer's counters.
///
/// Built from two independent atomic loads, so `drained` may transiently
/// exceed `recorded` by one while a producer is publishing its ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Number of events claimed by producers (the write ticket).
    pub recorded: u64,
    /// Number of events recycled by drains (the read ticket).
    pub drained: u64,
    /// `recorded - drained`, saturating at zero.
    pub pending: u64,
}

impl BufferStats {
    pub fn new(recorded: u64, drained: u64) -> Self {
        BufferStats {
            recorded,
            drained,
            pending: recorded.saturating_sub(drained),
        }
    }

    /// `drained / recorded`, or `1.0` if nothing has been recorded.
    pub fn drain_ratio(&self) -> f64 {
        if self.recorded == 0 {
            1.0_f64
        } else {
            (self.drained.min(self.recorded)) as f64 / self.recorded as f64
        }
    }

    /// Returns `true` when no recorded event is waiting to be drained.
    pub fn is_idle(&self) -> bool {
        self.pending == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_saturates_when_drain_runs_ahead() {
        let stats = BufferStats::new(5, 6);
        assert_eq!(stats.pending, 0);
        assert!(stats.is_idle());
        assert_eq!(stats.drain_ratio(), 1.0);
    }

    #[test]
    fn drain_ratio_of_partial_drain() {
        let stats = BufferStats::new(8, 2);
        assert_eq!(stats.pending, 6);
        assert_eq!(stats.drain_ratio(), 0.25);
    }
}
