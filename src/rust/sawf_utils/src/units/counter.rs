//! Cumulative counters reported by the data path only ever grow. We keep
//! the last value we observed and work on the difference, so a counter
//! can be sampled at any cadence without double counting.

use serde::{Deserialize, Serialize};

/// Difference between a cumulative counter reading and the previous one.
///
/// A reading lower than the previous one means the producer restarted its
/// counter (or it wrapped). That is reported as a zero delta rather than a
/// huge unsigned difference.
#[inline]
pub fn counter_delta(current: u64, last: u64) -> u64 {
    current.saturating_sub(last)
}

/// Holds the last observed reading of a monotonically increasing counter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonotonicCounter {
    last: u64,
}

impl MonotonicCounter {
    /// The snapshot taken by the most recent `advance`.
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Record `current` as the new snapshot and return the delta since
    /// the previous snapshot. Going backwards re-bases the snapshot and
    /// yields zero.
    pub fn advance(&mut self, current: u64) -> u64 {
        let delta = counter_delta(current, self.last);
        self.last = current;
        delta
    }
}
