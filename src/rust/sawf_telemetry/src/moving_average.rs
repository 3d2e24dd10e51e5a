//! Per peer-queue moving average of the network, software and hardware
//! delays reported by the data path.
//!
//! Samples are collected into a fixed number of windows. Once every window
//! holds a sample, the next report averages them, resets the queue to
//! window zero and hands the hardware-delay average to the breach
//! detector. Window sets are back to back; nothing slides.

use serde::{Deserialize, Serialize};

use crate::peer::queue_stats::MovingAverage;
use crate::{TelemetryError, SAWF_MAX_QUEUES};

/// One value per delay type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelaySamples {
    /// Network (host to driver) delay
    pub network: u64,
    /// Software (driver queueing) delay
    pub software: u64,
    /// Hardware (completion) delay
    pub hardware: u64,
}

impl DelaySamples {
    /// Number of delay types.
    pub const COUNT: usize = 3;

    fn as_array(&self) -> [u64; Self::COUNT] {
        [self.network, self.software, self.hardware]
    }

    fn saturating_add(self, other: Self) -> Self {
        Self {
            network: self.network.saturating_add(other.network),
            software: self.software.saturating_add(other.software),
            hardware: self.hardware.saturating_add(other.hardware),
        }
    }

    fn divide(self, by: u64) -> Self {
        Self {
            network: self.network / by,
            software: self.software / by,
            hardware: self.hardware / by,
        }
    }
}

/// Backing store for a peer's window samples, laid out
/// `[delay type][queue][window]`. The window count is fixed when the
/// peer is created.
pub(crate) struct MovingWindowBuffer {
    window_count: u32,
    samples: Vec<u64>,
}

impl MovingWindowBuffer {
    pub(crate) fn allocate(window_count: u32) -> Result<Self, TelemetryError> {
        if window_count == 0 {
            return Err(sawf_config::SawfConfigError::InvalidWindowCount.into());
        }
        let len = (window_count as usize)
            .checked_mul(SAWF_MAX_QUEUES)
            .and_then(|n| n.checked_mul(DelaySamples::COUNT))
            .ok_or(TelemetryError::AllocationFailure)?;
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(len)
            .map_err(|_| TelemetryError::AllocationFailure)?;
        samples.resize(len, 0);
        Ok(Self {
            window_count,
            samples,
        })
    }

    pub(crate) fn window_count(&self) -> u32 {
        self.window_count
    }

    fn slot(&self, delay_type: usize, queue: usize, window: u32) -> usize {
        (delay_type * SAWF_MAX_QUEUES + queue) * self.window_count as usize + window as usize
    }

    fn store(&mut self, queue: usize, window: u32, sample: &DelaySamples) {
        for (delay_type, value) in sample.as_array().into_iter().enumerate() {
            let slot = self.slot(delay_type, queue, window);
            self.samples[slot] = value;
        }
    }

    #[cfg(test)]
    pub(crate) fn sample(&self, queue: usize, window: u32) -> DelaySamples {
        DelaySamples {
            network: self.samples[self.slot(0, queue, window)],
            software: self.samples[self.slot(1, queue, window)],
            hardware: self.samples[self.slot(2, queue, window)],
        }
    }
}

/// Record one window sample for `queue`. Returns the new averages when
/// this call completed a window set.
pub(crate) fn push_window_sample(
    state: &mut MovingAverage,
    buffer: &mut MovingWindowBuffer,
    queue: usize,
    sample: DelaySamples,
) -> Option<DelaySamples> {
    let window_count = buffer.window_count();
    if state.current_window < window_count {
        buffer.store(queue, state.current_window, &sample);
        state.totals = state.totals.saturating_add(sample);
        state.current_window += 1;
        return None;
    }

    let averages = state.totals.divide(window_count as u64);
    state.averages = averages;
    state.current_window = 0;
    state.totals = DelaySamples::default();
    Some(averages)
}
