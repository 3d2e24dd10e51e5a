use sawf_utils::units::MonotonicCounter;
use sawf_utils::Bitmap;
use serde::Serialize;

use crate::DelaySamples;

/// Service-class and TID association of one host queue. Survives
/// `reset_peer_stats`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct QueueInfo {
    pub(crate) service_class_id: u8,
    pub(crate) tid: u8,
    pub(crate) msdu_queue: u8,
}

/// Pass/fail counter pair.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct PassFail {
    pub(crate) pass: MonotonicCounter,
    pub(crate) fail: MonotonicCounter,
}

impl PassFail {
    /// Advance both snapshots, returning the `(pass, fail)` deltas.
    pub(crate) fn advance(&mut self, pass: u64, fail: u64) -> (u64, u64) {
        (self.pass.advance(pass), self.fail.advance(fail))
    }
}

/// Transmitted/dropped/TTL-expired MSDU snapshots.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct MsduDrops {
    pub(crate) total: MonotonicCounter,
    pub(crate) drop: MonotonicCounter,
    pub(crate) ttl_drop: MonotonicCounter,
}

/// MSDU deltas since the previous observation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct MsduDelta {
    pub(crate) total: u64,
    pub(crate) drop: u64,
    pub(crate) ttl_drop: u64,
}

impl MsduDrops {
    pub(crate) fn advance(&mut self, total: u64, drop: u64, ttl_drop: u64) -> MsduDelta {
        MsduDelta {
            total: self.total.advance(total),
            drop: self.drop.advance(drop),
            ttl_drop: self.ttl_drop.advance(ttl_drop),
        }
    }
}

/// Byte snapshots and the rates derived from them on the last tick.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Throughput {
    pub(crate) last_in: MonotonicCounter,
    pub(crate) last_out: MonotonicCounter,
    pub(crate) in_rate: u64,
    pub(crate) eg_rate: u64,
}

/// Moving-average progress for one queue.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct MovingAverage {
    pub(crate) current_window: u32,
    pub(crate) totals: DelaySamples,
    pub(crate) averages: DelaySamples,
}

/// Last computed per-second rates of a queue, in bytes per tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ThroughputRate {
    /// Bytes transmitted over the air
    pub egress: u64,
    /// Bytes received from the host
    pub ingress: u64,
}

/// Raw and derived counters of one peer queue.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct QueueStats {
    /// Last notified state, one bit per `SlaParameter`
    pub(crate) breach: Bitmap,
    pub(crate) delay: PassFail,
    pub(crate) moving_average: MovingAverage,
    pub(crate) throughput: Throughput,
    pub(crate) service_interval: PassFail,
    pub(crate) burst_size: PassFail,
    pub(crate) msdu_per_packet: MsduDrops,
    pub(crate) msdu_per_period: MsduDrops,
}

impl QueueStats {
    pub(crate) fn rate(&self) -> ThroughputRate {
        ThroughputRate {
            egress: self.throughput.eg_rate,
            ingress: self.throughput.in_rate,
        }
    }
}
