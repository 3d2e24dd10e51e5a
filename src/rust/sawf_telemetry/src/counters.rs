//! The packet-counter producer. The driver owns the real counters; the
//! engine only ever pulls cumulative values through [`CounterSource`] and
//! works on the difference from the previous pull.

use serde::{Deserialize, Serialize};

/// Opaque per-peer token handed back to the counter source on every pull.
/// It is whatever the driver needs to find that peer's statistics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsHandle(pub u64);

/// Cumulative ingress/egress byte and packet counts for one queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThroughputCounters {
    /// Bytes received from the host for this queue
    pub in_bytes: u64,
    /// Packets received from the host for this queue
    pub in_count: u64,
    /// Bytes transmitted over the air
    pub out_bytes: u64,
    /// Packets transmitted over the air
    pub out_count: u64,
}

/// Cumulative MPDU scheduling outcomes for one queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpduCounters {
    /// MPDUs sent within the service interval
    pub svc_interval_pass: u64,
    /// MPDUs that missed the service interval
    pub svc_interval_fail: u64,
    /// Bursts within the configured burst size
    pub burst_pass: u64,
    /// Bursts exceeding the configured burst size
    pub burst_fail: u64,
}

/// Cumulative MSDU transmit and drop counts for one queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounters {
    /// MSDUs handed to the hardware
    pub total: u64,
    /// MSDUs dropped for any reason
    pub drop: u64,
    /// MSDUs dropped because their TTL expired
    pub drop_ttl: u64,
}

/// Supplies cumulative counters for a peer's queue. Called from the timer
/// threads while a sweep is in progress, so implementations must not call
/// back into the engine.
pub trait CounterSource: Send + Sync {
    /// Ingress/egress throughput counters.
    fn throughput(&self, stats: StatsHandle, queue: u8) -> ThroughputCounters;

    /// Service-interval and burst-size counters.
    fn mpdu_stats(&self, stats: StatsHandle, queue: u8) -> MpduCounters;

    /// MSDU transmit/drop counters.
    fn drop_stats(&self, stats: StatsHandle, queue: u8) -> DropCounters;
}
