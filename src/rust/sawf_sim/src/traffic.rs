//! Synthetic counters standing in for a driver.

use sawf_telemetry::{
    CounterSource, DelaySamples, DropCounters, MpduCounters, StatsHandle, ThroughputCounters,
};
use std::time::Instant;

/// Shape of the generated traffic.
#[derive(Copy, Clone, Debug)]
pub struct TrafficProfile {
    /// Offered load, kbit/s
    pub offered_kbps: u64,
    /// Share of the offered load delivered, and of MPDUs/MSDUs that pass
    pub delivered_pct: u64,
    /// Hardware delay reported to the moving average, µs
    pub hw_delay_us: u64,
    /// Average MSDU size, bytes
    pub msdu_bytes: u64,
}

/// Counters grow with wall-clock time from the moment the source is
/// built, so each peer looks like a steady stream.
pub struct SyntheticTraffic {
    profile: TrafficProfile,
    started: Instant,
}

impl SyntheticTraffic {
    pub fn new(profile: TrafficProfile) -> Self {
        Self {
            profile,
            started: Instant::now(),
        }
    }

    fn offered_bytes(&self) -> u64 {
        let ms = self.started.elapsed().as_millis() as u64;
        self.profile.offered_kbps.saturating_mul(125).saturating_mul(ms) / 1000
    }

    fn delivered(&self, n: u64) -> u64 {
        n * self.profile.delivered_pct.min(100) / 100
    }

    fn msdus(&self) -> u64 {
        self.offered_bytes() / self.profile.msdu_bytes.max(1)
    }

    /// Cumulative `(pass, fail)` delay-bound counts.
    pub fn delay_counts(&self) -> (u64, u64) {
        let total = self.msdus();
        let pass = self.delivered(total);
        (pass, total - pass)
    }

    /// Cumulative MSDU `(total, drop, ttl_drop)` counts.
    pub fn msdu_counts(&self) -> (u64, u64, u64) {
        let total = self.msdus();
        let drop = total - self.delivered(total);
        (total, drop, drop / 2)
    }

    /// One moving-average window sample.
    pub fn delay_sample(&self) -> DelaySamples {
        DelaySamples {
            network: self.profile.hw_delay_us / 4,
            software: self.profile.hw_delay_us / 2,
            hardware: self.profile.hw_delay_us,
        }
    }
}

impl CounterSource for SyntheticTraffic {
    fn throughput(&self, _: StatsHandle, _: u8) -> ThroughputCounters {
        let in_bytes = self.offered_bytes();
        let msdu = self.profile.msdu_bytes.max(1);
        let out_bytes = self.delivered(in_bytes);
        ThroughputCounters {
            in_bytes,
            in_count: in_bytes / msdu,
            out_bytes,
            out_count: out_bytes / msdu,
        }
    }

    fn mpdu_stats(&self, _: StatsHandle, _: u8) -> MpduCounters {
        let (pass, fail) = self.delay_counts();
        MpduCounters {
            svc_interval_pass: pass,
            svc_interval_fail: fail,
            burst_pass: pass,
            burst_fail: fail,
        }
    }

    fn drop_stats(&self, _: StatsHandle, _: u8) -> DropCounters {
        let (total, drop, drop_ttl) = self.msdu_counts();
        DropCounters {
            total,
            drop,
            drop_ttl,
        }
    }
}
