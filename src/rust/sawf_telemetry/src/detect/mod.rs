//! Breach detectors. Every detector follows the same shape: turn the
//! cumulative counters into deltas, update the snapshots, and only then
//! decide whether the configured parameters pass. A parameter is checked
//! only when both the service class threshold and the strategy enable are
//! nonzero, and a zero denominator skips the check.

pub(crate) mod moving_average;
pub(crate) mod n_second;
pub(crate) mod per_packet;
pub(crate) mod per_second;

use sawf_config::{SlaConfig, SlaParameter};
use sawf_utils::MacAddress;

use crate::peer::queue_stats::{MsduDelta, QueueInfo, QueueStats};
use crate::BreachEvent;

/// One queue being evaluated, plus where transitions are collected.
pub(crate) struct QueueContext<'a> {
    pub(crate) mac: MacAddress,
    pub(crate) info: QueueInfo,
    pub(crate) stats: &'a mut QueueStats,
    pub(crate) events: &'a mut Vec<BreachEvent>,
}

impl QueueContext<'_> {
    pub(crate) fn service_class_id(&self) -> u8 {
        self.info.service_class_id
    }

    /// Record the outcome of a check. Only a change from the last
    /// notified state produces an event.
    pub(crate) fn report(&mut self, parameter: SlaParameter, breached: bool) {
        let bit = parameter.id() as usize;
        if self.stats.breach.test(bit) == breached {
            return;
        }
        self.stats.breach.assign(bit, breached);
        self.events.push(BreachEvent {
            mac: self.mac,
            service_class_id: self.info.service_class_id,
            parameter,
            breached,
            tid: self.info.tid,
        });
    }
}

/// `(total - fail) * 100 / total`, or `None` when there is nothing to
/// measure.
pub(crate) fn pass_percentage(total: u64, fail: u64) -> Option<u64> {
    if total == 0 {
        return None;
    }
    let passed = total.saturating_sub(fail) as u128;
    Some((passed * 100 / total as u128) as u64)
}

/// MSDU TTL and loss-rate checks, shared by the per-packet and the
/// N-second paths.
pub(crate) fn check_msdu_drops(
    config: &SlaConfig,
    ctx: &mut QueueContext,
    strategy: sawf_config::DetectionStrategy,
    delta: MsduDelta,
) {
    let id = ctx.service_class_id();

    if let Some(threshold) = config.threshold_for(id, strategy, SlaParameter::MsduTtl) {
        if let Some(pass) = pass_percentage(delta.total, delta.ttl_drop) {
            let breached = pass < threshold as u64;
            if breached {
                tracing::debug!(
                    "{} MSDU TTL: {} of {} expired, {pass}% < {threshold}%",
                    ctx.mac,
                    delta.ttl_drop,
                    delta.total
                );
            }
            ctx.report(SlaParameter::MsduTtl, breached);
        }
    }

    if let Some(threshold) = config.threshold_for(id, strategy, SlaParameter::MsduLoss) {
        let loss_rate = config.service_class(id).msdu_rate_loss as u64;
        let allowed = loss_rate
            .saturating_mul(sawf_config::units::MSDU_LOSS_UNIT)
            .saturating_mul(delta.total);
        if allowed > 0 {
            let ratio = (delta.drop as u128 * 100 / allowed as u128) as u64;
            let breached = ratio < threshold as u64;
            if breached {
                tracing::debug!(
                    "{} MSDU loss: {} dropped, {allowed} allowed, {ratio} < {threshold}",
                    ctx.mac,
                    delta.drop
                );
            }
            ctx.report(SlaParameter::MsduLoss, breached);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use sawf_config::{ConfigStore, DetectionStrategy, ServiceClassParams, SlaThresholds};
    use std::sync::Arc;

    pub(crate) const MAC: MacAddress = MacAddress::new([0x02, 0, 0, 0, 0, 0x05]);

    pub(crate) fn info(service_class_id: u8) -> QueueInfo {
        QueueInfo {
            service_class_id,
            tid: 3,
            msdu_queue: 0,
        }
    }

    /// A store with one service class, its SLA, and one strategy enabled
    /// for exactly the parameters the SLA names.
    pub(crate) fn config(
        id: u8,
        params: ServiceClassParams,
        sla: SlaThresholds,
        strategy: DetectionStrategy,
    ) -> Arc<SlaConfig> {
        let store = ConfigStore::new();
        store.set_service_class(id, true, params).unwrap();
        store.set_sla(id, sla).unwrap();
        let mut enables = SlaThresholds::default();
        for (parameter, value) in sla.iter() {
            if value != 0 {
                set(&mut enables, parameter, 1);
            }
        }
        store.set_sla_detection(strategy, enables).unwrap();
        store.snapshot()
    }

    fn set(t: &mut SlaThresholds, parameter: SlaParameter, value: u8) {
        match parameter {
            SlaParameter::MinThroughput => t.min_thruput_rate = value,
            SlaParameter::MaxThroughput => t.max_thruput_rate = value,
            SlaParameter::BurstSize => t.burst_size = value,
            SlaParameter::ServiceInterval => t.service_interval = value,
            SlaParameter::DelayBound => t.delay_bound = value,
            SlaParameter::MsduTtl => t.msdu_ttl = value,
            SlaParameter::MsduLoss => t.msdu_rate_loss = value,
        }
    }
}
