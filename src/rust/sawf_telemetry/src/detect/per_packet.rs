//! Checks run synchronously from the data path each time it reports a
//! batch of packets.

use sawf_config::{DetectionStrategy, SlaConfig, SlaParameter};
use tracing::debug;

use super::{check_msdu_drops, pass_percentage, QueueContext};

/// Delay-bound pass rate from cumulative pass/fail counts.
pub(crate) fn detect_delay(config: &SlaConfig, ctx: &mut QueueContext, pass: u64, fail: u64) {
    let (pass, fail) = ctx.stats.delay.advance(pass, fail);

    let id = ctx.service_class_id();
    if id == 0 {
        return;
    }
    let Some(threshold) =
        config.threshold_for(id, DetectionStrategy::PerPacketCount, SlaParameter::DelayBound)
    else {
        return;
    };
    let Some(pass_pct) = pass_percentage(pass.saturating_add(fail), fail) else {
        return;
    };

    let breached = pass_pct < threshold as u64;
    if breached {
        debug!(
            "{} delay bound (per packet): {pass} pass, {fail} fail, {pass_pct}% < {threshold}%",
            ctx.mac
        );
    }
    ctx.report(SlaParameter::DelayBound, breached);
}

/// MSDU TTL and loss rate from cumulative transmit/drop counts.
pub(crate) fn detect_msdu_drop(
    config: &SlaConfig,
    ctx: &mut QueueContext,
    total: u64,
    drop: u64,
    ttl_drop: u64,
) {
    let delta = ctx.stats.msdu_per_packet.advance(total, drop, ttl_drop);
    if ctx.service_class_id() == 0 {
        return;
    }
    check_msdu_drops(config, ctx, DetectionStrategy::PerPacketCount, delta);
}
