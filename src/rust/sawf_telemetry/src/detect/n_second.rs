//! Aggregate checks, run by the N-second sweep.

use sawf_config::{DetectionStrategy, SlaConfig, SlaParameter};
use tracing::debug;

use super::{check_msdu_drops, pass_percentage, QueueContext};
use crate::{DropCounters, MpduCounters};

pub(crate) fn detect(
    config: &SlaConfig,
    ctx: &mut QueueContext,
    mpdu: MpduCounters,
    drops: DropCounters,
) {
    let (burst_pass, burst_fail) = ctx
        .stats
        .burst_size
        .advance(mpdu.burst_pass, mpdu.burst_fail);
    let (interval_pass, interval_fail) = ctx
        .stats
        .service_interval
        .advance(mpdu.svc_interval_pass, mpdu.svc_interval_fail);
    let msdu = ctx
        .stats
        .msdu_per_period
        .advance(drops.total, drops.drop, drops.drop_ttl);

    let id = ctx.service_class_id();
    if !config.sla_configured(id) {
        return;
    }

    check_pass_fail(config, ctx, SlaParameter::BurstSize, burst_pass, burst_fail);
    check_pass_fail(
        config,
        ctx,
        SlaParameter::ServiceInterval,
        interval_pass,
        interval_fail,
    );
    check_msdu_drops(config, ctx, DetectionStrategy::PerNSecond, msdu);
}

fn check_pass_fail(
    config: &SlaConfig,
    ctx: &mut QueueContext,
    parameter: SlaParameter,
    pass: u64,
    fail: u64,
) {
    let id = ctx.service_class_id();
    let Some(threshold) = config.threshold_for(id, DetectionStrategy::PerNSecond, parameter) else {
        return;
    };
    let Some(pass_pct) = pass_percentage(pass.saturating_add(fail), fail) else {
        return;
    };
    let breached = fail > 0 && pass_pct < threshold as u64;
    if breached {
        debug!(
            "{} {parameter}: {pass} pass, {fail} fail, {pass_pct}% < {threshold}%",
            ctx.mac
        );
    }
    ctx.report(parameter, breached);
}
