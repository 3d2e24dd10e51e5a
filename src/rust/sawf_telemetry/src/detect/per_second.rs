//! Throughput checks, run by the one-second sweep. Rates are bytes per
//! tick.

use sawf_config::units::throughput_bytes_per_second;
use sawf_config::{DetectionStrategy, SlaConfig, SlaParameter};
use tracing::debug;

use super::QueueContext;
use crate::ThroughputCounters;

pub(crate) fn detect(config: &SlaConfig, ctx: &mut QueueContext, counters: ThroughputCounters) {
    let throughput = &mut ctx.stats.throughput;
    let in_rate = throughput.last_in.advance(counters.in_bytes);
    let eg_rate = throughput.last_out.advance(counters.out_bytes);
    throughput.in_rate = in_rate;
    throughput.eg_rate = eg_rate;

    let id = ctx.service_class_id();
    if !config.sla_configured(id) {
        return;
    }
    let params = config.service_class(id);

    if let Some(threshold) =
        config.threshold_for(id, DetectionStrategy::PerSecond, SlaParameter::MinThroughput)
    {
        let min = throughput_bytes_per_second(params.min_thruput_rate);
        let floor = min * threshold as u64 / 100;
        // Only a breach when there was enough offered load to meet it
        let breached = in_rate > min && eg_rate < floor;
        if breached {
            debug!(
                "{} min throughput: {in_rate} B in, {eg_rate} B out, floor {floor} B",
                ctx.mac
            );
        }
        ctx.report(SlaParameter::MinThroughput, breached);
    }

    if let Some(threshold) =
        config.threshold_for(id, DetectionStrategy::PerSecond, SlaParameter::MaxThroughput)
    {
        let max = throughput_bytes_per_second(params.max_thruput_rate);
        let floor = max * threshold as u64 / 100;
        let breached = in_rate > max && eg_rate < floor;
        if breached {
            debug!(
                "{} max throughput: {in_rate} B in, {eg_rate} B out, floor {floor} B",
                ctx.mac
            );
        }
        ctx.report(SlaParameter::MaxThroughput, breached);
    }
}
