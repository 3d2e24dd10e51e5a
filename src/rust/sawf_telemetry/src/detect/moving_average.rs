use sawf_config::units::delay_bound_us;
use sawf_config::{DetectionStrategy, SlaConfig, SlaParameter};
use tracing::debug;

use super::QueueContext;

/// Compare a completed hardware-delay moving average against the delay
/// bound, stretched by the slack the threshold allows.
pub(crate) fn detect(config: &SlaConfig, ctx: &mut QueueContext, hw_delay_average: u64) {
    let id = ctx.service_class_id();
    if id == 0 || !config.delay_bound_configured(id) {
        return;
    }
    let Some(threshold) =
        config.threshold_for(id, DetectionStrategy::MovingAverage, SlaParameter::DelayBound)
    else {
        return;
    };

    let delay_bound = delay_bound_us(config.service_class(id).delay_bound);
    let max_allowed = delay_bound + delay_bound * (100 - threshold as u64) / 100;
    let breached = hw_delay_average > max_allowed;
    if breached {
        debug!(
            "{} delay bound (moving average): {hw_delay_average} us > {max_allowed} us",
            ctx.mac
        );
    }
    ctx.report(SlaParameter::DelayBound, breached);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::test_support::*;
    use crate::peer::queue_stats::QueueStats;
    use sawf_config::{ServiceClassParams, SlaThresholds};

    #[test]
    fn slack_above_bound() {
        // 2 ms bound, 90% threshold: up to 2.2 ms is fine
        let config = config(
            9,
            ServiceClassParams {
                delay_bound: 20,
                ..Default::default()
            },
            SlaThresholds {
                delay_bound: 90,
                ..Default::default()
            },
            DetectionStrategy::MovingAverage,
        );
        let mut stats = QueueStats::default();
        let mut events = Vec::new();
        let mut ctx = QueueContext {
            mac: MAC,
            info: info(9),
            stats: &mut stats,
            events: &mut events,
        };
        detect(&config, &mut ctx, 2_200);
        detect(&config, &mut ctx, 2_201);
        detect(&config, &mut ctx, 1_000);
        let seen: Vec<_> = events.iter().map(|e| e.breached).collect();
        assert_eq!(seen, vec![true, false]);
    }

    #[test]
    fn no_delay_bound_no_check() {
        let config = config(
            9,
            ServiceClassParams::default(),
            SlaThresholds {
                delay_bound: 90,
                ..Default::default()
            },
            DetectionStrategy::MovingAverage,
        );
        let mut stats = QueueStats::default();
        let mut events = Vec::new();
        let mut ctx = QueueContext {
            mac: MAC,
            info: info(9),
            stats: &mut stats,
            events: &mut events,
        };
        detect(&config, &mut ctx, u64::MAX);
        assert!(events.is_empty());
    }
}
