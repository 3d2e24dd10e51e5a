use sawf_config::{ConfigStore, DetectionStrategy, ServiceClassParams, SlaThresholds};
use sawf_telemetry::{
    BreachEvent, ChannelNotifier, CounterSource, DropCounters, MpduCounters, SawfTelemetry,
    StatsHandle, ThroughputCounters,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Counters the test sets directly, keyed by queue.
#[derive(Default)]
pub struct ScriptedSource {
    throughput: Mutex<HashMap<u8, ThroughputCounters>>,
    mpdu: Mutex<HashMap<u8, MpduCounters>>,
    drops: Mutex<HashMap<u8, DropCounters>>,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn set_throughput(&self, queue: u8, in_bytes: u64, out_bytes: u64) {
        self.throughput.lock().unwrap().insert(
            queue,
            ThroughputCounters {
                in_bytes,
                out_bytes,
                ..Default::default()
            },
        );
    }

    pub fn set_mpdu(&self, queue: u8, counters: MpduCounters) {
        self.mpdu.lock().unwrap().insert(queue, counters);
    }

    pub fn set_drops(&self, queue: u8, counters: DropCounters) {
        self.drops.lock().unwrap().insert(queue, counters);
    }
}

impl CounterSource for ScriptedSource {
    fn throughput(&self, _: StatsHandle, queue: u8) -> ThroughputCounters {
        self.throughput.lock().unwrap().get(&queue).copied().unwrap_or_default()
    }

    fn mpdu_stats(&self, _: StatsHandle, queue: u8) -> MpduCounters {
        self.mpdu.lock().unwrap().get(&queue).copied().unwrap_or_default()
    }

    fn drop_stats(&self, _: StatsHandle, queue: u8) -> DropCounters {
        self.drops.lock().unwrap().get(&queue).copied().unwrap_or_default()
    }
}

/// An engine on an empty configuration, plus the receiving end of its
/// notifications.
pub fn engine() -> (SawfTelemetry, crossbeam_channel::Receiver<BreachEvent>) {
    let (notifier, rx) = ChannelNotifier::new();
    let engine = SawfTelemetry::init(Arc::new(ConfigStore::new()), Arc::new(notifier));
    (engine, rx)
}

#[allow(dead_code)]
pub fn configure(
    engine: &SawfTelemetry,
    id: u8,
    params: ServiceClassParams,
    sla: SlaThresholds,
    strategy: DetectionStrategy,
    enables: SlaThresholds,
) {
    let config = engine.config();
    config.set_service_class(id, true, params).unwrap();
    config.set_sla(id, sla).unwrap();
    config.set_sla_detection(strategy, enables).unwrap();
}

pub fn drain(rx: &crossbeam_channel::Receiver<BreachEvent>) -> Vec<BreachEvent> {
    rx.try_iter().collect()
}
