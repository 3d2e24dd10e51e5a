use parking_lot::Mutex;
use sawf_config::{ConfigStore, DetectionStrategy, SlaConfig};
use sawf_utils::MacAddress;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::detect::{self, QueueContext};
use crate::moving_average::push_window_sample;
use crate::peer::{check_msdu_queue, check_queue, check_tid, PeerContext, PeerHandle, PeerState};
use crate::registry::Registry;
use crate::timers::{SlaTimers, ONE_SECOND};
use crate::{
    BreachEvent, BreachNotifier, CounterSource, DelaySamples, StatsHandle, TelemetryError,
    ThroughputRate,
};

pub(crate) struct EngineInner {
    pub(crate) config: Arc<ConfigStore>,
    notifier: Arc<dyn BreachNotifier>,
    registry: Mutex<Registry>,
    tick: Duration,
}

impl EngineInner {
    pub(crate) fn per_second_tick(&self) {
        let config = self.config.snapshot();
        if config.strategy_enabled(DetectionStrategy::PerSecond) {
            self.sweep(DetectionStrategy::PerSecond, &config);
        }
    }

    pub(crate) fn n_second_tick(&self) {
        let config = self.config.snapshot();
        if config.strategy_enabled(DetectionStrategy::PerNSecond) {
            self.sweep(DetectionStrategy::PerNSecond, &config);
        }
    }

    /// Run one strategy over every active queue of every peer, holding
    /// the registry lock throughout. Notifications go out once the lock
    /// is released.
    fn sweep(&self, strategy: DetectionStrategy, config: &SlaConfig) {
        let mut events = Vec::new();
        {
            let registry = self.registry.lock();
            for peer in registry.iter() {
                let Ok(mut guard) = peer.lock() else {
                    continue;
                };
                let state = &mut *guard;
                for queue in state.active_queues() {
                    let mut ctx = QueueContext {
                        mac: peer.mac,
                        info: state.queues[queue],
                        stats: &mut state.stats[queue],
                        events: &mut events,
                    };
                    let queue = queue as u8;
                    match strategy {
                        DetectionStrategy::PerSecond => {
                            let counters = peer.source.throughput(peer.stats_handle, queue);
                            detect::per_second::detect(config, &mut ctx, counters);
                        }
                        DetectionStrategy::PerNSecond => {
                            let mpdu = peer.source.mpdu_stats(peer.stats_handle, queue);
                            let drops = peer.source.drop_stats(peer.stats_handle, queue);
                            detect::n_second::detect(config, &mut ctx, mpdu, drops);
                        }
                        DetectionStrategy::PerPacketCount | DetectionStrategy::MovingAverage => {}
                    }
                }
            }
        }
        self.dispatch(&events);
    }

    fn dispatch(&self, events: &[BreachEvent]) {
        for event in events {
            self.notifier.notify_breach(event);
        }
    }

    /// Run a data-path update against one queue of a live peer.
    fn with_queue<F>(&self, peer: &PeerHandle, tid: u8, queue: u8, update: F) -> Result<(), TelemetryError>
    where
        F: FnOnce(&SlaConfig, &mut PeerState, &mut QueueContext),
    {
        check_tid(tid)?;
        check_queue(queue)?;
        let config = self.config.snapshot();
        let mut events = Vec::new();
        {
            let mut guard = peer.peer.lock()?;
            let state = &mut *guard;
            let index = queue as usize;
            let mut stats = state.stats[index];
            let mut ctx = QueueContext {
                mac: peer.peer.mac,
                info: state.queues[index],
                stats: &mut stats,
                events: &mut events,
            };
            update(&*config, state, &mut ctx);
            state.stats[index] = stats;
        }
        self.dispatch(&events);
        Ok(())
    }
}

/// The SLA breach-detection engine.
///
/// Owns the peer registry and the two SLA timers. Control-plane
/// configuration goes through [`SawfTelemetry::config`]; changes are
/// picked up on the next sweep or data-path call.
pub struct SawfTelemetry {
    inner: Arc<EngineInner>,
}

impl SawfTelemetry {
    /// Create an engine reading `config` and reporting to `notifier`. No
    /// timers run until the first peer is attached.
    pub fn init(config: Arc<ConfigStore>, notifier: Arc<dyn BreachNotifier>) -> Self {
        Self::with_tick(config, notifier, ONE_SECOND)
    }

    pub(crate) fn with_tick(
        config: Arc<ConfigStore>,
        notifier: Arc<dyn BreachNotifier>,
        tick: Duration,
    ) -> Self {
        debug!("SAWF telemetry engine initialized");
        Self {
            inner: Arc::new(EngineInner {
                config,
                notifier,
                registry: Mutex::new(Registry::new()),
                tick,
            }),
        }
    }

    /// The live configuration.
    pub fn config(&self) -> &ConfigStore {
        &self.inner.config
    }

    /// Start monitoring a peer. `queue` becomes active with
    /// `service_class_id`. The moving-average buffer is sized with the
    /// window count configured right now and keeps that size for the
    /// life of the peer. On failure nothing is registered.
    pub fn alloc_peer(
        &self,
        source: Arc<dyn CounterSource>,
        stats: StatsHandle,
        mac: MacAddress,
        service_class_id: u8,
        queue: u8,
    ) -> Result<PeerHandle, TelemetryError> {
        let window_count = self.inner.config.snapshot().moving_average().windows;
        let mut registry = self.inner.registry.lock();
        let id = registry.allocate_id();
        let peer = PeerContext::new(id, source, stats, mac, service_class_id, queue, window_count)
            .map_err(|e| {
                error!("Unable to allocate SAWF context for {mac}: {e}");
                e
            })?;
        let peer = Arc::new(peer);

        if registry.is_empty() {
            let timers = SlaTimers::start(Arc::downgrade(&self.inner), self.inner.tick)
                .map_err(|e| {
                    error!("Unable to start SLA timers: {e}");
                    TelemetryError::AllocationFailure
                })?;
            registry.timers = Some(timers);
        }
        registry.insert(peer.clone());
        debug!(
            "Attached {id} ({mac}) queue {queue} service class {service_class_id}, {window_count} windows"
        );
        Ok(PeerHandle { peer })
    }

    /// Associate a host queue with a TID and MSDU queue, and mark it
    /// active. Repeating a mapping changes nothing.
    pub fn update_queue_mapping(
        &self,
        peer: &PeerHandle,
        queue: u8,
        tid: u8,
        msdu_queue: u8,
    ) -> Result<(), TelemetryError> {
        check_queue(queue)?;
        check_tid(tid)?;
        check_msdu_queue(msdu_queue)?;
        peer.peer.lock()?.map_queue(queue, tid, msdu_queue);
        debug!("{}: host queue {queue} -> tid {tid} msdu queue {msdu_queue}", peer.mac());
        Ok(())
    }

    /// The host queue mapped to a TID/MSDU-queue pair, if any.
    pub fn host_queue(
        &self,
        peer: &PeerHandle,
        tid: u8,
        msdu_queue: u8,
    ) -> Result<Option<u8>, TelemetryError> {
        check_tid(tid)?;
        check_msdu_queue(msdu_queue)?;
        Ok(peer.peer.lock()?.host_queue(tid, msdu_queue))
    }

    /// Stop monitoring a peer. Waits for a sweep in progress. When the
    /// last peer goes, both timers are stopped before this returns.
    pub fn free_peer(&self, peer: PeerHandle) {
        let timers = {
            let mut registry = self.inner.registry.lock();
            if registry.remove(peer.id()).is_none() {
                debug!("{} was not attached", peer.id());
                return;
            }
            peer.peer.detach();
            if registry.is_empty() {
                registry.timers.take()
            } else {
                None
            }
        };
        debug!("Detached {} ({})", peer.id(), peer.mac());
        // Outside the registry lock: a timer thread may be waiting on it
        if let Some(timers) = timers {
            timers.stop();
        }
    }

    /// Zero every queue's counters for the first peer with this MAC.
    /// Queue mappings and moving-average samples are kept. Returns false
    /// when no such peer is attached.
    pub fn reset_peer_stats(&self, mac: MacAddress) -> bool {
        let registry = self.inner.registry.lock();
        match registry.find_by_mac(mac) {
            Some(peer) => {
                peer.reset_stats();
                debug!("Reset statistics for {mac}");
                true
            }
            None => {
                info!("Reset requested for unknown peer {mac}");
                false
            }
        }
    }

    /// Report cumulative delay-bound pass/fail counts for a queue.
    pub fn update_delay(
        &self,
        peer: &PeerHandle,
        tid: u8,
        queue: u8,
        pass: u64,
        fail: u64,
    ) -> Result<(), TelemetryError> {
        self.inner.with_queue(peer, tid, queue, |config, _, ctx| {
            detect::per_packet::detect_delay(config, ctx, pass, fail);
        })
    }

    /// Report one moving-average window sample for a queue.
    pub fn update_delay_moving_avg(
        &self,
        peer: &PeerHandle,
        tid: u8,
        queue: u8,
        samples: DelaySamples,
    ) -> Result<(), TelemetryError> {
        self.inner.with_queue(peer, tid, queue, |config, state, ctx| {
            let averages = push_window_sample(
                &mut ctx.stats.moving_average,
                &mut state.windows,
                queue as usize,
                samples,
            );
            if let Some(averages) = averages {
                detect::moving_average::detect(config, ctx, averages.hardware);
            }
        })
    }

    /// Report cumulative MSDU transmit/drop counts for a queue.
    pub fn update_msdu_drop(
        &self,
        peer: &PeerHandle,
        tid: u8,
        queue: u8,
        total: u64,
        drop: u64,
        ttl_drop: u64,
    ) -> Result<(), TelemetryError> {
        self.inner.with_queue(peer, tid, queue, |config, _, ctx| {
            detect::per_packet::detect_msdu_drop(config, ctx, total, drop, ttl_drop);
        })
    }

    /// Rates computed for a queue by the most recent per-second sweep.
    pub fn get_rate(&self, peer: &PeerHandle, queue: u8) -> Result<ThroughputRate, TelemetryError> {
        check_queue(queue)?;
        Ok(peer.peer.lock()?.stats[queue as usize].rate())
    }

    /// Averages from the most recently completed window set of a queue.
    pub fn pull_moving_average(
        &self,
        peer: &PeerHandle,
        queue: u8,
    ) -> Result<DelaySamples, TelemetryError> {
        check_queue(queue)?;
        let averages = peer.peer.lock()?.stats[queue as usize].moving_average.averages;
        debug!(
            "{} queue {queue} moving averages: nw {} sw {} hw {}",
            peer.mac(),
            averages.network,
            averages.software,
            averages.hardware
        );
        Ok(averages)
    }

    /// Run the one-second sweep now, as the timer would.
    pub fn run_per_second_sweep(&self) {
        self.inner.per_second_tick();
    }

    /// Run the N-second sweep now, as the timer would.
    pub fn run_n_second_sweep(&self) {
        self.inner.n_second_tick();
    }

    /// Number of attached peers.
    pub fn peer_count(&self) -> usize {
        self.inner.registry.lock().len()
    }

    /// Are the SLA timers running?
    pub fn timers_running(&self) -> bool {
        self.inner.registry.lock().timers.is_some()
    }

    /// Detach every peer and stop the timers. Outstanding handles are
    /// rejected from here on. Also run on drop.
    pub fn shutdown(&self) {
        let (peers, timers) = {
            let mut registry = self.inner.registry.lock();
            (registry.drain(), registry.timers.take())
        };
        for peer in &peers {
            peer.detach();
        }
        if let Some(timers) = timers {
            timers.stop();
        }
        if !peers.is_empty() {
            warn!("Engine shut down with {} peers attached", peers.len());
        }
    }
}

impl Drop for SawfTelemetry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelNotifier, DropCounters, MpduCounters, ThroughputCounters};
    use sawf_config::{ServiceClassParams, SlaThresholds};
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingSource {
        pulls: AtomicU64,
    }

    impl CounterSource for CountingSource {
        fn throughput(&self, _: StatsHandle, _: u8) -> ThroughputCounters {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            ThroughputCounters::default()
        }
        fn mpdu_stats(&self, _: StatsHandle, _: u8) -> MpduCounters {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            MpduCounters::default()
        }
        fn drop_stats(&self, _: StatsHandle, _: u8) -> DropCounters {
            DropCounters::default()
        }
    }

    fn engine_with_tick(tick: Duration) -> (SawfTelemetry, crossbeam_channel::Receiver<BreachEvent>) {
        let config = Arc::new(ConfigStore::new());
        config
            .set_service_class(
                5,
                true,
                ServiceClassParams {
                    min_thruput_rate: 1000,
                    ..Default::default()
                },
            )
            .unwrap();
        config
            .set_sla(
                5,
                SlaThresholds {
                    min_thruput_rate: 80,
                    ..Default::default()
                },
            )
            .unwrap();
        config
            .set_sla_detection(
                DetectionStrategy::PerSecond,
                SlaThresholds {
                    min_thruput_rate: 1,
                    ..Default::default()
                },
            )
            .unwrap();
        let (notifier, rx) = ChannelNotifier::new();
        (SawfTelemetry::with_tick(config, Arc::new(notifier), tick), rx)
    }

    #[test]
    fn timers_sweep_until_last_peer_freed() {
        let (engine, _rx) = engine_with_tick(Duration::from_millis(5));
        let source = Arc::new(CountingSource::default());
        let mac = MacAddress::new([2, 0, 0, 0, 0, 1]);

        assert!(!engine.timers_running());
        let first = engine
            .alloc_peer(source.clone(), StatsHandle(1), mac, 5, 0)
            .unwrap();
        let second = engine
            .alloc_peer(source.clone(), StatsHandle(2), mac, 5, 1)
            .unwrap();
        assert!(engine.timers_running());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while source.pulls.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(source.pulls.load(Ordering::SeqCst) > 0);

        engine.free_peer(first);
        assert!(engine.timers_running());
        engine.free_peer(second);
        assert!(!engine.timers_running());

        let after_free = source.pulls.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(source.pulls.load(Ordering::SeqCst), after_free);
    }

    #[test]
    fn timers_restart_on_next_attach() {
        let (engine, _rx) = engine_with_tick(Duration::from_millis(5));
        let source = Arc::new(CountingSource::default());
        let mac = MacAddress::new([2, 0, 0, 0, 0, 2]);
        let peer = engine.alloc_peer(source.clone(), StatsHandle(1), mac, 5, 0).unwrap();
        engine.free_peer(peer);
        assert!(!engine.timers_running());
        let peer = engine.alloc_peer(source, StatsHandle(1), mac, 5, 0).unwrap();
        assert!(engine.timers_running());
        engine.shutdown();
        assert!(!engine.timers_running());
        assert!(peer.is_detached());
    }

    #[test]
    fn invalid_initial_queue_registers_nothing() {
        let (engine, _rx) = engine_with_tick(Duration::from_secs(60));
        let result = engine.alloc_peer(
            Arc::new(CountingSource::default()),
            StatsHandle(0),
            MacAddress::default(),
            5,
            16,
        );
        assert!(matches!(result, Err(TelemetryError::InvalidQueue(16))));
        assert_eq!(engine.peer_count(), 0);
        assert!(!engine.timers_running());
    }
}
