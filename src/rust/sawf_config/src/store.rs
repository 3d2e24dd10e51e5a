//! The live SLA configuration table.
//!
//! Readers (the breach detectors, from timer and data-path context) call
//! `ConfigStore::snapshot()` and get an immutable `SlaConfig`. Writers are
//! serialized by a mutex; each write clones the current table, modifies the
//! clone and publishes it in one atomic swap, so a reader never observes a
//! half-applied update.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use sawf_utils::Bitmap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::service_class::{check_service_class_id, normalize, validate_thresholds};
use crate::{
    validate_service_class, valid_service_class_id, Config, DetectionStrategy,
    ServiceClassParams, SawfConfigError, SlaParameter, SlaThresholds, SAWF_MAX_SVC_CLASS,
};

const DEFAULT_MOV_AVG_PACKETS: u32 = 1000;
const DEFAULT_MOV_AVG_WINDOWS: u32 = 10;
const DEFAULT_SLA_PACKETS: u32 = 100_000;
const DEFAULT_SLA_SECONDS: u32 = 10;

/// Moving-average sampling parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovingAverageParams {
    /// Packets the data path averages into one window sample
    pub packets: u32,
    /// Window samples accumulated before the average is evaluated
    pub windows: u32,
}

impl Default for MovingAverageParams {
    fn default() -> Self {
        Self {
            packets: DEFAULT_MOV_AVG_PACKETS,
            windows: DEFAULT_MOV_AVG_WINDOWS,
        }
    }
}

/// SLA evaluation cadence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaPeriodParams {
    /// Packets between per-packet-count reports from the data path
    pub packets: u32,
    /// Period of the N-second timer
    pub seconds: u32,
}

impl Default for SlaPeriodParams {
    fn default() -> Self {
        Self {
            packets: DEFAULT_SLA_PACKETS,
            seconds: DEFAULT_SLA_SECONDS,
        }
    }
}

/// A complete, immutable view of the SLA configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SlaConfig {
    // Indexed by service-class id - 1
    service_classes: Vec<ServiceClassParams>,
    configured: Bitmap,
    sla: Vec<SlaThresholds>,
    sla_enabled: Bitmap,
    detection: [SlaThresholds; DetectionStrategy::COUNT],
    moving_average: MovingAverageParams,
    sla_period: SlaPeriodParams,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            service_classes: vec![ServiceClassParams::default(); SAWF_MAX_SVC_CLASS as usize],
            configured: Bitmap::new(),
            sla: vec![SlaThresholds::default(); SAWF_MAX_SVC_CLASS as usize],
            sla_enabled: Bitmap::new(),
            detection: [SlaThresholds::default(); DetectionStrategy::COUNT],
            moving_average: MovingAverageParams::default(),
            sla_period: SlaPeriodParams::default(),
        }
    }
}

impl SlaConfig {
    /// Service-class targets for `id`. Unknown or unconfigured ids read as
    /// all-zero.
    pub fn service_class(&self, id: u8) -> ServiceClassParams {
        if !valid_service_class_id(id) {
            return ServiceClassParams::default();
        }
        self.service_classes[id as usize - 1]
    }

    /// Has `id` been configured (and not since disabled)?
    pub fn is_configured(&self, id: u8) -> bool {
        valid_service_class_id(id) && self.configured.test(id as usize - 1)
    }

    /// Ids of every configured service class, ascending.
    pub fn configured_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.configured.iter().map(|bit| (bit + 1) as u8)
    }

    /// SLA thresholds for `id`.
    pub fn sla(&self, id: u8) -> SlaThresholds {
        if !valid_service_class_id(id) {
            return SlaThresholds::default();
        }
        self.sla[id as usize - 1]
    }

    /// Has an SLA been set for `id`?
    pub fn sla_configured(&self, id: u8) -> bool {
        valid_service_class_id(id) && self.sla_enabled.test(id as usize - 1)
    }

    /// Detection enables for `strategy`.
    pub fn detection(&self, strategy: DetectionStrategy) -> &SlaThresholds {
        &self.detection[strategy.index()]
    }

    /// Does `strategy` have any of its parameters enabled?
    pub fn strategy_enabled(&self, strategy: DetectionStrategy) -> bool {
        self.detection(strategy).any_set(strategy.parameters())
    }

    /// The threshold to enforce for `parameter` of service class `id` under
    /// `strategy`, or `None` when either the class threshold or the
    /// strategy enable is zero.
    pub fn threshold_for(
        &self,
        id: u8,
        strategy: DetectionStrategy,
        parameter: SlaParameter,
    ) -> Option<u8> {
        let threshold = self.sla(id).get(parameter);
        if threshold == 0 || !self.detection(strategy).is_set(parameter) {
            return None;
        }
        Some(threshold)
    }

    /// Is a real delay bound configured for `id`?
    pub fn delay_bound_configured(&self, id: u8) -> bool {
        self.is_configured(id) && self.service_class(id).delay_bound != 0
    }

    /// Moving-average parameters.
    pub fn moving_average(&self) -> MovingAverageParams {
        self.moving_average
    }

    /// SLA evaluation cadence.
    pub fn sla_period(&self) -> SlaPeriodParams {
        self.sla_period
    }

    fn write_service_class(
        &mut self,
        id: u8,
        enable: bool,
        params: &ServiceClassParams,
    ) -> Result<(), SawfConfigError> {
        check_service_class_id(id)?;
        let slot = id as usize - 1;
        if enable {
            validate_service_class(params)?;
            self.service_classes[slot] = normalize(params);
            self.configured.set(slot);
        } else {
            self.service_classes[slot] = ServiceClassParams::default();
            self.configured.clear(slot);
        }
        Ok(())
    }

    fn write_sla(&mut self, id: u8, thresholds: &SlaThresholds) -> Result<(), SawfConfigError> {
        check_service_class_id(id)?;
        validate_thresholds(thresholds)?;
        let slot = id as usize - 1;
        self.sla[slot] = *thresholds;
        self.sla_enabled.set(slot);
        Ok(())
    }

    fn write_detection(
        &mut self,
        strategy: DetectionStrategy,
        enables: &SlaThresholds,
    ) -> Result<(), SawfConfigError> {
        validate_thresholds(enables)?;
        self.detection[strategy.index()] = *enables;
        Ok(())
    }

    fn write_moving_average(&mut self, params: MovingAverageParams) -> Result<(), SawfConfigError> {
        if params.windows == 0 {
            return Err(SawfConfigError::InvalidWindowCount);
        }
        self.moving_average = params;
        Ok(())
    }

    fn write_sla_period(&mut self, params: SlaPeriodParams) -> Result<(), SawfConfigError> {
        if params.seconds == 0 {
            return Err(SawfConfigError::InvalidSlaPeriod);
        }
        self.sla_period = params;
        Ok(())
    }
}

/// Single-writer, many-reader holder of the current `SlaConfig`.
pub struct ConfigStore {
    current: ArcSwap<SlaConfig>,
    writer: Mutex<()>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// An empty table: no service classes, no SLAs, nothing enabled, and
    /// the default moving-average and SLA-period parameters.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(SlaConfig::default()),
            writer: Mutex::new(()),
        }
    }

    /// Build a store pre-loaded from a configuration file.
    pub fn from_config(config: &Config) -> Result<Self, SawfConfigError> {
        let store = Self::new();
        store.apply(config)?;
        Ok(store)
    }

    /// The current configuration. The returned snapshot never changes;
    /// later writes publish a new one.
    pub fn snapshot(&self) -> Arc<SlaConfig> {
        self.current.load_full()
    }

    fn publish<F>(&self, update: F) -> Result<(), SawfConfigError>
    where
        F: FnOnce(&mut SlaConfig) -> Result<(), SawfConfigError>,
    {
        let _writer = self.writer.lock();
        let mut next = (**self.current.load()).clone();
        update(&mut next)?;
        self.current.store(Arc::new(next));
        Ok(())
    }

    /// Configure (`enable == true`) or clear a service class.
    pub fn set_service_class(
        &self,
        id: u8,
        enable: bool,
        params: ServiceClassParams,
    ) -> Result<(), SawfConfigError> {
        self.publish(|cfg| cfg.write_service_class(id, enable, &params))?;
        debug!("Service class {id} {}: {params:?}", if enable { "set" } else { "cleared" });
        Ok(())
    }

    /// Set the SLA thresholds of a service class.
    pub fn set_sla(&self, id: u8, thresholds: SlaThresholds) -> Result<(), SawfConfigError> {
        self.publish(|cfg| cfg.write_sla(id, &thresholds))?;
        debug!("SLA for service class {id}: {thresholds:?}");
        Ok(())
    }

    /// Set which parameters `strategy` evaluates.
    pub fn set_sla_detection(
        &self,
        strategy: DetectionStrategy,
        enables: SlaThresholds,
    ) -> Result<(), SawfConfigError> {
        self.publish(|cfg| cfg.write_detection(strategy, &enables))?;
        debug!("SLA detection {strategy}: {enables:?}");
        Ok(())
    }

    /// Set the moving-average sample and window counts. Peers already
    /// attached keep the window count they were created with.
    pub fn set_moving_average_params(&self, packets: u32, windows: u32) -> Result<(), SawfConfigError> {
        self.publish(|cfg| cfg.write_moving_average(MovingAverageParams { packets, windows }))?;
        debug!("Moving average: {packets} packets, {windows} windows");
        Ok(())
    }

    /// Set the SLA evaluation cadence.
    pub fn set_sla_period(&self, packets: u32, seconds: u32) -> Result<(), SawfConfigError> {
        self.publish(|cfg| cfg.write_sla_period(SlaPeriodParams { packets, seconds }))?;
        debug!("SLA period: {packets} packets, {seconds} seconds");
        Ok(())
    }

    /// Apply a whole configuration file in one publish. Either every
    /// section applies or nothing changes.
    pub fn apply(&self, config: &Config) -> Result<(), SawfConfigError> {
        config.validate()?;
        self.publish(|cfg| {
            cfg.write_moving_average(config.moving_average)?;
            cfg.write_sla_period(config.sla_period)?;
            for strategy in DetectionStrategy::ALL {
                cfg.write_detection(strategy, config.detection.get(strategy))?;
            }
            for entry in &config.service_classes {
                cfg.write_service_class(entry.id, entry.enabled, &entry.params)?;
                if let Some(sla) = &entry.sla {
                    cfg.write_sla(entry.id, sla)?;
                }
            }
            Ok(())
        })?;
        debug!(
            "Applied configuration with {} service classes",
            config.service_classes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay_sla(pct: u8) -> SlaThresholds {
        SlaThresholds {
            delay_bound: pct,
            ..Default::default()
        }
    }

    #[test]
    fn service_class_set_and_clear() {
        let store = ConfigStore::new();
        let params = ServiceClassParams {
            min_thruput_rate: 1000,
            ..Default::default()
        };
        store.set_service_class(5, true, params).unwrap();
        let snap = store.snapshot();
        assert!(snap.is_configured(5));
        assert_eq!(snap.service_class(5).min_thruput_rate, 1000);
        assert_eq!(snap.configured_ids().collect::<Vec<_>>(), vec![5]);

        store.set_service_class(5, false, params).unwrap();
        let snap = store.snapshot();
        assert!(!snap.is_configured(5));
        assert_eq!(snap.service_class(5), ServiceClassParams::default());
    }

    #[test]
    fn highest_id_fits() {
        let store = ConfigStore::new();
        store.set_service_class(128, true, ServiceClassParams::default()).unwrap();
        store.set_sla(128, delay_sla(50)).unwrap();
        let snap = store.snapshot();
        assert!(snap.is_configured(128));
        assert!(snap.sla_configured(128));
    }

    #[test]
    fn invalid_id_leaves_config_untouched() {
        let store = ConfigStore::new();
        store.set_sla(3, delay_sla(90)).unwrap();
        let before = store.snapshot();
        assert!(matches!(
            store.set_sla(0, delay_sla(10)),
            Err(SawfConfigError::InvalidServiceClassId(0))
        ));
        assert!(matches!(
            store.set_service_class(129, true, ServiceClassParams::default()),
            Err(SawfConfigError::InvalidServiceClassId(129))
        ));
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn threshold_requires_both_tables() {
        let store = ConfigStore::new();
        store.set_sla(7, delay_sla(80)).unwrap();
        let snap = store.snapshot();
        assert_eq!(
            snap.threshold_for(7, DetectionStrategy::MovingAverage, SlaParameter::DelayBound),
            None
        );

        store
            .set_sla_detection(DetectionStrategy::MovingAverage, delay_sla(1))
            .unwrap();
        let snap = store.snapshot();
        assert_eq!(
            snap.threshold_for(7, DetectionStrategy::MovingAverage, SlaParameter::DelayBound),
            Some(80)
        );
        assert_eq!(
            snap.threshold_for(7, DetectionStrategy::PerPacketCount, SlaParameter::DelayBound),
            None
        );
        assert_eq!(
            snap.threshold_for(8, DetectionStrategy::MovingAverage, SlaParameter::DelayBound),
            None
        );
    }

    #[test]
    fn strategy_enabled_only_counts_its_parameters() {
        let store = ConfigStore::new();
        store
            .set_sla_detection(DetectionStrategy::PerSecond, delay_sla(1))
            .unwrap();
        assert!(!store.snapshot().strategy_enabled(DetectionStrategy::PerSecond));
        store
            .set_sla_detection(
                DetectionStrategy::PerSecond,
                SlaThresholds {
                    max_thruput_rate: 1,
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(store.snapshot().strategy_enabled(DetectionStrategy::PerSecond));
    }

    #[test]
    fn old_snapshots_are_stable() {
        let store = ConfigStore::new();
        let before = store.snapshot();
        store.set_moving_average_params(500, 4).unwrap();
        assert_eq!(before.moving_average().windows, 10);
        assert_eq!(store.snapshot().moving_average().windows, 4);
    }

    #[test]
    fn zero_windows_and_period_rejected() {
        let store = ConfigStore::new();
        assert!(matches!(
            store.set_moving_average_params(100, 0),
            Err(SawfConfigError::InvalidWindowCount)
        ));
        assert!(matches!(
            store.set_sla_period(100, 0),
            Err(SawfConfigError::InvalidSlaPeriod)
        ));
        assert_eq!(store.snapshot().sla_period(), SlaPeriodParams::default());
    }

    #[test]
    fn delay_bound_configured_needs_value() {
        let store = ConfigStore::new();
        store
            .set_service_class(2, true, ServiceClassParams::default())
            .unwrap();
        assert!(!store.snapshot().delay_bound_configured(2));
        store
            .set_service_class(
                2,
                true,
                ServiceClassParams {
                    delay_bound: crate::SAWF_PARAM_UNSET,
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!store.snapshot().delay_bound_configured(2));
        store
            .set_service_class(
                2,
                true,
                ServiceClassParams {
                    delay_bound: 30,
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(store.snapshot().delay_bound_configured(2));
    }
}
