//! Manages the `/etc/sawf.conf` file.

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use crate::service_class::{check_service_class_id, validate_thresholds};
use crate::{
    validate_service_class, DetectionStrategy, MovingAverageParams, SawfConfigError,
    ServiceClassParams, SlaPeriodParams, SlaThresholds,
};

/// Where the configuration lives unless overridden.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sawf.conf";

/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "SAWF_CONFIG";

const CONFIG_VERSION: &str = "1.0";

/// Top level of the `/etc/sawf.conf` file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// File format version. Must be "1.0".
    pub version: String,

    /// Moving-average sampling. Defaults to 1000 packets x 10 windows.
    #[serde(default)]
    pub moving_average: MovingAverageParams,

    /// SLA evaluation cadence. Defaults to 100000 packets / 10 seconds.
    #[serde(default)]
    pub sla_period: SlaPeriodParams,

    /// Which parameters each detection strategy evaluates.
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Service-class definitions.
    #[serde(default, rename = "service_class")]
    pub service_classes: Vec<ServiceClassEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            moving_average: MovingAverageParams::default(),
            sla_period: SlaPeriodParams::default(),
            detection: DetectionConfig::default(),
            service_classes: Vec::new(),
        }
    }
}

/// Per-strategy detection enables. A nonzero field turns on checking of
/// that parameter under that strategy.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Checked by the one-second timer
    pub per_second: SlaThresholds,
    /// Checked by the N-second timer
    pub per_n_second: SlaThresholds,
    /// Checked on data-path reports
    pub per_packet_count: SlaThresholds,
    /// Checked on moving-average rollover
    pub moving_average: SlaThresholds,
}

impl DetectionConfig {
    /// The enables for `strategy`.
    pub fn get(&self, strategy: DetectionStrategy) -> &SlaThresholds {
        match strategy {
            DetectionStrategy::PerSecond => &self.per_second,
            DetectionStrategy::PerNSecond => &self.per_n_second,
            DetectionStrategy::PerPacketCount => &self.per_packet_count,
            DetectionStrategy::MovingAverage => &self.moving_average,
        }
    }
}

/// One `[[service_class]]` table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServiceClassEntry {
    /// Service-class id, 1..=128
    pub id: u8,

    /// Set to false to declare the class but leave it unconfigured.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Targets, in configuration units.
    #[serde(flatten)]
    pub params: ServiceClassParams,

    /// Pass-rate thresholds. Without this table no SLA is enforced for
    /// the class.
    #[serde(default)]
    pub sla: Option<SlaThresholds>,
}

fn default_enabled() -> bool {
    true
}

impl Config {
    /// Parse a configuration from a TOML string and validate it.
    pub fn load_from_string(raw: &str) -> Result<Self, SawfConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self, SawfConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::load_from_string(&raw)?;
        debug!("Loaded {}", path.display());
        Ok(config)
    }

    /// Check the whole file for consistency without applying it.
    pub fn validate(&self) -> Result<(), SawfConfigError> {
        if self.version.trim() != CONFIG_VERSION {
            return Err(SawfConfigError::Validation(format!(
                "Unsupported configuration version '{}' (expected {CONFIG_VERSION})",
                self.version
            )));
        }
        if self.moving_average.windows == 0 {
            return Err(SawfConfigError::InvalidWindowCount);
        }
        if self.sla_period.seconds == 0 {
            return Err(SawfConfigError::InvalidSlaPeriod);
        }
        for strategy in DetectionStrategy::ALL {
            validate_thresholds(self.detection.get(strategy))?;
        }

        let mut seen = HashSet::new();
        for entry in &self.service_classes {
            check_service_class_id(entry.id)?;
            if !seen.insert(entry.id) {
                return Err(SawfConfigError::Validation(format!(
                    "Service class {} is defined more than once",
                    entry.id
                )));
            }
            validate_service_class(&entry.params)?;
            if let Some(sla) = &entry.sla {
                validate_thresholds(sla)?;
            }
        }
        Ok(())
    }
}

/// The configuration path in effect: `$SAWF_CONFIG`, or `/etc/sawf.conf`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

struct CachedConfig {
    path: PathBuf,
    modified: Option<SystemTime>,
    config: Arc<Config>,
}

static CONFIG: Lazy<ArcSwap<Option<Arc<CachedConfig>>>> =
    Lazy::new(|| ArcSwap::from_pointee(None));

fn metadata_modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Load the configuration file, caching the result.
///
/// The cache is invalidated when the path or the file's modification time
/// changes.
pub fn load_config() -> Result<Arc<Config>, SawfConfigError> {
    let path = config_path();
    let modified = metadata_modified(&path);

    if let Some(cached) = CONFIG.load().as_ref() {
        if cached.path == path && cached.modified == modified {
            return Ok(cached.config.clone());
        }
    }

    let config = Arc::new(Config::load_from_path(&path)?);
    info!("Configuration loaded from {}", path.display());
    CONFIG.store(
        Some(Arc::new(CachedConfig {
            path,
            modified,
            config: config.clone(),
        }))
        .into(),
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlaParameter;

    const EXAMPLE: &str = r#"
version = "1.0"

[moving_average]
packets = 500
windows = 4

[detection.per_second]
min_thruput_rate = 1

[detection.moving_average]
delay_bound = 1

[[service_class]]
id = 5
min_thruput_rate = 1000
delay_bound = 4294967295
[service_class.sla]
min_thruput_rate = 80

[[service_class]]
id = 9
enabled = false
"#;

    #[test]
    fn parse_example() {
        let config = Config::load_from_string(EXAMPLE).unwrap();
        assert_eq!(config.moving_average.windows, 4);
        assert_eq!(config.sla_period, SlaPeriodParams::default());
        assert!(config.detection.per_second.is_set(SlaParameter::MinThroughput));
        assert_eq!(config.service_classes.len(), 2);

        let five = &config.service_classes[0];
        assert!(five.enabled);
        assert_eq!(five.params.min_thruput_rate, 1000);
        assert_eq!(five.params.delay_bound, crate::SAWF_PARAM_UNSET);
        assert_eq!(five.sla.map(|s| s.min_thruput_rate), Some(80));

        let nine = &config.service_classes[1];
        assert!(!nine.enabled);
        assert!(nine.sla.is_none());
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let config = Config::load_from_string("version = \"1.0\"").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn wrong_version_rejected() {
        assert!(matches!(
            Config::load_from_string("version = \"2.0\""),
            Err(SawfConfigError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_class_rejected() {
        let raw = "version = \"1.0\"\n[[service_class]]\nid = 3\n[[service_class]]\nid = 3\n";
        assert!(matches!(
            Config::load_from_string(raw),
            Err(SawfConfigError::Validation(_))
        ));
    }

    #[test]
    fn bad_id_rejected() {
        let raw = "version = \"1.0\"\n[[service_class]]\nid = 0\n";
        assert!(matches!(
            Config::load_from_string(raw),
            Err(SawfConfigError::InvalidServiceClassId(0))
        ));
    }

    #[test]
    fn syntax_error_is_parse_error() {
        assert!(matches!(
            Config::load_from_string("version = "),
            Err(SawfConfigError::Parse(_))
        ));
    }
}
