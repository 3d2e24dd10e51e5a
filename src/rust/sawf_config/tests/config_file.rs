//! Loading a configuration file from disk and applying it to a live store.

use sawf_config::{
    load_config, Config, ConfigStore, DetectionStrategy, SawfConfigError, SlaParameter,
    CONFIG_PATH_ENV,
};
use std::path::PathBuf;

const SAWF_CONF: &str = r#"
version = "1.0"

[moving_average]
packets = 1000
windows = 4

[sla_period]
packets = 50000
seconds = 5

[detection.per_second]
min_thruput_rate = 1

[detection.per_n_second]
burst_size = 1
msdu_rate_loss = 1

[[service_class]]
id = 5
min_thruput_rate = 1000
burst_size = 65536
[service_class.sla]
min_thruput_rate = 80
burst_size = 90

[[service_class]]
id = 12
delay_bound = 50
"#;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{name}-{}.conf", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn file_applies_to_store() {
    let path = write_temp("sawf-apply", SAWF_CONF);
    let config = Config::load_from_path(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let store = ConfigStore::from_config(&config).unwrap();
    let snap = store.snapshot();

    assert_eq!(snap.moving_average().windows, 4);
    assert_eq!(snap.sla_period().seconds, 5);
    assert!(snap.is_configured(5));
    assert!(snap.is_configured(12));
    assert!(snap.sla_configured(5));
    assert!(!snap.sla_configured(12));
    assert!(snap.delay_bound_configured(12));
    assert!(snap.strategy_enabled(DetectionStrategy::PerSecond));
    assert!(snap.strategy_enabled(DetectionStrategy::PerNSecond));
    assert!(!snap.strategy_enabled(DetectionStrategy::MovingAverage));
    assert_eq!(
        snap.threshold_for(5, DetectionStrategy::PerNSecond, SlaParameter::BurstSize),
        Some(90)
    );
    // Loss detection is enabled but class 5 has no loss threshold
    assert_eq!(
        snap.threshold_for(5, DetectionStrategy::PerNSecond, SlaParameter::MsduLoss),
        None
    );
}

#[test]
fn rejected_file_leaves_store_untouched() {
    let store = ConfigStore::new();
    store.set_sla_period(100_000, 3).unwrap();
    let before = store.snapshot();

    let mut config = Config::load_from_string(SAWF_CONF).unwrap();
    config.service_classes[1].params.msdu_rate_loss = 20_000;
    assert!(matches!(
        store.apply(&config),
        Err(SawfConfigError::ParameterOutOfRange { .. })
    ));
    assert_eq!(*store.snapshot(), *before);
}

#[test]
fn missing_file_is_io_error() {
    let path = std::env::temp_dir().join("sawf-does-not-exist.conf");
    assert!(matches!(
        Config::load_from_path(&path),
        Err(SawfConfigError::Io(_))
    ));
}

#[test]
fn cached_load_follows_environment() {
    let path = write_temp("sawf-cached", SAWF_CONF);
    std::env::set_var(CONFIG_PATH_ENV, &path);
    let first = load_config().unwrap();
    let second = load_config().unwrap();
    std::env::remove_var(CONFIG_PATH_ENV);
    std::fs::remove_file(&path).ok();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.service_classes.len(), 2);
}
