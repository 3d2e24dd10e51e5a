//! Configuration for SAWF SLA monitoring.
//!
//! Two layers live here. `Config` is the on-disk TOML file (`/etc/sawf.conf`),
//! loaded and validated at startup. `ConfigStore` is the live, in-memory
//! table the breach detectors read from; it is updated through the setter
//! calls of the control plane (or in one go from a `Config`) and always
//! hands readers a complete snapshot.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

mod detection;
mod error;
mod etc;
mod params;
mod service_class;
mod store;
pub mod units;

pub use detection::DetectionStrategy;
pub use error::SawfConfigError;
pub use etc::{config_path, load_config, Config, DetectionConfig, ServiceClassEntry, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
pub use params::{ServiceClassParams, SlaParameter, SlaParams, SlaThresholds};
pub use service_class::{
    validate_service_class, valid_service_class_id, SAWF_MAX_SVC_CLASS, SAWF_MIN_SVC_CLASS,
    SAWF_PARAM_UNSET,
};
pub use store::{ConfigStore, MovingAverageParams, SlaConfig, SlaPeriodParams};
