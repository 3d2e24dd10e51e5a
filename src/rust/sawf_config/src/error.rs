use thiserror::Error;

use crate::SlaParameter;

/// Everything that can go wrong while configuring SLA monitoring.
/// A rejected call never changes the previously published configuration.
#[derive(Debug, Error)]
pub enum SawfConfigError {
    /// Service-class ids run from 1 to 128
    #[error("Invalid service class id {0} (expected 1..=128)")]
    InvalidServiceClassId(u8),

    /// Not one of the four detection strategies
    #[error("Invalid SLA detection strategy {0}")]
    InvalidStrategy(u8),

    /// Not one of the seven SLA parameters
    #[error("Invalid SLA parameter id {0}")]
    InvalidParameter(u8),

    /// A service-class target is outside its permitted range
    #[error("Service class {parameter} value {value} is outside the permitted range")]
    ParameterOutOfRange {
        /// Offending parameter
        parameter: SlaParameter,
        /// Rejected value
        value: u32,
    },

    /// Thresholds are percentages
    #[error("SLA {parameter} threshold {value}% exceeds 100%")]
    ThresholdOutOfRange {
        /// Offending parameter
        parameter: SlaParameter,
        /// Rejected value
        value: u8,
    },

    /// The moving average needs at least one window
    #[error("Moving average window count must be at least 1")]
    InvalidWindowCount,

    /// The N-second timer needs a period of at least one second
    #[error("SLA evaluation period must be at least 1 second")]
    InvalidSlaPeriod,

    /// The configuration file could not be read
    #[error("Unable to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema
    #[error("Unable to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration file parsed, but is inconsistent
    #[error("Invalid configuration: {0}")]
    Validation(String),
}
