//! The seven SLA parameters, and a generic container that holds one value
//! per parameter. The same shape is used for service-class targets
//! (`u32`, in configuration units), SLA thresholds (`u8` percentages) and
//! per-strategy detection enables (`u8` flags).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SawfConfigError;

/// Identifies one monitored SLA parameter. The discriminants are the
/// parameter ids carried by breach notifications.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaParameter {
    /// Minimum throughput
    MinThroughput = 0,
    /// Maximum throughput
    MaxThroughput = 1,
    /// Burst size
    BurstSize = 2,
    /// Service interval
    ServiceInterval = 3,
    /// Delay bound
    DelayBound = 4,
    /// MSDU time-to-live
    MsduTtl = 5,
    /// MSDU loss rate
    MsduLoss = 6,
}

impl SlaParameter {
    /// Every parameter, in id order.
    pub const ALL: [SlaParameter; 7] = [
        SlaParameter::MinThroughput,
        SlaParameter::MaxThroughput,
        SlaParameter::BurstSize,
        SlaParameter::ServiceInterval,
        SlaParameter::DelayBound,
        SlaParameter::MsduTtl,
        SlaParameter::MsduLoss,
    ];

    /// The numeric parameter id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Short name, matching the configuration file keys.
    pub fn name(self) -> &'static str {
        match self {
            SlaParameter::MinThroughput => "min_thruput_rate",
            SlaParameter::MaxThroughput => "max_thruput_rate",
            SlaParameter::BurstSize => "burst_size",
            SlaParameter::ServiceInterval => "service_interval",
            SlaParameter::DelayBound => "delay_bound",
            SlaParameter::MsduTtl => "msdu_ttl",
            SlaParameter::MsduLoss => "msdu_rate_loss",
        }
    }
}

impl fmt::Display for SlaParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for SlaParameter {
    type Error = SawfConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SlaParameter::ALL
            .get(value as usize)
            .copied()
            .ok_or(SawfConfigError::InvalidParameter(value))
    }
}

/// One value per SLA parameter. Missing keys deserialize to the
/// default (zero), which everywhere means "not configured".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaParams<T> {
    /// Minimum throughput
    pub min_thruput_rate: T,
    /// Maximum throughput
    pub max_thruput_rate: T,
    /// Burst size
    pub burst_size: T,
    /// Service interval
    pub service_interval: T,
    /// Delay bound
    pub delay_bound: T,
    /// MSDU time-to-live
    pub msdu_ttl: T,
    /// MSDU loss rate
    pub msdu_rate_loss: T,
}

impl<T: Copy> SlaParams<T> {
    /// Read the value for `parameter`.
    pub fn get(&self, parameter: SlaParameter) -> T {
        match parameter {
            SlaParameter::MinThroughput => self.min_thruput_rate,
            SlaParameter::MaxThroughput => self.max_thruput_rate,
            SlaParameter::BurstSize => self.burst_size,
            SlaParameter::ServiceInterval => self.service_interval,
            SlaParameter::DelayBound => self.delay_bound,
            SlaParameter::MsduTtl => self.msdu_ttl,
            SlaParameter::MsduLoss => self.msdu_rate_loss,
        }
    }

    /// Iterate `(parameter, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SlaParameter, T)> + '_ {
        SlaParameter::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

impl<T: Copy + Default + PartialEq> SlaParams<T> {
    /// Is the value for `parameter` nonzero?
    pub fn is_set(&self, parameter: SlaParameter) -> bool {
        self.get(parameter) != T::default()
    }

    /// Is any of the given parameters nonzero?
    pub fn any_set(&self, parameters: &[SlaParameter]) -> bool {
        parameters.iter().any(|p| self.is_set(*p))
    }
}

/// Per service-class SLA targets, in configuration units (see [`crate::units`]).
pub type ServiceClassParams = SlaParams<u32>;

/// Per service-class pass-rate thresholds (0-100 %), also used for the
/// per-strategy detection enables.
pub type SlaThresholds = SlaParams<u8>;
