//! Service-class id and parameter range checks.

use crate::{ServiceClassParams, SawfConfigError, SlaParameter, SlaThresholds};

/// Lowest valid service-class id. Id 0 is reserved.
pub const SAWF_MIN_SVC_CLASS: u8 = 1;

/// Highest valid service-class id.
pub const SAWF_MAX_SVC_CLASS: u8 = 128;

/// Marks a service-class parameter as "not specified". Detectors treat
/// it exactly like zero.
pub const SAWF_PARAM_UNSET: u32 = 0xFFFF_FFFF;

// Min/max throughput: 0 - 10gbps, 1 kbps granularity
const MAX_THROUGHPUT: u32 = 10 * 1204 * 1024;
// 0 - 16 Mbytes
const MAX_BURST_SIZE: u32 = 16 * 1024 * 1024;
// 0 - 10 seconds in 100 µs steps
const MAX_TIME_STEPS: u32 = 10 * 100 * 100;
// 0 - 100% in 0.01% steps
const MAX_MSDU_LOSS_RATE: u32 = 10_000;

/// Is `id` a usable service-class id?
pub fn valid_service_class_id(id: u8) -> bool {
    (SAWF_MIN_SVC_CLASS..=SAWF_MAX_SVC_CLASS).contains(&id)
}

pub(crate) fn check_service_class_id(id: u8) -> Result<(), SawfConfigError> {
    if valid_service_class_id(id) {
        Ok(())
    } else {
        Err(SawfConfigError::InvalidServiceClassId(id))
    }
}

fn upper_limit(parameter: SlaParameter) -> u32 {
    match parameter {
        SlaParameter::MinThroughput | SlaParameter::MaxThroughput => MAX_THROUGHPUT,
        SlaParameter::BurstSize => MAX_BURST_SIZE,
        SlaParameter::ServiceInterval | SlaParameter::DelayBound | SlaParameter::MsduTtl => {
            MAX_TIME_STEPS
        }
        SlaParameter::MsduLoss => MAX_MSDU_LOSS_RATE,
    }
}

/// Check every parameter of a service class. Each value must either be
/// [`SAWF_PARAM_UNSET`] or lie within the documented range.
pub fn validate_service_class(params: &ServiceClassParams) -> Result<(), SawfConfigError> {
    for (parameter, value) in params.iter() {
        if value != SAWF_PARAM_UNSET && value > upper_limit(parameter) {
            return Err(SawfConfigError::ParameterOutOfRange { parameter, value });
        }
    }
    Ok(())
}

pub(crate) fn validate_thresholds(thresholds: &SlaThresholds) -> Result<(), SawfConfigError> {
    for (parameter, value) in thresholds.iter() {
        if value > 100 {
            return Err(SawfConfigError::ThresholdOutOfRange { parameter, value });
        }
    }
    Ok(())
}

/// Replace the "unset" sentinel with zero, so detectors only ever
/// distinguish "zero: not enforced" from a real target.
pub(crate) fn normalize(params: &ServiceClassParams) -> ServiceClassParams {
    let clean = |v: u32| if v == SAWF_PARAM_UNSET { 0 } else { v };
    ServiceClassParams {
        min_thruput_rate: clean(params.min_thruput_rate),
        max_thruput_rate: clean(params.max_thruput_rate),
        burst_size: clean(params.burst_size),
        service_interval: clean(params.service_interval),
        delay_bound: clean(params.delay_bound),
        msdu_ttl: clean(params.msdu_ttl),
        msdu_rate_loss: clean(params.msdu_rate_loss),
    }
}
