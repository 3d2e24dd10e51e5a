use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{SawfConfigError, SlaParameter};

/// The four independent breach-detection strategies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// Evaluated every second by the throughput sweep.
    PerSecond = 0,
    /// Evaluated every N seconds by the aggregate sweep.
    PerNSecond = 1,
    /// Evaluated whenever the data path reports a new batch of packets.
    PerPacketCount = 2,
    /// Evaluated when a moving-average window set rolls over.
    MovingAverage = 3,
}

impl DetectionStrategy {
    /// Number of strategies.
    pub const COUNT: usize = 4;

    /// Every strategy, in id order.
    pub const ALL: [DetectionStrategy; 4] = [
        DetectionStrategy::PerSecond,
        DetectionStrategy::PerNSecond,
        DetectionStrategy::PerPacketCount,
        DetectionStrategy::MovingAverage,
    ];

    /// Slot index in the detection table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The parameters this strategy knows how to evaluate.
    pub fn parameters(self) -> &'static [SlaParameter] {
        match self {
            DetectionStrategy::PerSecond => {
                &[SlaParameter::MinThroughput, SlaParameter::MaxThroughput]
            }
            DetectionStrategy::PerNSecond => &[
                SlaParameter::BurstSize,
                SlaParameter::ServiceInterval,
                SlaParameter::MsduTtl,
                SlaParameter::MsduLoss,
            ],
            DetectionStrategy::PerPacketCount => &[
                SlaParameter::DelayBound,
                SlaParameter::MsduTtl,
                SlaParameter::MsduLoss,
            ],
            DetectionStrategy::MovingAverage => &[SlaParameter::DelayBound],
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionStrategy::PerSecond => "per_second",
            DetectionStrategy::PerNSecond => "per_n_second",
            DetectionStrategy::PerPacketCount => "per_packet_count",
            DetectionStrategy::MovingAverage => "moving_average",
        };
        f.write_str(name)
    }
}

impl TryFrom<u8> for DetectionStrategy {
    type Error = SawfConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DetectionStrategy::ALL
            .get(value as usize)
            .copied()
            .ok_or(SawfConfigError::InvalidStrategy(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_ids() {
        assert_eq!(DetectionStrategy::try_from(0).unwrap(), DetectionStrategy::PerSecond);
        assert_eq!(DetectionStrategy::try_from(3).unwrap(), DetectionStrategy::MovingAverage);
        assert!(matches!(
            DetectionStrategy::try_from(4),
            Err(SawfConfigError::InvalidStrategy(4))
        ));
    }
}
