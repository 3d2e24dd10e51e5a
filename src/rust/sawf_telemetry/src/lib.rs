//! SAWF SLA breach detection.
//!
//! Tracks, per wireless peer and per host queue, whether the SLA targets of
//! the queue's service class are being met. Counters arrive either pushed
//! from the data path (delay, MSDU drops, moving-average samples) or pulled
//! from a [`CounterSource`] by two timers: a one-second throughput sweep and
//! an N-second aggregate sweep. Each check compares a pass rate against the
//! configured threshold and a [`BreachNotifier`] hears about every change
//! of breach state.
//!
//! The timers run only while at least one peer is attached.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

mod counters;
mod detect;
mod engine;
mod error;
mod moving_average;
mod notify;
mod peer;
mod registry;
mod timers;

/// Host queues per peer.
pub const SAWF_MAX_QUEUES: usize = 16;

/// TIDs per peer.
pub const SAWF_MAX_TID: usize = 8;

/// MSDU queues per TID.
pub const SAWF_MAX_MSDUQ_PER_TID: usize = 2;

pub use counters::{CounterSource, DropCounters, MpduCounters, StatsHandle, ThroughputCounters};
pub use engine::SawfTelemetry;
pub use error::TelemetryError;
pub use moving_average::DelaySamples;
pub use notify::{BreachEvent, BreachNotifier, ChannelNotifier, LogNotifier};
pub use peer::queue_stats::ThroughputRate;
pub use peer::{PeerHandle, PeerId};
