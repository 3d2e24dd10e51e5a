//! Conversion factors from configuration units into the units of the raw
//! counters the detectors compare against.
//!
//! | Parameter                       | Configured in | Compared in     |
//! |---------------------------------|---------------|-----------------|
//! | min/max throughput              | kbit/s        | bytes per tick  |
//! | delay bound, service interval,  | 100 µs        | µs              |
//! | MSDU TTL                        |               |                 |
//! | burst size                      | bytes         | bytes           |
//! | MSDU loss rate                  | 0.01 %        | MSDUs           |

/// kbit/s to bytes per one-second tick.
pub const THROUGHPUT_UNIT: u64 = 1000 / 8;

/// 100 µs steps to µs.
pub const DELAY_BOUND_UNIT: u64 = 100;

/// Loss-rate multiplier applied when computing the allowed drop budget.
pub const MSDU_LOSS_UNIT: u64 = 1;

/// Convert a configured throughput (kbit/s) to bytes per second.
pub fn throughput_bytes_per_second(kbps: u32) -> u64 {
    kbps as u64 * THROUGHPUT_UNIT
}

/// Convert a configured delay (100 µs steps) to microseconds.
pub fn delay_bound_us(steps: u32) -> u64 {
    steps as u64 * DELAY_BOUND_UNIT
}
