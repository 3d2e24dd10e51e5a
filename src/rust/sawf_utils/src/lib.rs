//! Collection of utility types shared by the SAWF telemetry crates

#![warn(missing_docs)]

/// Fixed-size bitmaps for service-class, queue and breach tracking.
pub mod bitmap;

/// Utilities for handling 802.11 MAC addresses in text form
pub mod mac_address;

/// Utilities for scaling byte rates and delays to human-readable format
pub mod rate_scale;

/// Monotonic counter helpers
pub mod units;

pub use bitmap::Bitmap;
pub use mac_address::MacAddress;
