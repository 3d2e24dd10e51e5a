mod counter;
pub use counter::{counter_delta, MonotonicCounter};
