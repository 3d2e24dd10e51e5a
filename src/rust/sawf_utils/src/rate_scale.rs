/// Scale a byte-per-second rate into bits per second, with a
/// human-readable suffix.
pub fn scale_byte_rate(bytes_per_second: u64) -> String {
  let n = bytes_per_second.saturating_mul(8);
  if n > 1_000_000_000 {
    format!("{:.2} gbit/s", n as f32 / 1_000_000_000.0)
  } else if n > 1_000_000 {
    format!("{:.2} mbit/s", n as f32 / 1_000_000.0)
  } else if n > 1_000 {
    format!("{:.2} kbit/s", n as f32 / 1_000.0)
  } else {
    format!("{n} bit/s")
  }
}

/// Scale a delay given in microseconds.
pub fn scale_delay_us(n: u64) -> String {
  if n > 1_000_000 {
    format!("{:.2} s", n as f32 / 1_000_000.0)
  } else if n > 1_000 {
    format!("{:.2} ms", n as f32 / 1_000.0)
  } else {
    format!("{n} us")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn byte_rates() {
    assert_eq!(scale_byte_rate(100), "800 bit/s");
    assert_eq!(scale_byte_rate(250_000), "2.00 mbit/s");
  }

  #[test]
  fn delays() {
    assert_eq!(scale_delay_us(250), "250 us");
    assert_eq!(scale_delay_us(2_500), "2.50 ms");
  }
}
