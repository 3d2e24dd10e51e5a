//! A `Bitmap` is a fixed 128-bit set. It is large enough for every
//! service-class id, and is also used for the much smaller active-queue
//! and breach-state sets, so no dynamic sizing is ever required.

use serde::{Deserialize, Serialize};

/// A set of bit indices in `0..128`, stored inline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bitmap(u128);

impl Bitmap {
    /// Number of addressable bits.
    pub const CAPACITY: usize = 128;

    /// An empty bitmap.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Set bit `index`. Indices outside the capacity are ignored.
    pub fn set(&mut self, index: usize) {
        if index < Self::CAPACITY {
            self.0 |= 1u128 << index;
        }
    }

    /// Clear bit `index`. Indices outside the capacity are ignored.
    pub fn clear(&mut self, index: usize) {
        if index < Self::CAPACITY {
            self.0 &= !(1u128 << index);
        }
    }

    /// Set or clear bit `index` depending on `value`.
    pub fn assign(&mut self, index: usize, value: bool) {
        if value {
            self.set(index);
        } else {
            self.clear(index);
        }
    }

    /// Is bit `index` set?
    pub fn test(&self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1u128 << index) != 0
    }

    /// Iterate the set bit indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        let mut remaining = self.0;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let index = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            Some(index)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear() {
        let mut bits = Bitmap::new();
        assert_eq!(bits, Bitmap::new());
        bits.set(3);
        bits.set(127);
        assert!(bits.test(3));
        assert!(bits.test(127));
        assert!(!bits.test(4));
        bits.clear(3);
        assert!(!bits.test(3));
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![127]);
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut bits = Bitmap::new();
        bits.set(128);
        bits.set(500);
        assert_eq!(bits, Bitmap::new());
        assert!(!bits.test(128));
    }

    #[test]
    fn iterates_in_order() {
        let mut bits = Bitmap::new();
        for i in [15, 0, 64, 7] {
            bits.set(i);
        }
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 7, 15, 64]);
    }

    #[test]
    fn assign_toggles() {
        let mut bits = Bitmap::new();
        bits.assign(5, true);
        assert!(bits.test(5));
        bits.assign(5, false);
        assert!(!bits.test(5));
    }
}
