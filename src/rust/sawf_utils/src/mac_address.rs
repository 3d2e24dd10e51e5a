use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::error;

/// Number of octets in an 802.11 MAC address.
pub const MAC_ADDR_SIZE: usize = 6;

/// An 802.11 station address. Serializes as the usual
/// colon-separated hex string (`aa:bb:cc:dd:ee:ff`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct MacAddress(pub [u8; MAC_ADDR_SIZE]);

impl MacAddress {
    /// Wrap a raw octet array.
    pub const fn new(octets: [u8; MAC_ADDR_SIZE]) -> Self {
        Self(octets)
    }

    /// The raw octets.
    pub fn octets(&self) -> [u8; MAC_ADDR_SIZE] {
        self.0
    }
}

impl From<[u8; MAC_ADDR_SIZE]> for MacAddress {
    fn from(octets: [u8; MAC_ADDR_SIZE]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

/// `MacAddress::from_str` accepts six hex octets separated by `:` or `-`.
///
/// ## Example
///
/// ```rust
/// use sawf_utils::MacAddress;
/// let mac: MacAddress = "00:11:22:aa:bb:cc".parse().unwrap();
/// assert_eq!(mac.octets(), [0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc]);
/// ```
impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; MAC_ADDR_SIZE];
        let mut count = 0;
        for part in s.trim().split(|c| c == ':' || c == '-') {
            if count >= MAC_ADDR_SIZE {
                error!("Too many octets in MAC address {s}");
                return Err(MacParseError::WrongLength);
            }
            if part.is_empty() || part.len() > 2 {
                error!("Unable to convert {s} to a MAC address");
                return Err(MacParseError::BadOctet(part.to_string()));
            }
            octets[count] = u8::from_str_radix(part, 16)
                .map_err(|_| MacParseError::BadOctet(part.to_string()))?;
            count += 1;
        }
        if count != MAC_ADDR_SIZE {
            return Err(MacParseError::WrongLength);
        }
        Ok(Self(octets))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// `MacParseError` defines what can go wrong parsing
/// a string into a `MacAddress`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MacParseError {
    /// The address did not contain exactly six octets
    #[error("MAC address must contain exactly six octets")]
    WrongLength,
    /// One of the octets is not a valid hex byte
    #[error("Invalid MAC address octet: {0}")]
    BadOctet(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success() {
        let mac: MacAddress = "de:ad:BE:ef:00:01".parse().unwrap();
        assert_eq!(mac.octets(), [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        let dashed: MacAddress = "de-ad-be-ef-00-01".parse().unwrap();
        assert_eq!(mac, dashed);
    }

    #[test]
    fn parse_fail() {
        assert_eq!(
            "de:ad:be:ef:00".parse::<MacAddress>(),
            Err(MacParseError::WrongLength)
        );
        assert_eq!(
            "de:ad:be:ef:00:01:02".parse::<MacAddress>(),
            Err(MacParseError::WrongLength)
        );
        assert!("de:ad:be:ef:00:zz".parse::<MacAddress>().is_err());
        assert!("dead:be:ef:00:01".parse::<MacAddress>().is_err());
    }

    #[test]
    fn display_is_lower_hex() {
        let mac = MacAddress::new([0xAA, 0x0B, 0, 1, 2, 0xFF]);
        assert_eq!(mac.to_string(), "aa:0b:00:01:02:ff");
    }

    #[test]
    fn serde_as_string() {
        let mac = MacAddress::new([1, 2, 3, 4, 5, 6]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"01:02:03:04:05:06\"");
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
