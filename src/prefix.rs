//! Network prefix (address + mask length) value type.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::endpoint::{Endpoint, Family};
use crate::error::{Error, Result};

/// A network prefix: a network address plus the number of leading bits
/// that are significant.
///
/// The stored network keeps whatever host bits it was built with; use
/// [`normalized`](Self::normalized) to clear them. The port is always zero.
///
/// Prefixes order longest first, then by network address, so a sorted
/// container visits the most specific prefixes before their supernets.
///
/// # Examples
/// ```
/// use nettrie::{Endpoint, Prefix};
///
/// let net: Prefix = "10.1.0.0/16".parse().unwrap();
/// assert!(net.matches(&"10.1.2.3".parse::<Endpoint>().unwrap()));
/// assert!(!net.matches(&"10.2.0.1".parse::<Endpoint>().unwrap()));
/// assert_eq!(net.to_string(), "10.1.0.0/16");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    network: Endpoint,
    length: u8,
}

impl Prefix {
    /// Create a prefix, capping `length` at the address width.
    pub fn new(network: Endpoint, length: u8) -> Self {
        Self {
            network: network.with_port(0),
            length: length.min(network.bits()),
        }
    }

    /// Create a prefix covering exactly one address.
    pub fn host(address: Endpoint) -> Self {
        Self::new(address, address.bits())
    }

    /// The network address as stored (host bits are not cleared).
    pub fn network(&self) -> &Endpoint {
        &self.network
    }

    /// Number of network bits.
    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn family(&self) -> Family {
        self.network.family()
    }

    pub fn is_v4(&self) -> bool {
        self.network.is_v4()
    }

    pub fn is_v6(&self) -> bool {
        self.network.is_v6()
    }

    /// Total number of address bits (32 or 128).
    pub fn address_bits(&self) -> u8 {
        self.network.bits()
    }

    /// Whether `address` has the same family and agrees with the network
    /// on the first `length` bits.
    pub fn matches(&self, address: &Endpoint) -> bool {
        if self.family() != address.family() {
            return false;
        }

        let ours = self.network.octets();
        let theirs = address.octets();
        let wholes = usize::from(self.length / 8);
        let remainder = self.length % 8;

        ours[..wholes] == theirs[..wholes]
            && (remainder == 0 || (ours[wholes] ^ theirs[wholes]) & mask(remainder) == 0)
    }

    /// The network address with every bit beyond `length` cleared.
    pub fn masked_network(&self) -> Endpoint {
        let mut network = self.network;
        network.truncate(self.length);
        network
    }

    /// The same prefix with host bits cleared.
    pub fn normalized(&self) -> Prefix {
        Prefix {
            network: self.masked_network(),
            length: self.length,
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.masked_network() == self.network
    }

    /// The enclosing prefix with at most `bits` network bits.
    pub fn super_prefix(&self, bits: u8) -> Prefix {
        Prefix::new(self.network, self.length.min(bits))
    }

    /// Get the value of a network bit, indexed like [`Endpoint::bit`].
    ///
    /// Any index that falls outside the network bits yields `false`, even
    /// when the stored address has a host bit set there.
    pub fn bit(&self, index: i32) -> bool {
        let length = i32::from(self.length);
        let width = i32::from(self.address_bits());
        if index < -length {
            return false;
        }
        if index >= 0 && (index >= width || index < width - length) {
            return false;
        }
        self.network.bit(index)
    }

    /// Network bit at `depth`, counting from the most significant bit.
    pub(crate) fn branch_bit(&self, depth: u8) -> bool {
        self.bit(-1 - i32::from(depth))
    }

    /// The network address without the `/length` suffix.
    pub fn to_string_no_mask(&self) -> String {
        self.network.to_string()
    }
}

/// A byte with the first n bits set.
const fn mask(n: u8) -> u8 {
    !(0xff_u8 >> n)
}

impl Ord for Prefix {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .length
            .cmp(&self.length)
            .then_with(|| self.network.cmp(&other.network))
    }
}

impl PartialOrd for Prefix {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.length)
    }
}

impl FromStr for Prefix {
    type Err = Error;

    /// Parse `address[/length]`. Without a length the prefix covers a
    /// single address.
    fn from_str(s: &str) -> Result<Self> {
        let (address, length) = match s.split_once('/') {
            Some((address, length)) => (address, Some(length)),
            None => (s, None),
        };

        let network: Endpoint = address
            .parse::<IpAddr>()
            .map_err(|_| Error::InvalidAddress(address.to_string()))?
            .into();

        let length = match length {
            None => network.bits(),
            Some(text) => {
                if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::InvalidPrefixLength(text.to_string()));
                }
                let length: u8 = text
                    .parse()
                    .map_err(|_| Error::InvalidPrefixLength(text.to_string()))?;
                if length > network.bits() {
                    return Err(Error::InvalidPrefixLength(text.to_string()));
                }
                length
            }
        };

        Ok(Prefix::new(network, length))
    }
}

impl From<Endpoint> for Prefix {
    fn from(address: Endpoint) -> Self {
        Prefix::host(address)
    }
}

impl From<Ipv4Net> for Prefix {
    fn from(net: Ipv4Net) -> Self {
        Prefix::new(net.addr().into(), net.prefix_len())
    }
}

impl From<Ipv6Net> for Prefix {
    fn from(net: Ipv6Net) -> Self {
        Prefix::new(net.addr().into(), net.prefix_len())
    }
}

impl From<IpNet> for Prefix {
    fn from(net: IpNet) -> Self {
        match net {
            IpNet::V4(v4) => v4.into(),
            IpNet::V6(v6) => v6.into(),
        }
    }
}

impl Serialize for Prefix {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Prefix {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
