//! IPv4/IPv6 socket address value type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Address family of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// IPv4, 32 address bits
    V4,
    /// IPv6, 128 address bits
    V6,
}

impl Family {
    /// Parse a family from an IP version number (4 or 6).
    pub fn from_version(version: u8) -> Result<Self> {
        match version {
            4 => Ok(Family::V4),
            6 => Ok(Family::V6),
            other => Err(Error::InvalidFamily(other)),
        }
    }

    /// Get the IP version number.
    pub fn version(self) -> u8 {
        match self {
            Family::V4 => 4,
            Family::V6 => 6,
        }
    }

    /// Total number of address bits (32 or 128).
    pub fn bits(self) -> u8 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    /// Number of address bytes (4 or 16).
    pub fn octet_len(self) -> usize {
        usize::from(self.bits() / 8)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Family::V4 => 0,
            Family::V6 => 1,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv{}", self.version())
    }
}

/// An IPv4 or IPv6 address together with a port.
///
/// Ordering compares the family first, then the port, then the address
/// bytes (most significant first). IPv4 and IPv6 endpoints never compare
/// equal, even for IPv4-mapped IPv6 addresses.
///
/// # Examples
/// ```
/// use nettrie::Endpoint;
///
/// let ep: Endpoint = "192.0.2.1:53".parse().unwrap();
/// assert_eq!(ep.port(), 53);
/// assert_eq!(ep.to_string(), "192.0.2.1");
/// assert!(ep.bit(-1)); // 192 = 0b1100_0000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// IPv4 address bytes in network order
    V4 { octets: [u8; 4], port: u16 },
    /// IPv6 address bytes in network order
    V6 { octets: [u8; 16], port: u16 },
}

impl Endpoint {
    /// Build an endpoint from raw address bytes and an IP version (4 or 6).
    ///
    /// The port is zero.
    pub fn from_raw(version: u8, raw: &[u8]) -> Result<Self> {
        let family = Family::from_version(version)?;
        if raw.len() != family.octet_len() {
            return Err(Error::InvalidRawLength {
                expected: family.octet_len(),
                actual: raw.len(),
            });
        }

        Ok(match family {
            Family::V4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(raw);
                Endpoint::V4 { octets, port: 0 }
            }
            Family::V6 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(raw);
                Endpoint::V6 { octets, port: 0 }
            }
        })
    }

    /// Get the address family.
    pub fn family(&self) -> Family {
        match self {
            Endpoint::V4 { .. } => Family::V4,
            Endpoint::V6 { .. } => Family::V6,
        }
    }

    pub fn is_v4(&self) -> bool {
        self.family() == Family::V4
    }

    pub fn is_v6(&self) -> bool {
        self.family() == Family::V6
    }

    /// Total number of address bits (32 or 128).
    pub fn bits(&self) -> u8 {
        self.family().bits()
    }

    pub fn port(&self) -> u16 {
        match *self {
            Endpoint::V4 { port, .. } | Endpoint::V6 { port, .. } => port,
        }
    }

    pub fn set_port(&mut self, new_port: u16) {
        match self {
            Endpoint::V4 { port, .. } | Endpoint::V6 { port, .. } => *port = new_port,
        }
    }

    /// Copy of this endpoint with a different port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.set_port(port);
        self
    }

    /// Address bytes in network order (4 or 16 bytes).
    pub fn octets(&self) -> &[u8] {
        match self {
            Endpoint::V4 { octets, .. } => octets,
            Endpoint::V6 { octets, .. } => octets,
        }
    }

    fn octets_mut(&mut self) -> &mut [u8] {
        match self {
            Endpoint::V4 { octets, .. } => octets,
            Endpoint::V6 { octets, .. } => octets,
        }
    }

    /// Get the value of the bit at `index`.
    ///
    /// A non-negative index counts from the least significant bit (index 0).
    /// A negative index counts from the most significant bit, which is
    /// index -1. Indices outside the address width yield `false`.
    pub fn bit(&self, index: i32) -> bool {
        let width = i32::from(self.bits());
        if index >= width || index < -width {
            return false;
        }
        let index = if index < 0 { width + index } else { index };
        let index = index as usize;

        let octets = self.octets();
        let byte = octets[octets.len() - 1 - index / 8];
        byte & (1 << (index % 8)) != 0
    }

    /// Clear every address bit after the first `bits` bits.
    pub fn truncate(&mut self, bits: u8) {
        let octets = self.octets_mut();
        let bits = usize::from(bits);
        if bits >= octets.len() * 8 {
            return;
        }

        let mut start = bits / 8;
        let remainder = bits % 8;
        if remainder != 0 {
            octets[start] &= !(0xff_u8 >> remainder);
            start += 1;
        }
        octets[start..].fill(0);
    }

    /// Whether this is the unspecified address (`0.0.0.0` or `::`).
    pub fn is_unspecified(&self) -> bool {
        self.octets().iter().all(|&b| b == 0)
    }

    /// Whether this is an IPv4-mapped IPv6 address (`::ffff:a.b.c.d`).
    pub fn is_mapped_v4(&self) -> bool {
        match self {
            Endpoint::V4 { .. } => false,
            Endpoint::V6 { octets, .. } => {
                octets[..10].iter().all(|&b| b == 0) && octets[10..12] == [0xff, 0xff]
            }
        }
    }

    /// Map an IPv4-mapped IPv6 address down to plain IPv4, keeping the port.
    pub fn map_to_v4(&self) -> Result<Endpoint> {
        match self {
            Endpoint::V6 { octets, port } if self.is_mapped_v4() => Ok(Endpoint::V4 {
                octets: [octets[12], octets[13], octets[14], octets[15]],
                port: *port,
            }),
            _ => Err(Error::NotMappedV4(self.to_string())),
        }
    }

    pub fn ip(&self) -> IpAddr {
        match *self {
            Endpoint::V4 { octets, .. } => IpAddr::V4(Ipv4Addr::from(octets)),
            Endpoint::V6 { octets, .. } => IpAddr::V6(Ipv6Addr::from(octets)),
        }
    }

    /// Canonical text including the port (`a.b.c.d:p` or `[v6]:p`).
    pub fn to_string_with_port(&self) -> String {
        match self {
            Endpoint::V4 { .. } => format!("{}:{}", self, self.port()),
            Endpoint::V6 { .. } => format!("[{}]:{}", self, self.port()),
        }
    }

    /// Like [`to_string_with_port`](Self::to_string_with_port), but leaves
    /// the port out when it equals `port`.
    pub fn to_string_with_port_except(&self, port: u16) -> String {
        if self.port() == port {
            self.to_string()
        } else {
            self.to_string_with_port()
        }
    }

    /// Text for log lines: the port is omitted when it is the DNS port.
    pub fn to_log_string(&self) -> String {
        self.to_string_with_port_except(53)
    }
}

impl Ord for Endpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.family()
            .cmp(&other.family())
            .then_with(|| self.port().cmp(&other.port()))
            .then_with(|| self.octets().cmp(other.octets()))
    }
}

impl PartialOrd for Endpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip())
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    /// Accepts `a.b.c.d`, `a.b.c.d:port`, IPv6 text and `[v6]:port`.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Endpoint::from(ip));
        }
        if let Ok(sa) = s.parse::<SocketAddr>() {
            return Ok(Endpoint::from(sa));
        }
        Err(Error::InvalidAddress(s.to_string()))
    }
}

impl From<Ipv4Addr> for Endpoint {
    fn from(ip: Ipv4Addr) -> Self {
        Endpoint::V4 {
            octets: ip.octets(),
            port: 0,
        }
    }
}

impl From<Ipv6Addr> for Endpoint {
    fn from(ip: Ipv6Addr) -> Self {
        Endpoint::V6 {
            octets: ip.octets(),
            port: 0,
        }
    }
}

impl From<IpAddr> for Endpoint {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(sa: SocketAddr) -> Self {
        Endpoint::from(sa.ip()).with_port(sa.port())
    }
}

impl From<Endpoint> for IpAddr {
    fn from(ep: Endpoint) -> Self {
        ep.ip()
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(ep: Endpoint) -> Self {
        match ep {
            Endpoint::V4 { octets, port } => {
                SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from(octets), port))
            }
            Endpoint::V6 { octets, port } => {
                SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::from(octets), port, 0, 0))
            }
        }
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string_with_port_except(0))
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
