//! CIDR prefixes for destination matching in forwarding tables.

use crate::ParseError;
use std::net::IpAddr;
use std::str::FromStr;

/// A CIDR prefix such as `10.0.0.0/24` or `2001:db8::/32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpPrefix {
    network: IpAddr,
    len: u8,
}

fn width(addr: &IpAddr) -> u8 {
    if addr.is_ipv4() {
        32
    } else {
        128
    }
}

fn to_bits(addr: &IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(*v4)),
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

impl IpPrefix {
    /// Prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.len
    }

    /// Returns true if `addr` falls inside this prefix. Addresses of the
    /// other family never match.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        if self.network.is_ipv4() != addr.is_ipv4() {
            return false;
        }
        // A /0 shifts every bit out; checked_shr refuses a full-width shift.
        let host_bits = u32::from(width(addr) - self.len);
        let network_part = |bits: u128| bits.checked_shr(host_bits).unwrap_or(0);
        network_part(to_bits(&self.network)) == network_part(to_bits(addr))
    }
}

impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidIpPrefix(s.to_string());

        let (network, len) = s.split_once('/').ok_or_else(invalid)?;
        let network: IpAddr = network
            .parse()
            .map_err(|_| ParseError::InvalidIpAddress(network.to_string()))?;
        let len: u8 = len.parse().map_err(|_| invalid())?;
        if len > width(&network) {
            return Err(invalid());
        }

        Ok(IpPrefix { network, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse() {
        let v4: IpPrefix = "10.0.0.0/24".parse().unwrap();
        assert_eq!(v4.prefix_len(), 24);
        let v6: IpPrefix = "2001:db8::/32".parse().unwrap();
        assert_eq!(v6.prefix_len(), 32);

        assert_eq!(
            "10.0.0.0/33".parse::<IpPrefix>(),
            Err(ParseError::InvalidIpPrefix("10.0.0.0/33".to_string()))
        );
        assert!("2001:db8::/129".parse::<IpPrefix>().is_err());
        assert!("10.0.0.0".parse::<IpPrefix>().is_err());
        assert_eq!(
            "10.0.0.256/8".parse::<IpPrefix>(),
            Err(ParseError::InvalidIpAddress("10.0.0.256".to_string()))
        );
    }

    #[test]
    fn test_contains() {
        let v4: IpPrefix = "10.0.5.0/24".parse().unwrap();
        assert!(v4.contains(&addr("10.0.5.17")));
        assert!(!v4.contains(&addr("10.0.6.1")));

        let v6: IpPrefix = "2001:db8::/32".parse().unwrap();
        assert!(v6.contains(&addr("2001:db8:1::5")));
        assert!(!v6.contains(&addr("10.0.5.17")));

        let host: IpPrefix = "10.0.0.1/32".parse().unwrap();
        assert!(host.contains(&addr("10.0.0.1")));
        assert!(!host.contains(&addr("10.0.0.2")));
    }

    #[test]
    fn test_zero_length_prefix_matches_its_family_only() {
        let any_v4: IpPrefix = "0.0.0.0/0".parse().unwrap();
        assert!(any_v4.contains(&addr("203.0.113.9")));
        assert!(!any_v4.contains(&addr("::1")));

        let any_v6: IpPrefix = "::/0".parse().unwrap();
        assert!(any_v6.contains(&addr("2001:db8::1")));
    }
}
