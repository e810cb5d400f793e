//! Network datatypes: `ipAddress`, `dnsName` and their port ranges.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::errors::{invalid_lexical, EvalResult};

/// Inclusive port range; an open end is unbounded.
///
/// Lexical forms: `n`, `n-`, `-n`, `n-m`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortRange {
    lower: Option<u16>,
    upper: Option<u16>,
}

impl PortRange {
    /// Range with optional bounds.
    pub const fn new(lower: Option<u16>, upper: Option<u16>) -> Self {
        PortRange { lower, upper }
    }

    /// Lower bound, if any.
    pub const fn lower(&self) -> Option<u16> {
        self.lower
    }

    /// Upper bound, if any.
    pub const fn upper(&self) -> Option<u16> {
        self.upper
    }

    /// Whether `port` lies in this range.
    pub fn contains(&self, port: u16) -> bool {
        self.lower.is_none_or(|lo| port >= lo) && self.upper.is_none_or(|hi| port <= hi)
    }

    fn parse(input: &str) -> Result<Self, &'static str> {
        fn port(s: &str) -> Result<u16, &'static str> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err("port must be a decimal number");
            }
            s.parse().map_err(|_| "port above 65535")
        }
        let range = match input.split_once('-') {
            None => {
                let p = port(input)?;
                PortRange::new(Some(p), Some(p))
            }
            Some(("", "")) => return Err("empty port range"),
            Some(("", hi)) => PortRange::new(None, Some(port(hi)?)),
            Some((lo, "")) => PortRange::new(Some(port(lo)?), None),
            Some((lo, hi)) => PortRange::new(Some(port(lo)?), Some(port(hi)?)),
        };
        if let (Some(lo), Some(hi)) = (range.lower, range.upper) {
            if lo > hi {
                return Err("port range lower bound above upper bound");
            }
        }
        Ok(range)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) if lo == hi => write!(f, "{lo}"),
            (Some(lo), Some(hi)) => write!(f, "{lo}-{hi}"),
            (Some(lo), None) => write!(f, "{lo}-"),
            (None, Some(hi)) => write!(f, "-{hi}"),
            (None, None) => f.write_str("-"),
        }
    }
}

// ipAddress

/// An IPv4 or IPv6 address with optional mask and port range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IpAddress {
    address: IpAddr,
    mask: Option<IpAddr>,
    ports: Option<PortRange>,
}

impl IpAddress {
    /// The address.
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// The network mask, if present.
    pub const fn mask(&self) -> Option<IpAddr> {
        self.mask
    }

    /// The port range, if present.
    pub const fn ports(&self) -> Option<PortRange> {
        self.ports
    }

    /// Parse `a.b.c.d[/mask][:ports]` or `[v6][/[mask]][:ports]`.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("ipAddress", input, reason);
        if let Some(rest) = input.strip_prefix('[') {
            Self::parse_v6(rest).map_err(fail)
        } else {
            Self::parse_v4(input).map_err(fail)
        }
    }

    fn parse_v4(input: &str) -> Result<Self, &'static str> {
        let (addr_mask, ports) = match input.split_once(':') {
            Some((head, ports)) => (head, Some(PortRange::parse(ports)?)),
            None => (input, None),
        };
        let (addr, mask) = match addr_mask.split_once('/') {
            Some((addr, mask)) => (addr, Some(mask)),
            None => (addr_mask, None),
        };
        let address: Ipv4Addr = addr.parse().map_err(|_| "malformed IPv4 address")?;
        let mask = match mask {
            Some(mask) => Some(IpAddr::V4(
                mask.parse::<Ipv4Addr>().map_err(|_| "malformed IPv4 mask")?,
            )),
            None => None,
        };
        Ok(IpAddress {
            address: IpAddr::V4(address),
            mask,
            ports,
        })
    }

    fn parse_v6(input: &str) -> Result<Self, &'static str> {
        let (addr, mut rest) = input.split_once(']').ok_or("missing ']'")?;
        let address: Ipv6Addr = addr.parse().map_err(|_| "malformed IPv6 address")?;
        let mut mask = None;
        if let Some(after) = rest.strip_prefix("/[") {
            let (m, tail) = after.split_once(']').ok_or("missing ']' after mask")?;
            mask = Some(IpAddr::V6(
                m.parse::<Ipv6Addr>().map_err(|_| "malformed IPv6 mask")?,
            ));
            rest = tail;
        }
        let ports = match rest {
            "" => None,
            _ => Some(PortRange::parse(
                rest.strip_prefix(':').ok_or("unexpected characters after address")?,
            )?),
        };
        Ok(IpAddress {
            address: IpAddr::V6(address),
            mask,
            ports,
        })
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            IpAddr::V4(addr) => {
                write!(f, "{addr}")?;
                if let Some(mask) = self.mask {
                    write!(f, "/{mask}")?;
                }
            }
            IpAddr::V6(addr) => {
                write!(f, "[{addr}]")?;
                if let Some(mask) = self.mask {
                    write!(f, "/[{mask}]")?;
                }
            }
        }
        if let Some(ports) = self.ports {
            write!(f, ":{ports}")?;
        }
        Ok(())
    }
}

// dnsName

/// A hostname with optional leading `*.` wildcard and port range.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DnsName {
    host: Box<str>,
    ports: Option<PortRange>,
}

impl DnsName {
    /// Lowercased hostname, including any `*.` prefix.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port range, if present.
    pub const fn ports(&self) -> Option<PortRange> {
        self.ports
    }

    /// Whether the hostname starts with the `*.` wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.host.starts_with("*.")
    }

    /// Parse `hostname[:ports]`.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("dnsName", input, reason);
        let (host, ports) = match input.split_once(':') {
            Some((host, ports)) => (host, Some(PortRange::parse(ports).map_err(fail)?)),
            None => (input, None),
        };
        let labels = host.strip_prefix("*.").unwrap_or(host);
        let labels = labels.strip_suffix('.').unwrap_or(labels);
        if labels.is_empty() {
            return Err(fail("empty hostname"));
        }
        for label in labels.split('.') {
            let valid = !label.is_empty()
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
                && !label.starts_with('-')
                && !label.ends_with('-');
            if !valid {
                return Err(fail("malformed hostname label"));
            }
        }
        Ok(DnsName {
            host: host.to_ascii_lowercase().into(),
            ports,
        })
    }
}

impl fmt::Display for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)?;
        if let Some(ports) = self.ports {
            write!(f, ":{ports}")?;
        }
        Ok(())
    }
}
