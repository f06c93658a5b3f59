use std::net::IpAddr;

/// Restricts the address family of the endpoints a proxy programs.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
pub enum IpFamilyFilter {
    #[default]
    Any,
    Ipv4,
    Ipv6,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid IP family: {0:?}; expected one of any, ipv4, ipv6")]
pub struct ParseIpFamilyError(String);

// === impl IpFamilyFilter ===

impl IpFamilyFilter {
    pub fn is_filtered(&self) -> bool {
        !matches!(self, Self::Any)
    }

    /// Returns true if an address of the given family may be programmed.
    pub fn admits(&self, ip: &IpAddr) -> bool {
        match self {
            Self::Any => true,
            Self::Ipv4 => ip.is_ipv4(),
            Self::Ipv6 => ip.is_ipv6(),
        }
    }
}

impl std::str::FromStr for IpFamilyFilter {
    type Err = ParseIpFamilyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "any" => Ok(Self::Any),
            "ipv4" => Ok(Self::Ipv4),
            "ipv6" => Ok(Self::Ipv6),
            _ => Err(ParseIpFamilyError(s.to_string())),
        }
    }
}

impl std::fmt::Display for IpFamilyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => "any".fmt(f),
            Self::Ipv4 => "ipv4".fmt(f),
            Self::Ipv6 => "ipv6".fmt(f),
        }
    }
}
