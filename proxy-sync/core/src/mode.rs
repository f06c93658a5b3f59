//! Selection of the packet-filter backend that programs endpoints.

/// The packet-filter backend that programs service endpoints.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum ProxyMode {
    Userspace,
    IpTables,
    Ipvs,
}

/// Kernel features available to the proxy, probed once at start-up.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub iptables: bool,
    pub ipvs: bool,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid proxy mode: {0:?}; expected one of userspace, iptables, ipvs")]
pub struct ParseProxyModeError(String);

// === impl ProxyMode ===

impl ProxyMode {
    /// Decides which backend to run given the requested mode and the host's capabilities.
    ///
    /// A mode that the host cannot support degrades to the next simpler mode: IPVS falls back
    /// to iptables, and iptables falls back to the userspace proxy. When no mode is requested,
    /// iptables is preferred.
    pub fn select(requested: Option<ProxyMode>, caps: Capabilities) -> ProxyMode {
        match requested {
            Some(ProxyMode::Userspace) => ProxyMode::Userspace,
            Some(ProxyMode::Ipvs) if caps.ipvs => ProxyMode::Ipvs,
            Some(ProxyMode::Ipvs) | Some(ProxyMode::IpTables) | None => {
                if caps.iptables {
                    ProxyMode::IpTables
                } else {
                    ProxyMode::Userspace
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Userspace => "userspace",
            Self::IpTables => "iptables",
            Self::Ipvs => "ipvs",
        }
    }
}

impl std::str::FromStr for ProxyMode {
    type Err = ParseProxyModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "userspace" => Ok(Self::Userspace),
            "iptables" => Ok(Self::IpTables),
            "ipvs" => Ok(Self::Ipvs),
            _ => Err(ParseProxyModeError(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}
