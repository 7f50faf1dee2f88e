//! Validated LAN addresses and the suggestions derived from them.

use std::{fmt, net::Ipv4Addr};

use tracing::warn;

use crate::validation::validate_ip;

/// A dotted-quad address that passed [`validate_ip`], kept as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIp {
    text: String,
    network_prefix: String,
    last_octet: u8,
}

impl HostIp {
    /// Validate and keep `raw` (trimmed) as typed.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let text = raw.trim();
        validate_ip(text)?;
        let (network_prefix, last) = text
            .rsplit_once('.')
            .ok_or_else(|| "Invalid IP address format".to_string())?;
        let last_octet = last
            .parse::<u8>()
            .map_err(|_| "IP address octets must be 0-255".to_string())?;
        Ok(Self {
            text: text.to_string(),
            network_prefix: network_prefix.to_string(),
            last_octet,
        })
    }

    /// The address as entered.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Address with the last octet incremented by one.
    ///
    /// There is no bounds check: `x.y.z.255` yields `x.y.z.256`, which is
    /// not a valid address. Callers rely on the existing behaviour.
    pub fn successor(&self) -> String {
        let next = u16::from(self.last_octet) + 1;
        if next > 255 {
            warn!(
                ip = %self.text,
                "last octet overflows when deriving the next address"
            );
        }
        format!("{}.{}", self.network_prefix, next)
    }
}

impl fmt::Display for HostIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Subnet and gateway guessed from the host's own address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanSuggestion {
    /// `a.b.c.0/24`.
    pub subnet: String,
    /// `a.b.c.1`.
    pub gateway: String,
}

/// Assume a /24 around `ip` with the router on `.1`.
pub fn infer_lan(ip: Ipv4Addr) -> LanSuggestion {
    let [a, b, c, _] = ip.octets();
    LanSuggestion {
        subnet: format!("{a}.{b}.{c}.0/24"),
        gateway: format!("{a}.{b}.{c}.1"),
    }
}

/// Suggest `.100` inside the subnet the operator entered.
pub fn suggest_container_ip(subnet: &str) -> String {
    let network = subnet.split('/').next().unwrap_or(subnet);
    let base = network
        .rsplit_once('.')
        .map(|(base, _)| base)
        .unwrap_or(network);
    format!("{base}.100")
}

/// Address for the bundled dnsmasq container: the server IP plus one.
pub fn derive_dnsmasq_ip(server_ip: &HostIp) -> String {
    server_ip.successor()
}
