//! Typed wizard answers and the env document generated from them.
//!
//! Each wizard phase produces one of these sub-records. Generation matches
//! exhaustively on them, so a branch chosen earlier always carries the values
//! the env file needs.

pub mod network;

use std::{fmt, path::PathBuf};

pub use network::{
    HostIp, LanSuggestion, derive_dnsmasq_ip, infer_lan, suggest_container_ip,
};

use crate::{
    constants::{
        CADDY_COMPOSE_FILE, KEY_CADDY_IP, KEY_DNSMASQ_IP, KEY_HTTP_PORT,
        KEY_HTTPS_PORT, KEY_LAN_GATEWAY, KEY_LAN_SUBNET,
        KEY_NETWORK_INTERFACE, KEY_NGINX_IP, KEY_TZ, KEY_UPSTREAM_DNS,
        UPSTREAM_DNS,
    },
    env_writer::{EnvLine, env_pairs},
};

/// Reverse proxy that answers for the redirected domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebServer {
    /// nginx with the stock compose file.
    Nginx,
    /// Caddy via the compose overlay.
    Caddy,
}

impl WebServer {
    /// Options in prompt order.
    pub const ALL: [WebServer; 2] = [WebServer::Nginx, WebServer::Caddy];

    /// Lowercase name, also the directory holding the server's config.
    pub fn slug(self) -> &'static str {
        match self {
            WebServer::Nginx => "nginx",
            WebServer::Caddy => "caddy",
        }
    }

    /// Capitalised name for prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            WebServer::Nginx => "Nginx",
            WebServer::Caddy => "Caddy",
        }
    }

    /// Env key holding this server's macvlan address.
    pub fn ip_key(self) -> &'static str {
        match self {
            WebServer::Nginx => KEY_NGINX_IP,
            WebServer::Caddy => KEY_CADDY_IP,
        }
    }

    /// Arguments after `docker` that start this server's compose stack.
    pub fn compose_up_args(self) -> Vec<&'static str> {
        match self {
            WebServer::Nginx => vec!["compose", "up", "-d"],
            WebServer::Caddy => {
                vec!["compose", "-f", CADDY_COMPOSE_FILE, "up", "-d"]
            }
        }
    }
}

impl fmt::Display for WebServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WebServer::Nginx => "nginx",
            WebServer::Caddy => "Caddy",
        })
    }
}

/// Networking choice before its details are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    /// Share the host address and map ports.
    Bridge,
    /// Give the container its own LAN address.
    Macvlan,
}

impl NetworkMode {
    /// Options in prompt order.
    pub const ALL: [NetworkMode; 2] = [NetworkMode::Bridge, NetworkMode::Macvlan];

    /// Lowercase name used in the summary.
    pub fn slug(self) -> &'static str {
        match self {
            NetworkMode::Bridge => "bridge",
            NetworkMode::Macvlan => "macvlan",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkMode::Bridge => "Bridge (simple)",
            NetworkMode::Macvlan => "Macvlan (dedicated IP)",
        })
    }
}

/// Container networking chosen by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Networking {
    /// Host ports mapped into the container.
    Bridge {
        /// Host port for HTTP.
        http_port: u16,
        /// Host port for HTTPS.
        https_port: u16,
    },
    /// Dedicated LAN address.
    Macvlan(MacvlanConfig),
}

impl Networking {
    /// Which mode these settings belong to.
    pub fn mode(&self) -> NetworkMode {
        match self {
            Networking::Bridge { .. } => NetworkMode::Bridge,
            Networking::Macvlan(_) => NetworkMode::Macvlan,
        }
    }
}

/// Dedicated LAN address for the proxy container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacvlanConfig {
    /// Parent interface.
    pub interface: String,
    /// LAN subnet as entered; not validated.
    pub subnet: String,
    /// LAN router.
    pub gateway: HostIp,
    /// Address of the proxy container.
    pub server_ip: HostIp,
}

/// How HTTPS certificates are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// HTTP only.
    Skip,
    /// Local CA and certificates from mkcert.
    Mkcert,
    /// Operator creates certificates with OpenSSL.
    Manual,
}

impl TlsMode {
    /// Lowercase name used in the summary.
    pub fn slug(self) -> &'static str {
        match self {
            TlsMode::Skip => "skip",
            TlsMode::Mkcert => "mkcert",
            TlsMode::Manual => "manual",
        }
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TlsMode::Skip => "Skip SSL (HTTP only)",
            TlsMode::Mkcert => "mkcert (automatic)",
            TlsMode::Manual => "Manual OpenSSL",
        })
    }
}

/// Certificate files copied into the server's `ssl` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledCerts {
    /// `<project>/<server>/ssl`.
    pub ssl_dir: PathBuf,
    /// Installed certificate.
    pub bundle: PathBuf,
    /// Installed private key.
    pub key: PathBuf,
}

/// TLS choice and, for mkcert, what was installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSetup {
    /// Chosen mode.
    pub mode: TlsMode,
    /// Present only when mkcert ran and the files were installed.
    pub certificates: Option<InstalledCerts>,
}

impl TlsSetup {
    /// HTTP only, no certificates.
    pub fn skipped() -> Self {
        Self {
            mode: TlsMode::Skip,
            certificates: None,
        }
    }
}

/// How LAN clients will resolve the redirected domains to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsChoice {
    /// Pi-hole local DNS records.
    Pihole,
    /// UniFi gateway DNS.
    Unifi,
    /// pfSense or OPNsense host overrides.
    Pfsense,
    /// The router's own DNS.
    Router,
    /// The bundled dnsmasq container.
    Dnsmasq,
    /// Per-device hosts file entries.
    Manual,
}

impl DnsChoice {
    /// Options in prompt order.
    pub const ALL: [DnsChoice; 6] = [
        DnsChoice::Pihole,
        DnsChoice::Unifi,
        DnsChoice::Pfsense,
        DnsChoice::Router,
        DnsChoice::Dnsmasq,
        DnsChoice::Manual,
    ];

    /// Lowercase name used in the summary.
    pub fn slug(self) -> &'static str {
        match self {
            DnsChoice::Pihole => "pihole",
            DnsChoice::Unifi => "unifi",
            DnsChoice::Pfsense => "pfsense",
            DnsChoice::Router => "router",
            DnsChoice::Dnsmasq => "dnsmasq",
            DnsChoice::Manual => "manual",
        }
    }

    /// Documentation the summary points the operator at.
    pub fn instructions(self) -> &'static str {
        match self {
            DnsChoice::Pihole => "docs/PIHOLE_SETUP.md",
            DnsChoice::Unifi => "docs/OTHER_DNS.md#unifi-ubiquiti",
            DnsChoice::Pfsense => "docs/OTHER_DNS.md#pfsense",
            DnsChoice::Router => "docs/OTHER_DNS.md",
            DnsChoice::Dnsmasq => "docs/DNSMASQ_SETUP.md",
            DnsChoice::Manual => {
                "docs/OTHER_DNS.md#per-device-configuration-without-dns-server"
            }
        }
    }

    /// Whether the dnsmasq keys are written.
    pub fn includes_dnsmasq(self) -> bool {
        matches!(self, DnsChoice::Dnsmasq)
    }
}

impl fmt::Display for DnsChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DnsChoice::Pihole => "Pi-hole (recommended)",
            DnsChoice::Unifi => "UniFi/Ubiquiti",
            DnsChoice::Pfsense => "pfSense/OPNsense",
            DnsChoice::Router => "Router built-in DNS",
            DnsChoice::Dnsmasq => "Use included dnsmasq",
            DnsChoice::Manual => "Manual (hosts file)",
        })
    }
}

/// Everything the wizard collected, ready for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardAnswers {
    /// Reverse proxy.
    pub server: WebServer,
    /// Container networking.
    pub networking: Networking,
    /// TLS choice.
    pub tls: TlsSetup,
    /// DNS integration.
    pub dns: DnsChoice,
}

/// Build the env document for `answers`, in file order.
pub fn env_document(answers: &WizardAnswers, timezone: &str) -> Vec<EnvLine> {
    let mut lines = vec![
        EnvLine::comment("X/Twitter → xcancel Configuration"),
        EnvLine::comment("Generated by setup wizard"),
        EnvLine::Blank,
        EnvLine::comment("Timezone"),
        EnvLine::pair(KEY_TZ, timezone),
        EnvLine::Blank,
    ];

    match &answers.networking {
        Networking::Bridge {
            http_port,
            https_port,
        } => {
            lines.push(EnvLine::comment("Bridge Networking"));
            lines.push(EnvLine::pair(KEY_HTTP_PORT, http_port.to_string()));
            lines.push(EnvLine::pair(KEY_HTTPS_PORT, https_port.to_string()));
        }
        Networking::Macvlan(macvlan) => {
            lines.push(EnvLine::comment("Macvlan Networking"));
            lines.push(EnvLine::pair(
                KEY_NETWORK_INTERFACE,
                macvlan.interface.clone(),
            ));
            lines.push(EnvLine::pair(KEY_LAN_SUBNET, macvlan.subnet.clone()));
            lines.push(EnvLine::pair(
                KEY_LAN_GATEWAY,
                macvlan.gateway.to_string(),
            ));
            lines.push(EnvLine::Blank);
            lines.push(EnvLine::pair(
                answers.server.ip_key(),
                macvlan.server_ip.to_string(),
            ));
            if answers.dns.includes_dnsmasq() {
                lines.push(EnvLine::pair(
                    KEY_DNSMASQ_IP,
                    derive_dnsmasq_ip(&macvlan.server_ip),
                ));
                lines.push(EnvLine::pair(KEY_UPSTREAM_DNS, UPSTREAM_DNS));
            }
        }
    }

    lines
}

/// Ordered key/value pairs that [`env_document`] writes.
pub fn generate_env_kv(
    answers: &WizardAnswers,
    timezone: &str,
) -> Vec<(String, String)> {
    env_pairs(&env_document(answers, timezone))
}
