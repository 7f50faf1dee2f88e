//! Fixed names shared by the wizard, the env renderer and `check`.

/// File name of the generated env file inside the project directory.
pub const ENV_FILE_NAME: &str = ".env";

/// Timezone written when `TZ` is not set in the wizard's environment.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Upstream resolver handed to the bundled dnsmasq container.
pub const UPSTREAM_DNS: &str = "1.1.1.1";

/// Container timezone.
pub const KEY_TZ: &str = "TZ";
/// Host port mapped to the proxy's HTTP listener (bridge mode).
pub const KEY_HTTP_PORT: &str = "HTTP_PORT";
/// Host port mapped to the proxy's HTTPS listener (bridge mode).
pub const KEY_HTTPS_PORT: &str = "HTTPS_PORT";
/// Parent interface of the macvlan network.
pub const KEY_NETWORK_INTERFACE: &str = "NETWORK_INTERFACE";
/// LAN subnet in CIDR form.
pub const KEY_LAN_SUBNET: &str = "LAN_SUBNET";
/// LAN router address.
pub const KEY_LAN_GATEWAY: &str = "LAN_GATEWAY";
/// Dedicated address of the nginx container.
pub const KEY_NGINX_IP: &str = "NGINX_IP";
/// Dedicated address of the Caddy container.
pub const KEY_CADDY_IP: &str = "CADDY_IP";
/// Dedicated address of the bundled dnsmasq container.
pub const KEY_DNSMASQ_IP: &str = "DNSMASQ_IP";
/// Resolver dnsmasq forwards everything else to.
pub const KEY_UPSTREAM_DNS: &str = "UPSTREAM_DNS";

/// Keys only written in bridge mode.
pub const BRIDGE_KEYS: &[&str] = &[KEY_HTTP_PORT, KEY_HTTPS_PORT];

/// Keys only written in macvlan mode.
pub const MACVLAN_KEYS: &[&str] = &[
    KEY_NETWORK_INTERFACE,
    KEY_LAN_SUBNET,
    KEY_LAN_GATEWAY,
    KEY_NGINX_IP,
    KEY_CADDY_IP,
    KEY_DNSMASQ_IP,
    KEY_UPSTREAM_DNS,
];

/// Names requested from mkcert, in the order they are passed.
pub const CERT_DOMAINS: &[&str] = &[
    "twitter.com",
    "x.com",
    "*.twitter.com",
    "*.x.com",
    "t.co",
    "*.t.co",
];

/// mkcert names its output after the first domain plus a `+N` suffix.
pub const MKCERT_OUTPUT_PREFIX: &str = "twitter.com+";
/// Marks the private key among mkcert's output files.
pub const MKCERT_KEY_MARKER: &str = "-key";

/// Certificate file name the proxy configs expect in `<server>/ssl/`.
pub const CERT_BUNDLE_NAME: &str = "twitter_bundle.pem";
/// Private key file name the proxy configs expect in `<server>/ssl/`.
pub const CERT_KEY_NAME: &str = "twitter_key.pem";

/// World-readable certificate.
pub const CERT_BUNDLE_MODE: u32 = 0o644;
/// Owner-only private key.
pub const CERT_KEY_MODE: u32 = 0o600;

/// Compose overlay that swaps nginx for Caddy.
pub const CADDY_COMPOSE_FILE: &str = "docker-compose.caddy.yaml";

/// Guide for creating certificates by hand.
pub const SSL_MANUAL_DOC: &str = "docs/SSL_SETUP.md";
/// Script that checks the redirect end to end.
pub const TEST_SCRIPT: &str = "./scripts/test-redirect.sh";
/// Testing guide referenced from the summary.
pub const TESTING_DOC: &str = "docs/TESTING.md";

/// Interface offered in macvlan mode when none was detected.
pub const FALLBACK_INTERFACE: &str = "eth0";
/// Subnet offered in macvlan mode when no local address was detected.
pub const FALLBACK_SUBNET: &str = "192.168.1.0/24";
/// Gateway offered in macvlan mode when no local address was detected.
pub const FALLBACK_GATEWAY: &str = "192.168.1.1";

/// Public address used only to ask the OS which local address routes out.
pub const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";
