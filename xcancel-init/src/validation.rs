//! Input validation for wizard answers and generated env files.

use std::{
    collections::{HashMap, HashSet},
    sync::LazyLock,
};

use regex::Regex;

use crate::constants::{
    BRIDGE_KEYS, KEY_CADDY_IP, KEY_DNSMASQ_IP, KEY_HTTP_PORT, KEY_HTTPS_PORT,
    KEY_LAN_GATEWAY, KEY_LAN_SUBNET, KEY_NETWORK_INTERFACE, KEY_NGINX_IP,
    KEY_TZ, MACVLAN_KEYS,
};

static IPV4_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}$").expect("static ipv4 regex")
});

/// Signature shared by the free-text prompt validators.
pub type Validator = fn(&str) -> Result<(), String>;

/// Accepts dotted-quad IPv4 addresses with every octet in 0-255.
pub fn validate_ip(ip: &str) -> Result<(), String> {
    if !IPV4_SHAPE.is_match(ip) {
        return Err("Invalid IP address format".to_string());
    }
    let in_range = ip.split('.').all(|octet| {
        octet.parse::<u16>().map(|value| value <= 255).unwrap_or(false)
    });
    if !in_range {
        return Err("IP address octets must be 0-255".to_string());
    }
    Ok(())
}

/// Accepts integer ports in 1-65535.
pub fn validate_port(port: &str) -> Result<(), String> {
    match port.parse::<i64>() {
        Ok(value) if (1..=65535).contains(&value) => Ok(()),
        Ok(_) => Err("Port must be between 1-65535".to_string()),
        Err(_) => Err("Port must be a number".to_string()),
    }
}

/// Accepts `a.b.c.d/len` with a valid address and a prefix length of 0-32.
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let Some((address, prefix)) = cidr.split_once('/') else {
        return Err("Subnet must be in CIDR form, e.g. 192.168.1.0/24".into());
    };
    validate_ip(address)?;
    match prefix.parse::<u8>() {
        Ok(len) if len <= 32 => Ok(()),
        _ => Err("CIDR prefix length must be 0-32".to_string()),
    }
}

/// One problem found in an existing env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvIssue {
    /// Offending key, or a group name such as `networking`.
    pub key: String,
    /// What is wrong.
    pub message: String,
}

impl EnvIssue {
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EnvIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Check the key/value pairs of a generated env file for consistency.
///
/// Entries are taken in file order so duplicates can be reported.
pub fn validate_env_entries(entries: &[(String, String)]) -> Vec<EnvIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for (key, _) in entries {
        if !seen.insert(key.as_str()) {
            issues.push(EnvIssue::new(key, "key appears more than once"));
        }
    }

    let map: HashMap<&str, &str> = entries
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    if map.get(KEY_TZ).is_none_or(|tz| tz.trim().is_empty()) {
        issues.push(EnvIssue::new(KEY_TZ, "timezone is missing"));
    }

    let has_bridge = BRIDGE_KEYS.iter().any(|k| map.contains_key(k));
    let has_macvlan = MACVLAN_KEYS.iter().any(|k| map.contains_key(k));

    match (has_bridge, has_macvlan) {
        (true, true) => issues.push(EnvIssue::new(
            "networking",
            "both bridge and macvlan keys are present",
        )),
        (false, false) => issues.push(EnvIssue::new(
            "networking",
            "neither bridge nor macvlan keys are present",
        )),
        (true, false) => {
            for key in [KEY_HTTP_PORT, KEY_HTTPS_PORT] {
                match map.get(key) {
                    Some(value) => {
                        if let Err(msg) = validate_port(value) {
                            issues.push(EnvIssue::new(key, msg));
                        }
                    }
                    None => issues.push(EnvIssue::new(key, "missing")),
                }
            }
        }
        (false, true) => check_macvlan(&map, &mut issues),
    }

    issues
}

fn check_macvlan(map: &HashMap<&str, &str>, issues: &mut Vec<EnvIssue>) {
    match map.get(KEY_NETWORK_INTERFACE) {
        Some(iface) if !iface.trim().is_empty() => {}
        _ => issues.push(EnvIssue::new(KEY_NETWORK_INTERFACE, "missing")),
    }

    match map.get(KEY_LAN_SUBNET) {
        Some(subnet) => {
            if let Err(msg) = validate_cidr(subnet) {
                issues.push(EnvIssue::new(KEY_LAN_SUBNET, msg));
            }
        }
        None => issues.push(EnvIssue::new(KEY_LAN_SUBNET, "missing")),
    }

    if !map.contains_key(KEY_LAN_GATEWAY) {
        issues.push(EnvIssue::new(KEY_LAN_GATEWAY, "missing"));
    }

    match (map.contains_key(KEY_NGINX_IP), map.contains_key(KEY_CADDY_IP)) {
        (true, true) => issues.push(EnvIssue::new(
            "server",
            "both NGINX_IP and CADDY_IP are set",
        )),
        (false, false) => issues.push(EnvIssue::new(
            "server",
            "one of NGINX_IP or CADDY_IP is required",
        )),
        _ => {}
    }

    for key in [KEY_LAN_GATEWAY, KEY_NGINX_IP, KEY_CADDY_IP, KEY_DNSMASQ_IP] {
        if let Some(value) = map.get(key)
            && let Err(msg) = validate_ip(value)
        {
            issues.push(EnvIssue::new(key, msg));
        }
    }
}
