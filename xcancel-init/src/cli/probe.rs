//! Best-effort discovery of local tools and network settings.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::debug;

use crate::{
    cli::specs::{CommandRunner, CommandSpec},
    constants::ROUTE_PROBE_ADDR,
    error::ExecError,
};

/// Which optional external tools are on `PATH`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    /// `docker` is on `PATH`.
    pub docker: bool,
    /// `mkcert` is on `PATH`.
    pub mkcert: bool,
    /// `openssl` is on `PATH`.
    pub openssl: bool,
}

impl ToolAvailability {
    /// Look each tool up on `PATH`.
    pub fn detect() -> Self {
        let tools = Self {
            docker: on_path("docker"),
            mkcert: on_path("mkcert"),
            openssl: on_path("openssl"),
        };
        debug!(?tools, "detected external tools");
        tools
    }

    /// Whether any certificate workflow can be offered.
    pub fn can_issue_certs(&self) -> bool {
        self.mkcert || self.openssl
    }
}

fn on_path(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Source of network suggestions for macvlan mode.
pub trait NetworkProber {
    /// Name of the interface carrying the default route.
    fn default_interface(
        &self,
        runner: &mut dyn CommandRunner,
    ) -> Result<String, ExecError>;

    /// Address the OS would use to reach the internet.
    fn local_ip(&self) -> Result<Ipv4Addr, ExecError> {
        local_ip_via_udp()
    }
}

/// Linux: `ip route show default`, interface follows `dev`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpRouteProber;

impl NetworkProber for IpRouteProber {
    fn default_interface(
        &self,
        runner: &mut dyn CommandRunner,
    ) -> Result<String, ExecError> {
        let spec = CommandSpec::new("ip").args(["route", "show", "default"]);
        let output = runner.run(&spec)?;
        parse_ip_route_default(&output.stdout).ok_or_else(|| {
            ExecError::Unparsable {
                program: spec.program.clone(),
                reason: "no `dev` field in default route".into(),
            }
        })
    }
}

/// macOS and the BSDs: `route get default`, `interface:` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGetProber;

impl NetworkProber for RouteGetProber {
    fn default_interface(
        &self,
        runner: &mut dyn CommandRunner,
    ) -> Result<String, ExecError> {
        let spec = CommandSpec::new("route").args(["get", "default"]);
        let output = runner.run(&spec)?;
        parse_route_get_default(&output.stdout).ok_or_else(|| {
            ExecError::Unparsable {
                program: spec.program.clone(),
                reason: "no `interface:` line in route output".into(),
            }
        })
    }
}

/// Prober for the platform this binary was built for.
pub fn system_prober() -> Box<dyn NetworkProber> {
    if cfg!(any(
        target_os = "macos",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    )) {
        Box::new(RouteGetProber)
    } else {
        Box::new(IpRouteProber)
    }
}

/// Token after `dev` in `ip route show default` output.
pub fn parse_ip_route_default(stdout: &str) -> Option<String> {
    let mut tokens = stdout.split_whitespace();
    tokens.find(|t| *t == "dev")?;
    tokens.next().map(str::to_string)
}

/// Value of the `interface:` line in `route get default` output.
pub fn parse_route_get_default(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (_, rest) = line.split_once("interface:")?;
        let iface = rest.trim();
        (!iface.is_empty()).then(|| iface.to_string())
    })
}

/// Connecting a UDP socket sends nothing; it only asks the routing table
/// which local address would be used.
fn local_ip_via_udp() -> Result<Ipv4Addr, ExecError> {
    let io_err = |source: std::io::Error| ExecError::Io {
        program: "udp socket".into(),
        source,
    };
    let socket = UdpSocket::bind("0.0.0.0:0").map_err(io_err)?;
    socket.connect(ROUTE_PROBE_ADDR).map_err(io_err)?;
    match socket.local_addr().map_err(io_err)?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
        other => Err(ExecError::Unparsable {
            program: "udp socket".into(),
            reason: format!("unusable local address {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::process::ExitStatus;

    use super::*;
    use crate::cli::specs::CommandOutput;

    /// Answers every command with canned stdout, or fails like a non-zero exit.
    struct StubRunner {
        stdout: Option<&'static str>,
        seen: Vec<String>,
    }

    impl StubRunner {
        fn replying(stdout: &'static str) -> Self {
            Self {
                stdout: Some(stdout),
                seen: Vec::new(),
            }
        }

        fn failing() -> Self {
            Self {
                stdout: None,
                seen: Vec::new(),
            }
        }
    }

    impl CommandRunner for StubRunner {
        fn run(
            &mut self,
            spec: &CommandSpec,
        ) -> Result<CommandOutput, ExecError> {
            self.seen.push(spec.command_line());
            match self.stdout {
                Some(stdout) => Ok(CommandOutput {
                    status: ExitStatus::default(),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
                None => Err(ExecError::Failed {
                    program: spec.program.clone(),
                    status: ExitStatus::default(),
                    stderr: "boom".into(),
                }),
            }
        }
    }

    #[test]
    fn ip_route_prober_reads_dev_through_runner() {
        let mut runner = StubRunner::replying(
            "default via 10.0.0.1 dev wlan0 proto dhcp\n",
        );
        let iface = IpRouteProber.default_interface(&mut runner).unwrap();
        assert_eq!(iface, "wlan0");
        assert_eq!(runner.seen, ["ip route show default"]);
    }

    #[test]
    fn ip_route_prober_without_dev_is_unparsable() {
        let mut runner = StubRunner::replying("default via 10.0.0.1\n");
        let err = IpRouteProber.default_interface(&mut runner).unwrap_err();
        assert!(matches!(
            err,
            ExecError::Unparsable { ref program, .. } if program == "ip"
        ));
    }

    #[test]
    fn route_get_prober_without_interface_is_unparsable() {
        let mut runner = StubRunner::replying("gateway: 10.0.0.1\n");
        let err = RouteGetProber.default_interface(&mut runner).unwrap_err();
        assert!(matches!(
            err,
            ExecError::Unparsable { ref program, .. } if program == "route"
        ));
        assert_eq!(runner.seen, ["route get default"]);
    }

    #[test]
    fn probers_pass_runner_failures_through() {
        for prober in [
            &IpRouteProber as &dyn NetworkProber,
            &RouteGetProber as &dyn NetworkProber,
        ] {
            let mut runner = StubRunner::failing();
            match prober.default_interface(&mut runner).unwrap_err() {
                ExecError::Failed { stderr, .. } => assert_eq!(stderr, "boom"),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn ip_route_output_yields_dev() {
        let out = "default via 192.168.1.1 dev enp3s0 proto dhcp metric 100\n";
        assert_eq!(parse_ip_route_default(out).as_deref(), Some("enp3s0"));
    }

    #[test]
    fn ip_route_without_dev_is_none() {
        assert_eq!(parse_ip_route_default(""), None);
        assert_eq!(parse_ip_route_default("default via 10.0.0.1 dev"), None);
    }

    #[test]
    fn route_get_output_yields_interface() {
        let out = "   route to: default\ndestination: default\n       \
                   mask: default\n    gateway: 192.168.1.1\n  interface: en0\n";
        assert_eq!(parse_route_get_default(out).as_deref(), Some("en0"));
        assert_eq!(parse_route_get_default("gateway: 10.0.0.1\n"), None);
    }

    #[test]
    fn cert_tools_gate_tls() {
        let none = ToolAvailability::default();
        assert!(!none.can_issue_certs());
        let openssl_only = ToolAvailability {
            openssl: true,
            ..Default::default()
        };
        assert!(openssl_only.can_issue_certs());
    }
}
