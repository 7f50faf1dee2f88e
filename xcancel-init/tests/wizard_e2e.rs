use std::{
    fs,
    io::Write,
    net::Ipv4Addr,
    path::Path,
    process::ExitStatus,
    sync::{Arc, Mutex},
};

use tempfile::{TempDir, tempdir};
use tracing_subscriber::fmt::MakeWriter;
use xcancel_init::{
    DnsChoice, ExecError, Networking, TlsMode, WebServer, WizardError,
    cli::{
        InitOptions, Wizard, WizardOutcome,
        probe::{NetworkProber, ToolAvailability},
        prompt::Prompter,
        specs::{CommandOutput, CommandRunner, CommandSpec},
    },
};

struct FakeProber {
    interface: Option<&'static str>,
    ip: Option<Ipv4Addr>,
}

impl FakeProber {
    fn detected() -> Self {
        Self {
            interface: Some("enp3s0"),
            ip: Some(Ipv4Addr::new(10, 0, 0, 5)),
        }
    }

    fn blind() -> Self {
        Self {
            interface: None,
            ip: None,
        }
    }
}

impl NetworkProber for FakeProber {
    fn default_interface(
        &self,
        _runner: &mut dyn CommandRunner,
    ) -> Result<String, ExecError> {
        self.interface
            .map(str::to_string)
            .ok_or_else(|| ExecError::NotFound {
                program: "ip".into(),
            })
    }

    fn local_ip(&self) -> Result<Ipv4Addr, ExecError> {
        self.ip.ok_or_else(|| ExecError::Unparsable {
            program: "udp socket".into(),
            reason: "offline".into(),
        })
    }
}

/// Records every command; `fail` holds command-line prefixes that error.
#[derive(Default)]
struct RecordingRunner {
    calls: Vec<CommandSpec>,
    fail: Vec<&'static str>,
    emit_certs: bool,
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        self.calls.push(spec.clone());
        let line = spec.command_line();
        if self.fail.iter().any(|prefix| line.starts_with(prefix)) {
            return Err(ExecError::NotFound {
                program: spec.program.clone(),
            });
        }
        let issuing = spec.program == "mkcert"
            && spec.args.first().map(String::as_str) != Some("-install");
        if issuing && self.emit_certs {
            let dir = spec.cwd.clone().expect("mkcert runs in project dir");
            fs::write(dir.join("twitter.com+5.pem"), "CERT").unwrap();
            fs::write(dir.join("twitter.com+5-key.pem"), "KEY").unwrap();
        }
        Ok(CommandOutput {
            status: ExitStatus::default(),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

fn project() -> (TempDir, InitOptions) {
    let dir = tempdir().expect("tempdir");
    let opts = InitOptions::new(dir.path().to_path_buf());
    (dir, opts)
}

fn drive(
    input: &str,
    opts: &InitOptions,
    tools: ToolAvailability,
    prober: &FakeProber,
    runner: &mut RecordingRunner,
) -> (anyhow::Result<WizardOutcome>, String) {
    let mut out = Vec::new();
    let prompt = Prompter::new(input.as_bytes(), &mut out)
        .assume_defaults(opts.non_interactive);
    let result = Wizard::new(prompt, opts, tools, prober, runner).run();
    (result, String::from_utf8(out).expect("utf8 output"))
}

fn env_text(dir: &Path) -> String {
    fs::read_to_string(dir.join(".env")).expect("read .env")
}

#[test]
fn all_defaults_without_tools_writes_bridge_env() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner::default();

    let (result, out) = drive(
        "\n\n\n\n\n\n",
        &opts,
        ToolAvailability::default(),
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    let env = env_text(dir.path());
    assert!(env.contains("TZ=America/New_York\n"));
    assert!(env.contains("HTTP_PORT=80\nHTTPS_PORT=443\n"));
    assert!(!env.contains("_IP="));

    assert_eq!(outcome.answers.server, WebServer::Caddy);
    assert_eq!(outcome.answers.tls.mode, TlsMode::Skip);
    assert_eq!(outcome.answers.dns, DnsChoice::Manual);
    assert!(!outcome.service_started);
    assert!(runner.calls.is_empty());

    assert!(out.contains("Neither mkcert nor OpenSSL found"));
    assert!(out.contains("Docker not found"));
    assert!(out.contains("Using Caddy"));
    assert!(out.contains("Web Server: caddy"));
    assert!(out.contains("docs/OTHER_DNS.md#per-device-configuration-without-dns-server"));
    assert!(!out.contains("Start the service now?"));
}

#[test]
fn macvlan_with_dnsmasq_uses_detected_network() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner::default();

    // pause, nginx, macvlan, interface, subnet, gateway, server ip, dnsmasq
    let (result, out) = drive(
        "\n1\n2\n\n\n\n\n5\n",
        &opts,
        ToolAvailability::default(),
        &FakeProber::detected(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    let env = env_text(dir.path());
    assert!(env.contains(
        "NETWORK_INTERFACE=enp3s0\nLAN_SUBNET=10.0.0.0/24\nLAN_GATEWAY=10.0.0.1\n"
    ));
    assert!(env.contains("NGINX_IP=10.0.0.100\n"));
    assert!(env.contains("DNSMASQ_IP=10.0.0.101\nUPSTREAM_DNS=1.1.1.1\n"));
    assert!(!env.contains("HTTP_PORT"));

    assert!(matches!(outcome.answers.networking, Networking::Macvlan(_)));
    assert!(out.contains("Detected network interface: enp3s0"));
    assert!(out.contains("Inferred gateway: 10.0.0.1"));
    assert!(out.contains("Nginx container IP"));
}

#[test]
fn macvlan_falls_back_when_detection_fails() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner::default();

    // bad gateway is rejected, then the default is taken
    let (result, out) = drive(
        "\n2\n2\n\n\n999.1.1.1\n\n\n6\n",
        &opts,
        ToolAvailability::default(),
        &FakeProber::blind(),
        &mut runner,
    );
    result.expect("wizard completes");

    let env = env_text(dir.path());
    assert!(env.contains("NETWORK_INTERFACE=eth0\n"));
    assert!(env.contains("LAN_SUBNET=192.168.1.0/24\n"));
    assert!(env.contains("LAN_GATEWAY=192.168.1.1\n"));
    assert!(env.contains("CADDY_IP=192.168.1.100\n"));
    assert!(!env.contains("DNSMASQ_IP"));
    assert!(out.contains("IP address octets must be 0-255"));
    assert!(!out.contains("Detected network interface"));
}

#[test]
fn invalid_choices_and_ports_reprompt() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner::default();

    let (result, out) = drive(
        "\n0\nabc\n1\n1\n70000\nhttp\n8080\n8443\n\n",
        &opts,
        ToolAvailability::default(),
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert_eq!(outcome.answers.server, WebServer::Nginx);
    let env = env_text(dir.path());
    assert!(env.contains("HTTP_PORT=8080\nHTTPS_PORT=8443\n"));
    assert!(out.contains("Please enter a number between 1 and 2"));
    assert!(out.contains("Invalid input"));
    assert!(out.contains("Port must be between 1-65535"));
    assert!(out.contains("Port must be a number"));
}

#[test]
fn mkcert_flow_installs_certificates() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner {
        emit_certs: true,
        ..Default::default()
    };
    let tools = ToolAvailability {
        docker: true,
        mkcert: true,
        openssl: false,
    };

    // pause, caddy, bridge, ports, mkcert, generate, dns, do not start
    let (result, out) = drive(
        "\n\n\n\n\n\n\n\n\n",
        &opts,
        tools,
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert_eq!(outcome.answers.tls.mode, TlsMode::Mkcert);
    let certs = outcome.answers.tls.certificates.expect("certificates");
    assert_eq!(certs.ssl_dir, dir.path().join("caddy").join("ssl"));
    assert_eq!(fs::read_to_string(&certs.bundle).unwrap(), "CERT");
    assert_eq!(fs::read_to_string(&certs.key).unwrap(), "KEY");
    assert!(!dir.path().join("twitter.com+5.pem").exists());
    assert!(!dir.path().join("twitter.com+5-key.pem").exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&certs.bundle), 0o644);
        assert_eq!(mode(&certs.key), 0o600);
    }

    let lines: Vec<String> =
        runner.calls.iter().map(CommandSpec::command_line).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "mkcert -install");
    assert!(lines[1].starts_with("mkcert twitter.com x.com"));
    assert!(out.contains("Certificates copied to"));
    assert!(!outcome.service_started);
}

#[test]
fn mkcert_ca_failure_is_reported_and_setup_continues() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner {
        fail: vec!["mkcert -install"],
        ..Default::default()
    };
    let tools = ToolAvailability {
        docker: false,
        mkcert: true,
        openssl: true,
    };

    let (result, out) = drive(
        "\n\n\n\n\n2\ny\n\n",
        &opts,
        tools,
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert_eq!(outcome.answers.tls.mode, TlsMode::Mkcert);
    assert!(outcome.answers.tls.certificates.is_none());
    assert_eq!(runner.calls.len(), 1);
    assert!(out.contains("Failed to install CA: mkcert was not found on PATH"));
    assert!(dir.path().join(".env").exists());
}

#[test]
fn missing_mkcert_output_is_soft_failure() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner::default();
    let tools = ToolAvailability {
        docker: false,
        mkcert: true,
        openssl: false,
    };

    let (result, out) = drive(
        "\n\n\n\n\n\n\n\n",
        &opts,
        tools,
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert!(outcome.answers.tls.certificates.is_none());
    assert!(out.contains("Failed to install certificates"));
    assert!(!dir.path().join("caddy").join("ssl").join("twitter_key.pem").exists());
}

#[test]
fn manual_tls_points_at_docs_and_numbers_steps() {
    let (_dir, opts) = project();
    let mut runner = RecordingRunner::default();
    let tools = ToolAvailability {
        docker: false,
        mkcert: false,
        openssl: true,
    };

    let (result, out) = drive(
        "\n\n\n\n\n\n\n",
        &opts,
        tools,
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert_eq!(outcome.answers.tls.mode, TlsMode::Manual);
    assert!(out.contains("docs/SSL_SETUP.md"));
    assert!(out.contains("Generate SSL Certificates"));
    assert!(out.contains("4. "));
    assert!(runner.calls.is_empty());
}

#[test]
fn starting_the_service_runs_compose_in_project_dir() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner::default();
    let tools = ToolAvailability {
        docker: true,
        ..Default::default()
    };

    let (result, out) = drive(
        "\n1\n\n\n\n\ny\n",
        &opts,
        tools,
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert!(outcome.service_started);
    assert_eq!(runner.calls.len(), 1);
    assert_eq!(runner.calls[0].command_line(), "docker compose up -d");
    assert_eq!(runner.calls[0].cwd.as_deref(), Some(dir.path()));
    assert!(out.contains("Service started!"));
    assert!(out.contains("docker compose logs -f"));
}

#[test]
fn compose_failure_does_not_fail_the_run() {
    let (_dir, opts) = project();
    let mut runner = RecordingRunner {
        fail: vec!["docker"],
        ..Default::default()
    };
    let tools = ToolAvailability {
        docker: true,
        ..Default::default()
    };

    let (result, out) = drive(
        "\n\n\n\n\n\nyes\n",
        &opts,
        tools,
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert!(!outcome.service_started);
    assert_eq!(
        runner.calls[0].command_line(),
        "docker compose -f docker-compose.caddy.yaml up -d"
    );
    assert!(out.contains("Failed to start service"));
}

#[test]
fn end_of_input_cancels_without_writing() {
    let (dir, opts) = project();
    let mut runner = RecordingRunner::default();

    let (result, _out) = drive(
        "\n\n",
        &opts,
        ToolAvailability::default(),
        &FakeProber::blind(),
        &mut runner,
    );
    let err = result.expect_err("input ran out");

    assert!(matches!(
        err.downcast_ref::<WizardError>(),
        Some(WizardError::Cancelled)
    ));
    assert!(!dir.path().join(".env").exists());
}

#[test]
fn print_only_leaves_disk_untouched() {
    let (dir, mut opts) = project();
    opts.print_only = true;
    let mut runner = RecordingRunner::default();

    let (result, out) = drive(
        "\n\n\n\n\n\n",
        &opts,
        ToolAvailability::default(),
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert!(outcome.env_path.is_none());
    assert!(!dir.path().join(".env").exists());
    assert!(out.contains("HTTP_PORT=80"));
    assert!(outcome.env_contents.starts_with("# X/Twitter → xcancel Configuration\n"));
}

#[test]
fn non_interactive_takes_every_default() {
    let (dir, mut opts) = project();
    opts.non_interactive = true;
    opts.timezone = "Europe/Paris".into();
    let mut runner = RecordingRunner::default();
    let tools = ToolAvailability {
        docker: true,
        mkcert: false,
        openssl: true,
    };

    let (result, _out) =
        drive("", &opts, tools, &FakeProber::blind(), &mut runner);
    let outcome = result.expect("wizard completes");

    assert_eq!(outcome.answers.tls.mode, TlsMode::Manual);
    assert!(!outcome.service_started);
    assert!(runner.calls.is_empty());
    let env = env_text(dir.path());
    assert!(env.contains("TZ=Europe/Paris\n"));
    assert!(env.contains("HTTP_PORT=80\n"));
}

#[test]
fn custom_env_path_is_honoured() {
    let (dir, mut opts) = project();
    opts.env_path = dir.path().join("conf").join("proxy.env");
    let mut runner = RecordingRunner::default();

    let (result, _out) = drive(
        "\n\n\n\n\n\n",
        &opts,
        ToolAvailability::default(),
        &FakeProber::blind(),
        &mut runner,
    );
    let outcome = result.expect("wizard completes");

    assert_eq!(outcome.env_path.as_deref(), Some(opts.env_path.as_path()));
    assert!(opts.env_path.exists());
    assert!(!dir.path().join(".env").exists());
}

/// Collects formatted tracing output.
#[derive(Clone, Default)]
struct LogSink(Arc<Mutex<Vec<u8>>>);

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn soft_failures_stay_quiet_at_default_log_level() {
    let (_dir, opts) = project();
    let mut runner = RecordingRunner {
        fail: vec!["mkcert -install", "docker"],
        ..Default::default()
    };
    let tools = ToolAvailability {
        docker: true,
        mkcert: true,
        openssl: false,
    };

    let sink = LogSink::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(sink.clone())
        .finish();

    // pause, caddy, bridge, ports, mkcert, generate, dns, start
    let (result, out) = tracing::subscriber::with_default(subscriber, || {
        drive(
            "\n\n\n\n\n\n\n\ny\n",
            &opts,
            tools,
            &FakeProber::blind(),
            &mut runner,
        )
    });
    let outcome = result.expect("wizard completes");

    assert!(!outcome.service_started);
    assert!(out.contains("Failed to install CA"));
    assert!(out.contains("Failed to start service"));
    let logged = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    assert!(logged.is_empty(), "unexpected warnings: {logged}");
}
