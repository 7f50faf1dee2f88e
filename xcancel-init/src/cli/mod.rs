//! The interactive setup wizard and the `check` command.
//!
//! A run is strictly linear: welcome, server, networking, TLS, DNS, generate,
//! summary. Each phase returns a typed piece of [`WizardAnswers`]; nothing is
//! written to disk until every phase has answered. External commands go
//! through a [`CommandRunner`] and their failures are reported to the
//! operator without ending the run.

pub mod certs;
pub mod options;
pub mod probe;
pub mod prompt;
pub mod specs;

use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use dialoguer::console::{Term, style};
use tracing::debug;

pub use options::*;

use crate::{
    cli::{
        certs::{install_generated, locate_generated},
        probe::{NetworkProber, ToolAvailability, system_prober},
        prompt::Prompter,
        specs::{
            CommandRunner, SystemRunner, compose_up_spec, mkcert_install_spec,
            mkcert_issue_spec,
        },
    },
    constants::{
        FALLBACK_GATEWAY, FALLBACK_INTERFACE, FALLBACK_SUBNET, SSL_MANUAL_DOC,
        TEST_SCRIPT, TESTING_DOC,
    },
    env_writer::{read_env_entries, render_env, write_env_atomically},
    error::WizardError,
    models::{
        DnsChoice, HostIp, InstalledCerts, MacvlanConfig, NetworkMode,
        Networking, TlsMode, TlsSetup, WebServer, WizardAnswers, env_document,
        infer_lan, suggest_container_ip,
    },
    validation::{validate_env_entries, validate_ip, validate_port},
};

/// Result of a completed wizard run.
#[derive(Debug, Clone)]
pub struct WizardOutcome {
    /// Every answer collected.
    pub answers: WizardAnswers,
    /// Rendered env file contents.
    pub env_contents: String,
    /// Where the env file was written; `None` with `print_only`.
    pub env_path: Option<PathBuf>,
    /// Whether `docker compose up` was run and succeeded.
    pub service_started: bool,
}

/// Drives one run over a prompter, probes and a command runner.
pub struct Wizard<'a, R, W> {
    prompt: Prompter<R, W>,
    opts: &'a InitOptions,
    tools: ToolAvailability,
    prober: &'a dyn NetworkProber,
    runner: &'a mut dyn CommandRunner,
}

impl<R, W> std::fmt::Debug for Wizard<'_, R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("opts", &self.opts)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl<'a, R: BufRead, W: Write> Wizard<'a, R, W> {
    /// Assemble a wizard; nothing is printed or run until [`Wizard::run`].
    pub fn new(
        prompt: Prompter<R, W>,
        opts: &'a InitOptions,
        tools: ToolAvailability,
        prober: &'a dyn NetworkProber,
        runner: &'a mut dyn CommandRunner,
    ) -> Self {
        Self {
            prompt,
            opts,
            tools,
            prober,
            runner,
        }
    }

    /// Run every phase in order, write the env file and print the summary.
    pub fn run(mut self) -> Result<WizardOutcome> {
        self.welcome()?;
        let server = self.choose_web_server()?;
        let networking = self.choose_networking(server)?;
        let tls = self.choose_tls(server)?;
        let dns = self.choose_dns()?;

        let answers = WizardAnswers {
            server,
            networking,
            tls,
            dns,
        };

        let (env_contents, env_path) = self.generate_env_file(&answers)?;
        let service_started = self.show_next_steps(&answers)?;

        Ok(WizardOutcome {
            answers,
            env_contents,
            env_path,
            service_started,
        })
    }

    fn welcome(&mut self) -> Result<(), WizardError> {
        let banner = [
            "╔═══════════════════════════════════════════════════════════╗",
            "║                                                           ║",
            "║        X/Twitter → xcancel Setup Wizard                   ║",
            "║                                                           ║",
            "║   This wizard will help you configure your redirect       ║",
            "║   proxy to transparently forward X/Twitter traffic        ║",
            "║   to xcancel.com                                          ║",
            "║                                                           ║",
            "╚═══════════════════════════════════════════════════════════╝",
        ];
        self.prompt.line("")?;
        for row in banner {
            self.prompt.line(style(row).bold().blue())?;
        }
        self.prompt.line("")?;

        self.prompt.info("Detecting your environment...")?;
        let tools = self.tools;
        for (name, found) in [
            ("Docker", tools.docker),
            ("mkcert", tools.mkcert),
            ("OpenSSL", tools.openssl),
        ] {
            let status = if found {
                "✓ Available"
            } else {
                "✗ Not found"
            };
            self.prompt.line(format!("  {name}: {status}"))?;
        }

        if !tools.docker {
            self.prompt.warning(
                "Docker not found - you'll need to install it to run this setup",
            )?;
        }

        self.prompt.pause("Press Enter to begin setup...")
    }

    fn choose_web_server(&mut self) -> Result<WebServer, WizardError> {
        self.prompt.header("Web Server Selection")?;
        self.prompt.line("Choose your reverse proxy:")?;
        self.prompt.line(format!(
            "  • {}: Battle-tested, widely used",
            style("nginx").bold()
        ))?;
        self.prompt.line(format!(
            "  • {}: Simpler config (4 lines vs 27), modern\n",
            style("Caddy").bold()
        ))?;

        let server = self.prompt.select(
            "Which web server do you want to use?",
            &WebServer::ALL,
            Some(WebServer::Caddy),
        )?;
        self.prompt.success(&format!("Using {server}"))?;
        Ok(server)
    }

    fn choose_networking(
        &mut self,
        server: WebServer,
    ) -> Result<Networking, WizardError> {
        self.prompt.header("Network Configuration")?;
        self.prompt.line("Choose networking mode:")?;
        self.prompt.line(format!(
            "  • {}: Simpler, uses host's IP with port forwarding",
            style("Bridge").bold()
        ))?;
        self.prompt.line(format!(
            "  • {}: Dedicated IP for container (better for Pi-hole/dnsmasq)\n",
            style("Macvlan").bold()
        ))?;

        let mode = self.prompt.select(
            "Which networking mode?",
            &NetworkMode::ALL,
            Some(NetworkMode::Bridge),
        )?;

        match mode {
            NetworkMode::Bridge => self.configure_bridge(),
            NetworkMode::Macvlan => self.configure_macvlan(server),
        }
    }

    fn configure_bridge(&mut self) -> Result<Networking, WizardError> {
        self.prompt
            .info("Bridge mode will use your host's IP address")?;
        let http_port = self.ask_port("HTTP port", 80)?;
        let https_port = self.ask_port("HTTPS port", 443)?;
        Ok(Networking::Bridge {
            http_port,
            https_port,
        })
    }

    fn configure_macvlan(
        &mut self,
        server: WebServer,
    ) -> Result<Networking, WizardError> {
        self.prompt.info(
            "Macvlan mode gives the container a dedicated IP on your LAN",
        )?;

        let detected_if = match self.prober.default_interface(self.runner) {
            Ok(iface) => Some(iface),
            Err(err) => {
                debug!(error = %err, "network interface detection failed");
                None
            }
        };
        let detected_ip = match self.prober.local_ip() {
            Ok(ip) => Some(ip),
            Err(err) => {
                debug!(error = %err, "local ip detection failed");
                None
            }
        };

        if let Some(iface) = &detected_if {
            self.prompt
                .info(&format!("Detected network interface: {iface}"))?;
        }
        let lan = detected_ip.map(infer_lan);
        if let (Some(ip), Some(lan)) = (detected_ip, &lan) {
            self.prompt.info(&format!("Detected your IP: {ip}"))?;
            self.prompt.info(&format!("Inferred subnet: {}", lan.subnet))?;
            self.prompt
                .info(&format!("Inferred gateway: {}", lan.gateway))?;
        }

        let interface = self.prompt.text(
            "Network interface name",
            Some(detected_if.as_deref().unwrap_or(FALLBACK_INTERFACE)),
            None,
        )?;
        let subnet = self.prompt.text(
            "LAN subnet (CIDR)",
            Some(lan.as_ref().map_or(FALLBACK_SUBNET, |l| l.subnet.as_str())),
            None,
        )?;
        let gateway = self.ask_ip(
            "Gateway IP",
            lan.as_ref().map_or(FALLBACK_GATEWAY, |l| l.gateway.as_str()),
        )?;

        let suggested_ip = suggest_container_ip(&subnet);
        let server_ip = self.ask_ip(
            &format!("{} container IP", server.display_name()),
            &suggested_ip,
        )?;

        Ok(Networking::Macvlan(MacvlanConfig {
            interface,
            subnet,
            gateway,
            server_ip,
        }))
    }

    fn ask_port(
        &mut self,
        question: &str,
        default: u16,
    ) -> Result<u16, WizardError> {
        let default = default.to_string();
        loop {
            let raw =
                self.prompt.text(question, Some(&default), Some(validate_port))?;
            match raw.parse::<u16>() {
                Ok(port) => return Ok(port),
                Err(_) => self.prompt.error("Port must be between 1-65535")?,
            }
        }
    }

    fn ask_ip(
        &mut self,
        question: &str,
        default: &str,
    ) -> Result<HostIp, WizardError> {
        loop {
            let raw =
                self.prompt.text(question, Some(default), Some(validate_ip))?;
            match HostIp::parse(&raw) {
                Ok(ip) => return Ok(ip),
                Err(message) => {
                    self.prompt.error(&format!("{message}: {raw}"))?;
                    if self.opts.non_interactive {
                        return Err(WizardError::NoDefault {
                            question: question.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn choose_tls(&mut self, server: WebServer) -> Result<TlsSetup, WizardError> {
        self.prompt.header("SSL Configuration")?;
        self.prompt.line(
            "SSL certificates allow HTTPS interception without browser warnings",
        )?;
        self.prompt.line(format!(
            "  • {}: HTTP-only redirect (simplest)",
            style("Skip").bold()
        ))?;
        self.prompt.line(format!(
            "  • {}: Automatic CA and cert generation (easiest)",
            style("mkcert").bold()
        ))?;
        self.prompt.line(format!(
            "  • {}: Full control with OpenSSL (advanced)\n",
            style("Manual").bold()
        ))?;

        if !self.tools.can_issue_certs() {
            self.prompt.warning("Neither mkcert nor OpenSSL found")?;
            return Ok(TlsSetup::skipped());
        }

        let mut options = vec![TlsMode::Skip];
        if self.tools.mkcert {
            options.push(TlsMode::Mkcert);
        }
        if self.tools.openssl {
            options.push(TlsMode::Manual);
        }
        let default = options.get(1).copied().unwrap_or(TlsMode::Skip);

        let mode = self.prompt.select("SSL setup:", &options, Some(default))?;
        let mut setup = TlsSetup {
            mode,
            certificates: None,
        };

        match mode {
            TlsMode::Skip => {}
            TlsMode::Mkcert => {
                if self.prompt.yes_no("Generate certificates now?", true)? {
                    setup.certificates =
                        self.generate_mkcert_certificates(server)?;
                }
            }
            TlsMode::Manual => {
                self.prompt.info(&format!(
                    "You'll need to follow {SSL_MANUAL_DOC} to create certificates manually"
                ))?;
            }
        }

        Ok(setup)
    }

    /// Install the mkcert CA, issue certificates and move them into place.
    /// Every failure is reported and yields `None`; the wizard carries on.
    fn generate_mkcert_certificates(
        &mut self,
        server: WebServer,
    ) -> Result<Option<InstalledCerts>, WizardError> {
        self.prompt.info("Installing local CA...")?;
        if let Err(err) = self.runner.run(&mkcert_install_spec()) {
            debug!(error = %err, "mkcert -install failed");
            self.prompt.error(&format!("Failed to install CA: {err}"))?;
            return Ok(None);
        }
        self.prompt.success("CA installed")?;

        self.prompt
            .info("Generating certificates for twitter.com, x.com, t.co...")?;
        let project_dir = self.opts.project_dir.as_path();
        if let Err(err) = self.runner.run(&mkcert_issue_spec(project_dir)) {
            debug!(error = %err, "mkcert certificate issuance failed");
            self.prompt
                .error(&format!("Failed to generate certificates: {err}"))?;
            return Ok(None);
        }
        self.prompt.success("Certificates generated")?;

        let installed = locate_generated(project_dir)
            .and_then(|generated| {
                install_generated(&generated, project_dir, server)
            });
        match installed {
            Ok(certs) => {
                self.prompt.success(&format!(
                    "Certificates copied to {}/",
                    certs.ssl_dir.display()
                ))?;
                Ok(Some(certs))
            }
            Err(err) => {
                debug!(error = %err, "certificate installation failed");
                self.prompt
                    .error(&format!("Failed to install certificates: {err}"))?;
                Ok(None)
            }
        }
    }

    fn choose_dns(&mut self) -> Result<DnsChoice, WizardError> {
        self.prompt.header("DNS Configuration")?;
        self.prompt.line(
            "You need to configure DNS to point twitter.com/x.com to your proxy",
        )?;
        self.prompt.select(
            "What DNS solution will you use?",
            &DnsChoice::ALL,
            Some(DnsChoice::Manual),
        )
    }

    fn generate_env_file(
        &mut self,
        answers: &WizardAnswers,
    ) -> Result<(String, Option<PathBuf>)> {
        self.prompt.header("Generating Configuration")?;

        let contents =
            render_env(&env_document(answers, &self.opts.timezone));

        if self.opts.print_only {
            self.prompt.info(&format!(
                "Not writing {}; generated contents:",
                self.opts.env_path.display()
            ))?;
            self.prompt.line(contents.trim_end())?;
            return Ok((contents, None));
        }

        write_env_atomically(&self.opts.env_path, &contents).with_context(
            || format!("failed to write {}", self.opts.env_path.display()),
        )?;
        self.prompt
            .success(&format!("Created {}", self.opts.env_path.display()))?;
        Ok((contents, Some(self.opts.env_path.clone())))
    }

    /// Print the summary; returns whether the service was started.
    fn show_next_steps(
        &mut self,
        answers: &WizardAnswers,
    ) -> Result<bool, WizardError> {
        self.prompt.header("Setup Complete!")?;

        self.prompt.line(style("Configuration Summary:").bold())?;
        self.prompt
            .line(format!("  Web Server: {}", answers.server.slug()))?;
        self.prompt.line(format!(
            "  Networking: {}",
            answers.networking.mode().slug()
        ))?;
        self.prompt.line(format!("  SSL: {}", answers.tls.mode.slug()))?;
        self.prompt.line(format!("  DNS: {}", answers.dns.slug()))?;

        self.prompt
            .line(format!("\n{}\n", style("Next Steps:").bold()))?;

        self.prompt
            .line(format!("1. {}", style("Configure DNS").bold()))?;
        self.prompt
            .line("   Point twitter.com, x.com, t.co to your proxy IP")?;
        self.prompt
            .line(format!("   See: {}", answers.dns.instructions()))?;

        let manual_tls = answers.tls.mode == TlsMode::Manual;
        if manual_tls {
            self.prompt.line(format!(
                "\n2. {}",
                style("Generate SSL Certificates").bold()
            ))?;
            self.prompt.line(format!(
                "   See: {SSL_MANUAL_DOC} or docs/SSL_SETUP_MKCERT.md"
            ))?;
        }

        let mut step = if manual_tls { 3 } else { 2 };
        let compose = compose_up_spec(answers.server, &self.opts.project_dir);
        self.prompt.line(format!(
            "\n{step}. {}",
            style("Start the Service").bold()
        ))?;
        self.prompt.line(format!("   {}", compose.command_line()))?;

        step += 1;
        self.prompt
            .line(format!("\n{step}. {}", style("Test the Setup").bold()))?;
        self.prompt.line(format!("   {TEST_SCRIPT}"))?;
        self.prompt.line(format!("   See: {TESTING_DOC}"))?;

        self.prompt.line(format!(
            "\n{}",
            style("Configuration files have been generated!").green()
        ))?;
        if !self.opts.print_only {
            self.prompt.line(format!(
                "Your .env file is ready at: {}\n",
                self.opts.env_path.display()
            ))?;
        }

        if self.tools.docker
            && self.prompt.yes_no("Start the service now?", false)?
        {
            return self.start_service(answers.server);
        }
        Ok(false)
    }

    fn start_service(&mut self, server: WebServer) -> Result<bool, WizardError> {
        let spec = compose_up_spec(server, &self.opts.project_dir);
        self.prompt
            .info(&format!("Running: {}", spec.command_line()))?;
        match self.runner.run(&spec) {
            Ok(_) => {
                self.prompt.success("Service started!")?;
                self.prompt.info("Check status: docker compose ps")?;
                self.prompt.info("View logs: docker compose logs -f")?;
                Ok(true)
            }
            Err(err) => {
                debug!(error = %err, "docker compose up failed");
                self.prompt
                    .error(&format!("Failed to start service: {err}"))?;
                Ok(false)
            }
        }
    }
}

/// Run the wizard against the real terminal, tools and network.
pub fn run_wizard(opts: &InitOptions) -> Result<WizardOutcome> {
    let stdin = std::io::stdin();
    let prompt = Prompter::new(stdin.lock(), Term::stdout())
        .assume_defaults(opts.non_interactive);
    let tools = ToolAvailability::detect();
    let prober = system_prober();
    let mut runner = SystemRunner;

    Wizard::new(prompt, opts, tools, prober.as_ref(), &mut runner).run()
}

/// Validate an existing env file and print the result.
pub fn run_config_check(opts: &CheckOptions) -> Result<()> {
    let entries = load_env_entries(&opts.env_file)?;
    let issues = validate_env_entries(&entries);

    if issues.is_empty() {
        println!(
            "[ok] {} ({} keys)",
            opts.env_file.display(),
            entries.len()
        );
        println!("All checks passed.");
        return Ok(());
    }

    println!("Configuration check encountered errors:");
    for issue in &issues {
        println!("  - {issue}");
    }
    bail!("configuration check failed")
}

fn load_env_entries(path: &Path) -> Result<Vec<(String, String)>> {
    if !path.exists() {
        bail!(
            "{} does not exist; run `xcancel-init` to generate it",
            path.display()
        );
    }
    read_env_entries(path)
}
