//! External commands as plain data, and the runner that executes them.

use std::{
    fmt::Display,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
};

use tracing::debug;

use crate::{constants::CERT_DOMAINS, error::ExecError, models::WebServer};

/// Abstract command representation so we can test without spawning processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name, resolved through `PATH`.
    pub program: String,
    /// Arguments in order.
    pub args: Vec<String>,
    /// Working directory; the caller's when `None`.
    pub cwd: Option<PathBuf>,
    /// Attach the terminal instead of capturing output.
    pub inherit_stdio: bool,
}

/// Display raw command string
impl Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(dir) = &self.cwd {
            let mut dir_str = dir.to_string_lossy().to_string();
            if !dir_str.ends_with('/') {
                dir_str.push('/');
            }
            write!(f, "{dir_str}$ ")?;
        }
        f.write_str(&self.command_line())
    }
}

impl CommandSpec {
    /// Spec for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            inherit_stdio: false,
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir`.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Let the command talk to the terminal directly.
    pub fn inherit_stdio(mut self) -> Self {
        self.inherit_stdio = true;
        self
    }

    /// Program and arguments joined by spaces, as an operator would type it.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the `std::process::Command` for `spec`.
pub fn to_command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);
    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    if spec.inherit_stdio {
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
    }
    cmd
}

/// What a finished command left behind. Streams are empty when inherited.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

/// Executes command specs; swapped for a recorder in tests.
pub trait CommandRunner {
    /// Run to completion. A non-zero exit is an [`ExecError::Failed`].
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

/// Spawns real processes and blocks until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        debug!(command = %spec, "running external command");
        let mut cmd = to_command(spec);

        let spawn_err = |source: std::io::Error| {
            if source.kind() == ErrorKind::NotFound {
                ExecError::NotFound {
                    program: spec.program.clone(),
                }
            } else {
                ExecError::Io {
                    program: spec.program.clone(),
                    source,
                }
            }
        };

        let output = if spec.inherit_stdio {
            let status = cmd.status().map_err(spawn_err)?;
            CommandOutput {
                status,
                stdout: String::new(),
                stderr: String::new(),
            }
        } else {
            let out = cmd.output().map_err(spawn_err)?;
            CommandOutput {
                status: out.status,
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            }
        };

        if !output.status.success() {
            debug!(command = %spec, status = %output.status, "command failed");
            return Err(ExecError::Failed {
                program: spec.program.clone(),
                status: output.status,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}

/// `mkcert -install`: trust the local CA. Interactive (may ask for sudo).
pub fn mkcert_install_spec() -> CommandSpec {
    CommandSpec::new("mkcert").args(["-install"]).inherit_stdio()
}

/// `mkcert <domains...>` run in `project_dir`, which receives the PEM files.
pub fn mkcert_issue_spec(project_dir: &Path) -> CommandSpec {
    CommandSpec::new("mkcert")
        .args(CERT_DOMAINS.iter().copied())
        .cwd(project_dir)
}

/// `docker compose ... up -d` for the chosen server, run in `project_dir`.
pub fn compose_up_spec(server: WebServer, project_dir: &Path) -> CommandSpec {
    CommandSpec::new("docker")
        .args(server.compose_up_args())
        .cwd(project_dir)
        .inherit_stdio()
}
