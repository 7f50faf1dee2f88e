//! Setup wizard for the X/Twitter to xcancel redirect proxy.
//!
//! The crate walks an operator through choosing a reverse proxy, container
//! networking, TLS and DNS, then writes the `.env` file the compose stack
//! reads. Optional side effects (mkcert certificates, starting the stack)
//! are best-effort and never abort a run. The `xcancel-init` binary is a thin
//! clap wrapper around [`cli::run_wizard`] and [`cli::run_config_check`].

pub mod cli;
pub mod constants;
pub mod env_writer;
pub mod error;
pub mod models;
pub mod validation;

pub use error::{CertError, ExecError, WizardError};
pub use models::{
    DnsChoice, HostIp, MacvlanConfig, NetworkMode, Networking, TlsMode,
    TlsSetup, WebServer, WizardAnswers, env_document, generate_env_kv,
};
pub use validation::{EnvIssue, validate_env_entries};
