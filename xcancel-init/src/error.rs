//! Error types for the wizard, external commands and certificate install.

use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;

/// Failures that end a wizard run.
#[derive(Debug, Error)]
pub enum WizardError {
    /// Input ended or the operator interrupted the run.
    #[error("setup cancelled")]
    Cancelled,
    /// Non-interactive mode reached a prompt it cannot answer.
    #[error("prompt '{question}' has no default in non-interactive mode")]
    NoDefault {
        /// The prompt text.
        question: String,
    },
    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why an external command did not produce what the caller needed.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program is not on `PATH`.
    #[error("{program} was not found on PATH")]
    NotFound {
        /// Program name as spawned.
        program: String,
    },
    /// The program ran and exited non-zero.
    #[error("{program} exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        /// Program name as spawned.
        program: String,
        /// Exit status reported by the OS.
        status: ExitStatus,
        /// Captured stderr; empty when stdio was inherited.
        stderr: String,
    },
    /// Spawning or waiting failed for another reason.
    #[error("failed to run {program}")]
    Io {
        /// Program name as spawned.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The program succeeded but its output lacked what was needed.
    #[error("could not understand output of {program}: {reason}")]
    Unparsable {
        /// Program name as spawned.
        program: String,
        /// What was missing.
        reason: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Errors while moving mkcert output into place.
#[derive(Debug, Error)]
pub enum CertError {
    /// No certificate/key pair was found after issuance.
    #[error("mkcert output not found in {}", dir.display())]
    MissingOutput {
        /// Directory that was searched.
        dir: PathBuf,
    },
    /// Copying, chmod or removal failed.
    #[error("failed to install certificate file {}", path.display())]
    Io {
        /// File being written or removed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
