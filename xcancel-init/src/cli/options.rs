//! Options for the `init` and `check` commands.

use std::path::PathBuf;

use crate::constants::ENV_FILE_NAME;

#[derive(Debug, Clone)]
/// Options controlling a wizard run.
pub struct InitOptions {
    /// Directory holding the compose files; mkcert and docker run here.
    pub project_dir: PathBuf,
    /// Env file to write; defaults to `<project_dir>/.env`.
    pub env_path: PathBuf,
    /// Answer every prompt with its default.
    pub non_interactive: bool,
    /// Print the env file instead of writing it.
    pub print_only: bool,
    /// Value written to `TZ`.
    pub timezone: String,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

impl InitOptions {
    /// Options for `project_dir` with the default env path and timezone.
    pub fn new(project_dir: PathBuf) -> Self {
        Self {
            env_path: project_dir.join(ENV_FILE_NAME),
            project_dir,
            non_interactive: false,
            print_only: false,
            timezone: crate::constants::DEFAULT_TIMEZONE.to_string(),
        }
    }

    /// Take the timezone from `TZ`, falling back to the fixed default.
    pub fn with_timezone_from_env(mut self) -> Self {
        self.timezone = timezone_from_env();
        self
    }
}

/// `TZ` from the environment; unset or blank falls back to the default.
pub fn timezone_from_env() -> String {
    std::env::var("TZ")
        .ok()
        .filter(|tz| !tz.trim().is_empty())
        .unwrap_or_else(|| crate::constants::DEFAULT_TIMEZONE.to_string())
}

#[derive(Debug, Clone, Default)]
/// Options for validating an existing env file (`xcancel-init check`).
pub struct CheckOptions {
    /// Env file to validate.
    pub env_file: PathBuf,
}
