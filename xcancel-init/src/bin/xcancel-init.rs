//! `xcancel-init`: run the setup wizard or check an existing env file.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{Parser, Subcommand};
use dialoguer::console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xcancel_init::{
    WizardError,
    cli::{self, CheckOptions, InitOptions},
    constants::ENV_FILE_NAME,
};

#[derive(Parser)]
#[command(
    name = "xcancel-init",
    version,
    about = "Interactive .env generator for the X/Twitter to xcancel redirect proxy",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    init: InitArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Run the setup wizard and write .env (default)
    Init(InitArgs),
    /// Validate an existing .env file
    Check {
        #[arg(long, default_value = ENV_FILE_NAME)]
        env_file: PathBuf,
    },
}

#[derive(clap::Args)]
struct InitArgs {
    /// Directory holding the compose files; certificates and .env go here
    #[arg(long, env = "XCANCEL_PROJECT_DIR", default_value = ".")]
    project_dir: PathBuf,
    /// Write to this path instead of <project-dir>/.env
    #[arg(long)]
    env_file: Option<PathBuf>,
    /// Accept every default without prompting
    #[arg(long)]
    non_interactive: bool,
    /// Print the generated .env without writing it
    #[arg(long)]
    print_only: bool,
}

impl InitArgs {
    fn into_options(self) -> InitOptions {
        let mut opts =
            InitOptions::new(self.project_dir).with_timezone_from_env();
        if let Some(env_file) = self.env_file {
            opts.env_path = env_file;
        }
        opts.non_interactive = self.non_interactive;
        opts.print_only = self.print_only;
        opts
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = ctrlc::set_handler(|| {
        println!("\n\n{}", style("Setup cancelled").yellow());
        std::process::exit(1);
    }) {
        tracing::warn!(error = %err, "could not install Ctrl-C handler");
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if matches!(
                err.downcast_ref::<WizardError>(),
                Some(WizardError::Cancelled)
            ) {
                println!("\n\n{}", style("Setup cancelled").yellow());
            } else {
                println!("\n{} {err:#}", style("An error occurred:").red());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => {
            cli::run_wizard(&cli.init.into_options())?;
        }
        Some(Command::Init(args)) => {
            cli::run_wizard(&args.into_options())?;
        }
        Some(Command::Check { env_file }) => {
            cli::run_config_check(&CheckOptions { env_file })?;
        }
    }
    Ok(())
}
