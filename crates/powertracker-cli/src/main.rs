use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod setup;

use cli::{Cli, Commands};
use config::{Config, has_required_args, resolve};

#[tokio::main]
async fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "powertracker", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);

    if let Some(Commands::Config { action }) = cli.command {
        return commands::cmd_config(action, &path, cli.quiet);
    }

    let config = if !path.exists() && !has_required_args(&cli.connection) && setup::is_interactive()
    {
        eprintln!("No config file found at {}.", path.display());
        setup::run_setup(&path, Config::default())?
    } else {
        Config::load_from(&path)?
    };

    let settings = resolve(&cli.connection, &cli.report, &config)?;
    commands::cmd_report(settings).await
}
