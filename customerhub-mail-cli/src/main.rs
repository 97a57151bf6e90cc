//! customerhub-mail CLI tool

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{load_config, ConfigCommand, SendCommand, VerifyCommand};

#[derive(Parser)]
#[command(name = "customerhub-mail")]
#[command(version)]
#[command(about = "Check and drive CustomerHub bulk email", long_about = None)]
struct Cli {
    /// Read configuration from this TOML file instead of `SMTP_*` variables
    #[arg(short, long, global = true, env = "CUSTOMERHUB_MAIL_CONFIG")]
    config: Option<String>,

    /// Log dispatcher activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the mail server accepts connections
    Verify,
    /// Send one message to a list of recipients
    Send(SendCommand),
    /// Print the effective transport configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.verbose {
        customerhub_mail::observability::init()?;
    }

    let config = load_config(cli.config.as_deref())?;

    let success = match cli.command {
        Commands::Verify => VerifyCommand::execute(&config).await,
        Commands::Send(command) => command.execute(&config).await?.success(),
        Commands::Config(command) => {
            command.execute(&config)?;
            true
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
