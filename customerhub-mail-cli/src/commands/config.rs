//! Effective configuration display

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use customerhub_mail::config::MailerConfig;

/// Output format for the config command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// TOML, as accepted by `--config`
    #[default]
    Toml,
    /// Pretty-printed JSON
    Json,
}

/// Print the effective configuration with the password masked
#[derive(Debug, Args)]
pub struct ConfigCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

impl ConfigCommand {
    /// Execute the config command
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized
    pub fn execute(&self, config: &MailerConfig) -> Result<()> {
        println!("{}", self.render(config)?);
        Ok(())
    }

    fn render(&self, config: &MailerConfig) -> Result<String> {
        let redacted = MailerConfig {
            transport: config.transport.redacted(),
            ..config.clone()
        };

        match self.format {
            OutputFormat::Toml => {
                toml::to_string_pretty(&redacted).context("Failed to serialize configuration")
            }
            OutputFormat::Json => serde_json::to_string_pretty(&redacted)
                .context("Failed to serialize configuration"),
        }
    }
}
