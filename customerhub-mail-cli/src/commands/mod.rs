//! CLI command implementations

pub mod config;
pub mod send;
pub mod verify;

use anyhow::{Context, Result};
use customerhub_mail::config::{MailerConfig, TransportConfig};

pub use config::ConfigCommand;
pub use send::SendCommand;
pub use verify::VerifyCommand;

/// Load the configuration every command works from
///
/// With a file, the whole [`MailerConfig`] comes from it (plus
/// `CUSTOMERHUB_*` overrides). Without one, the transport is read from the
/// `SMTP_*` variables and everything else uses defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or an `SMTP_*` value is
/// malformed
pub fn load_config(path: Option<&str>) -> Result<MailerConfig> {
    match path {
        Some(path) => MailerConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {path}")),
        None => Ok(MailerConfig {
            transport: TransportConfig::from_env().context("Invalid SMTP environment")?,
            ..MailerConfig::default()
        }),
    }
}
