//! Transport handshake check

use console::{style, Emoji};
use customerhub_mail::config::MailerConfig;
use customerhub_mail::email::{verify, BulkDispatcher};
use indicatif::{ProgressBar, ProgressStyle};

static SUCCESS: Emoji = Emoji("✓", "√");
static FAILURE: Emoji = Emoji("✗", "x");
static WARNING: Emoji = Emoji("⚠", "!");

/// Resolve the transport and run the live handshake
pub struct VerifyCommand;

impl VerifyCommand {
    /// Execute the verify command
    ///
    /// Returns `false` only when a live transport fails the handshake.
    /// Simulated mode is reported but is not a failure.
    pub async fn execute(config: &MailerConfig) -> bool {
        let transport_config = &config.transport;
        println!(
            "\nMail server: {}:{}",
            style(&transport_config.host).cyan(),
            transport_config.port
        );

        let transport = BulkDispatcher::from_config(config).resolve();

        if let Some(reason) = transport.simulation_reason() {
            println!("{WARNING} {} ({reason})", style("Simulated mode").yellow().bold());
            println!("  Messages will be logged instead of delivered.");
            println!("  Set SMTP_USER and SMTP_PASSWORD to enable delivery.");
            return true;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner.set_message("Connecting to mail server...");

        let reachable = verify(&transport).await;
        spinner.finish_and_clear();

        if reachable {
            println!("{SUCCESS} {}", style("Mail server is ready to send").green());
        } else {
            println!("{FAILURE} {}", style("Mail server connection failed").red());
        }

        reachable
    }
}
