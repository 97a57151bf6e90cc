//! Bulk send command

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use console::{style, Emoji};
use customerhub_mail::config::MailerConfig;
use customerhub_mail::email::{
    BulkDispatcher, BulkRequest, BulkResult, CancellationToken, DeliveryStatus,
};
use indicatif::{ProgressBar, ProgressStyle};

static SUCCESS: Emoji = Emoji("✓", "√");
static FAILURE: Emoji = Emoji("✗", "x");
static INFO: Emoji = Emoji("ℹ", "i");

/// Send one message to a list of recipients
#[derive(Debug, Args)]
pub struct SendCommand {
    /// Recipient address (repeat for more than one)
    #[arg(long = "to", required = true)]
    pub to: Vec<String>,

    /// Subject line
    #[arg(short, long)]
    pub subject: String,

    /// Plain text body
    #[arg(short, long)]
    pub message: String,

    /// HTML body sent alongside the text body
    #[arg(long)]
    pub html: Option<String>,

    /// Milliseconds to wait after each send
    #[arg(long)]
    pub pacing_ms: Option<u64>,
}

impl SendCommand {
    /// Execute the send command
    ///
    /// Ctrl-C stops the batch before the next recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the subject or message is empty
    pub async fn execute(&self, config: &MailerConfig) -> Result<BulkResult> {
        let mut request = BulkRequest::new(self.to.clone(), &self.subject, &self.message);
        if let Some(html) = &self.html {
            request = request.html(html);
        }
        request.validate().context("Nothing to send")?;

        let mut dispatcher = BulkDispatcher::from_config(config);
        if let Some(ms) = self.pacing_ms {
            dispatcher = dispatcher.with_pacing_interval(Duration::from_millis(ms));
        }

        let cancellation = CancellationToken::new();
        let on_interrupt = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .context("Failed to set progress style")?,
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Sending to {} recipient(s)...", request.recipients.len()));

        let result = dispatcher
            .send_bulk_with_cancellation(
                &request.recipients,
                &request.subject,
                &request.text_body,
                request.html_body.as_deref(),
                &cancellation,
            )
            .await;
        spinner.finish_and_clear();

        print_summary(&result);
        Ok(result)
    }
}

fn headline(result: &BulkResult) -> String {
    match result.status() {
        DeliveryStatus::Sent => format!("Sent to {} recipient(s)", result.sent_count),
        DeliveryStatus::PartiallySent { failed } => {
            format!("Sent to {} recipient(s), {failed} failed", result.sent_count)
        }
        DeliveryStatus::Failed => format!("All {} recipient(s) failed", result.failed_count),
        DeliveryStatus::Simulated => format!(
            "Simulated sending to {} recipient(s); nothing was delivered",
            result.sent_count
        ),
    }
}

fn print_summary(result: &BulkResult) {
    println!();
    match result.status() {
        DeliveryStatus::Sent => println!("{SUCCESS} {}", style(headline(result)).green()),
        DeliveryStatus::Simulated => {
            println!("{INFO} {}", style(headline(result)).yellow());
            if let Some(reason) = result.simulation_reason {
                println!("  Reason: {reason}");
            }
        }
        DeliveryStatus::PartiallySent { .. } | DeliveryStatus::Failed => {
            println!("{FAILURE} {}", style(headline(result)).red());
        }
    }

    for failure in &result.failures {
        println!(
            "  {} {}",
            style(&failure.recipient).bold(),
            style(&failure.error_message).dim()
        );
    }

    if result.cancelled {
        println!(
            "{INFO} Interrupted after {} recipient(s)",
            result.total_attempted
        );
    }
}
