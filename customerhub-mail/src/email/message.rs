//! Request, outcome and result types shared by the send paths

use serde::{Deserialize, Serialize};

use super::{EmailError, SimulationReason};

/// A single-recipient send request
///
/// ```rust
/// use customerhub_mail::email::SendRequest;
///
/// let request = SendRequest::new("user@example.com", "Sale", "50% off")
///     .html("<p>50% off</p>")
///     .from("sales@example.com");
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// Recipient address
    pub recipient: String,

    /// Email subject
    pub subject: String,

    /// Plain text body
    pub text_body: String,

    /// Optional HTML body
    pub html_body: Option<String>,

    /// Sender override
    pub from_address: Option<String>,
}

impl SendRequest {
    /// Create a request with a plain text body
    #[must_use]
    pub fn new(recipient: &str, subject: &str, text_body: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            text_body: text_body.to_string(),
            html_body: None,
            from_address: None,
        }
    }

    /// Attach an HTML body
    #[must_use]
    pub fn html(mut self, html: &str) -> Self {
        self.html_body = Some(html.to_string());
        self
    }

    /// Override the sender address
    #[must_use]
    pub fn from(mut self, address: &str) -> Self {
        self.from_address = Some(address.to_string());
        self
    }

    /// Check that recipient, subject and text body are all non-blank
    ///
    /// # Errors
    ///
    /// Returns the first missing field as an [`EmailError`]
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.recipient.trim().is_empty() {
            return Err(EmailError::NoRecipients);
        }
        if self.subject.trim().is_empty() {
            return Err(EmailError::NoSubject);
        }
        if self.text_body.trim().is_empty() {
            return Err(EmailError::NoContent);
        }
        Ok(())
    }
}

/// One subject/body pair addressed to an ordered list of recipients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRequest {
    /// Recipient addresses, in send order
    pub recipients: Vec<String>,

    /// Email subject
    pub subject: String,

    /// Plain text body
    pub text_body: String,

    /// Optional HTML body
    pub html_body: Option<String>,
}

impl BulkRequest {
    /// Create a bulk request with a plain text body
    #[must_use]
    pub fn new(recipients: Vec<String>, subject: &str, text_body: &str) -> Self {
        Self {
            recipients,
            subject: subject.to_string(),
            text_body: text_body.to_string(),
            html_body: None,
        }
    }

    /// Attach an HTML body
    #[must_use]
    pub fn html(mut self, html: &str) -> Self {
        self.html_body = Some(html.to_string());
        self
    }

    /// Reject a request that should never reach the dispatcher
    ///
    /// The dispatcher itself treats an empty recipient list as a no-op;
    /// callers use this to turn it into an error before dispatch.
    ///
    /// # Errors
    ///
    /// Returns the first missing field as an [`EmailError`]
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.recipients.is_empty() {
            return Err(EmailError::NoRecipients);
        }
        if self.subject.trim().is_empty() {
            return Err(EmailError::NoSubject);
        }
        if self.text_body.trim().is_empty() {
            return Err(EmailError::NoContent);
        }
        Ok(())
    }
}

/// A fully addressed message handed to a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Sender address
    pub from: String,

    /// Recipient address
    pub to: String,

    /// Email subject
    pub subject: String,

    /// Plain text body
    pub text: String,

    /// HTML body
    pub html: Option<String>,
}

/// Result of one single-recipient send
///
/// Built only through [`SendOutcome::simulated`], [`SendOutcome::delivered`]
/// and [`SendOutcome::failed`], so an undelivered outcome always carries an
/// error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    recipient: String,
    delivered: bool,
    simulated: bool,
    error_message: Option<String>,
}

impl SendOutcome {
    /// Outcome of a send that skipped the network entirely
    #[must_use]
    pub fn simulated(recipient: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            delivered: true,
            simulated: true,
            error_message: None,
        }
    }

    /// Outcome of a send accepted by the transport
    #[must_use]
    pub fn delivered(recipient: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            delivered: true,
            simulated: false,
            error_message: None,
        }
    }

    /// Outcome of a send the transport rejected
    #[must_use]
    pub fn failed(recipient: &str, error_message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.to_string(),
            delivered: false,
            simulated: false,
            error_message: Some(error_message.into()),
        }
    }

    /// Recipient address
    #[must_use]
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Whether the message counts as delivered
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Whether no network I/O took place
    #[must_use]
    pub const fn is_simulated(&self) -> bool {
        self.simulated
    }

    /// Cause of the failure, for undelivered outcomes
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// A recipient that could not be delivered to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    /// Recipient address
    pub recipient: String,

    /// Transport-reported cause
    pub error_message: String,
}

/// Aggregate result of one bulk call
///
/// `sent_count + failed_count == total_attempted` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    /// Recipients a send was attempted (or simulated) for
    pub total_attempted: usize,

    /// Recipients delivered (or simulated)
    pub sent_count: usize,

    /// Recipients the transport rejected
    pub failed_count: usize,

    /// Whether the whole batch ran without a transport
    pub simulated: bool,

    /// Why the batch was simulated
    pub simulation_reason: Option<SimulationReason>,

    /// Whether the batch stopped early on a cancellation request
    pub cancelled: bool,

    /// Failures in input order
    pub failures: Vec<BulkFailure>,
}

impl BulkResult {
    /// Result of a batch that never touched the network
    #[must_use]
    pub const fn simulated(recipient_count: usize, reason: SimulationReason) -> Self {
        Self {
            total_attempted: recipient_count,
            sent_count: recipient_count,
            failed_count: 0,
            simulated: true,
            simulation_reason: Some(reason),
            cancelled: false,
            failures: Vec::new(),
        }
    }

    /// Empty result for a batch about to run against a live transport
    #[must_use]
    pub const fn live() -> Self {
        Self {
            total_attempted: 0,
            sent_count: 0,
            failed_count: 0,
            simulated: false,
            simulation_reason: None,
            cancelled: false,
            failures: Vec::new(),
        }
    }

    /// Fold one send outcome into the tallies
    pub fn record(&mut self, outcome: SendOutcome) {
        self.total_attempted += 1;
        if outcome.delivered {
            self.sent_count += 1;
        } else {
            self.failed_count += 1;
            self.failures.push(BulkFailure {
                recipient: outcome.recipient,
                error_message: outcome
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
    }

    /// True iff no recipient failed
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failed_count == 0
    }

    /// Coarse status for display
    #[must_use]
    pub const fn status(&self) -> DeliveryStatus {
        if self.simulated {
            DeliveryStatus::Simulated
        } else if self.failed_count == 0 {
            DeliveryStatus::Sent
        } else if self.sent_count == 0 {
            DeliveryStatus::Failed
        } else {
            DeliveryStatus::PartiallySent {
                failed: self.failed_count,
            }
        }
    }
}

/// What a caller should tell the user about a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DeliveryStatus {
    /// Every recipient was delivered
    Sent,
    /// Some recipients failed
    PartiallySent {
        /// Number of failed recipients
        failed: usize,
    },
    /// Every attempted recipient failed
    Failed,
    /// No transport was available; nothing left the process
    Simulated,
}

impl DeliveryStatus {
    /// Short machine-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::PartiallySent { .. } => "partial",
            Self::Failed => "failed",
            Self::Simulated => "simulated",
        }
    }
}
