//! Bulk message handlers
//!
//! `POST /customers/bulk-message` takes the form submitted by the bulk
//! message dialog, resolves the selected customer IDs to addresses and hands
//! the batch to the dispatcher. `GET /mail/status` reports whether sends
//! would go out for real.
//!
//! Authentication is expected to be layered on by the embedding application.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::email::{verify, BulkFailure, BulkRequest, BulkResult, SimulationReason};
use crate::error::MailerError;
use crate::extractors::ValidatedForm;
use crate::state::MailerState;

/// Form submitted by the bulk message dialog
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkMessageForm {
    /// Email subject
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,

    /// Plain text message
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,

    /// Comma-separated customer IDs
    #[serde(alias = "customerIds")]
    #[validate(length(min = 1, message = "Select at least one customer"))]
    pub customer_ids: String,
}

impl BulkMessageForm {
    /// Parse `customer_ids` into IDs
    ///
    /// # Errors
    ///
    /// Returns `MailerError::BadRequest` if any entry is not an integer
    pub fn parse_customer_ids(&self) -> Result<Vec<i64>, MailerError> {
        self.customer_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<i64>()
                    .map_err(|_| MailerError::BadRequest(format!("invalid customer id: {id}")))
            })
            .collect()
    }
}

/// Response for the bulk message endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkMessageResponse {
    /// `sent`, `partial`, `failed` or `simulated`
    pub status: String,
    /// Recipients delivered (or simulated)
    pub sent: usize,
    /// Recipients that failed
    pub failed: usize,
    /// Whether nothing left the process
    pub simulated: bool,
    /// Why the batch was simulated
    pub simulation_reason: Option<SimulationReason>,
    /// Per-recipient failures in send order
    pub errors: Vec<BulkFailure>,
    /// Human-readable summary
    pub message: String,
}

impl From<BulkResult> for BulkMessageResponse {
    fn from(result: BulkResult) -> Self {
        let status = result.status();
        let message = if result.simulated {
            format!(
                "Email is not configured; simulated sending to {} customer(s)",
                result.sent_count
            )
        } else if result.success() {
            format!("Message sent to {} customer(s)", result.sent_count)
        } else {
            format!(
                "Message sent to {} customer(s), {} failed",
                result.sent_count, result.failed_count
            )
        };

        Self {
            status: status.label().to_string(),
            sent: result.sent_count,
            failed: result.failed_count,
            simulated: result.simulated,
            simulation_reason: result.simulation_reason,
            errors: result.failures,
            message,
        }
    }
}

/// Send one message to the selected customers
///
/// # Errors
///
/// - 400 if `customer_ids` contains something other than integers
/// - 422 if the form is incomplete or no selected customer exists
/// - 500 if the customer store fails
///
/// Partial delivery failure is a successful response; see
/// [`BulkMessageResponse::failed`].
pub async fn send_bulk_message(
    State(state): State<MailerState>,
    ValidatedForm(form): ValidatedForm<BulkMessageForm>,
) -> Result<Json<BulkMessageResponse>, MailerError> {
    let ids = form.parse_customer_ids()?;
    let recipients = state.customers().emails_for(&ids).await?;

    if recipients.is_empty() {
        return Err(MailerError::Unprocessable(
            "no customers found for the selected IDs".to_string(),
        ));
    }

    let request = BulkRequest::new(recipients, &form.subject, &form.message);
    request.validate()?;

    info!(
        recipients = request.recipients.len(),
        subject = %request.subject,
        "Dispatching bulk message"
    );

    let result = state.dispatcher().dispatch(&request).await;
    Ok(Json(result.into()))
}

/// Response for the mail status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailStatusResponse {
    /// `live` or `simulated`
    pub mode: String,
    /// Why sends are simulated
    pub simulation_reason: Option<SimulationReason>,
    /// Whether the live handshake succeeded
    pub reachable: bool,
}

/// Report whether sends would be live, running the transport handshake
pub async fn mail_status(State(state): State<MailerState>) -> Json<MailStatusResponse> {
    let transport = state.dispatcher().resolve();
    let reachable = verify(&transport).await;

    Json(MailStatusResponse {
        mode: if transport.is_absent() { "simulated" } else { "live" }.to_string(),
        simulation_reason: transport.simulation_reason(),
        reachable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(ids: &str) -> BulkMessageForm {
        BulkMessageForm {
            subject: "Sale".to_string(),
            message: "50% off".to_string(),
            customer_ids: ids.to_string(),
        }
    }

    #[test]
    fn test_parse_customer_ids() {
        assert_eq!(form("1, 2,3,").parse_customer_ids().unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            form("1,abc").parse_customer_ids(),
            Err(MailerError::BadRequest(_))
        ));
    }

    #[test]
    fn test_response_from_partial_result() {
        let mut result = BulkResult::live();
        result.record(crate::email::SendOutcome::delivered("a@x.com"));
        result.record(crate::email::SendOutcome::failed("b@x.com", "rejected"));

        let response = BulkMessageResponse::from(result);
        assert_eq!(response.status, "partial");
        assert_eq!(response.sent, 1);
        assert_eq!(response.failed, 1);
        assert_eq!(response.message, "Message sent to 1 customer(s), 1 failed");
    }

    #[test]
    fn test_response_from_simulated_result() {
        let response = BulkMessageResponse::from(BulkResult::simulated(
            2,
            SimulationReason::MissingCredentials,
        ));
        assert_eq!(response.status, "simulated");
        assert!(response.simulated);
        assert_eq!(
            response.simulation_reason,
            Some(SimulationReason::MissingCredentials)
        );
    }
}
