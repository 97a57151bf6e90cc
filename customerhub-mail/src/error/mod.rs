//! Error types and error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::customers::StoreError;
use crate::email::EmailError;

/// Application error type
///
/// Partial delivery failure is never an error; it is reported through
/// [`BulkResult`](crate::email::BulkResult). These variants cover requests
/// rejected before dispatch and failures of the collaborators around it.
#[derive(Debug, Error)]
pub enum MailerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad request error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request was well-formed but resolved to nothing sendable
    #[error("Unprocessable request: {0}")]
    Unprocessable(String),

    /// Email error
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Customer store error
    #[error("Customer store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for MailerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_)
            | Self::Email(
                EmailError::NoRecipients
                | EmailError::NoSubject
                | EmailError::NoContent
                | EmailError::InvalidAddress(_),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Config(_) | Self::Email(_) | Self::Store(_) => {
                error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
