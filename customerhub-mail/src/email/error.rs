//! Email error types

use thiserror::Error;

/// Errors that can occur when building or submitting an email
#[derive(Debug, Error)]
pub enum EmailError {
    /// Request has no recipient
    #[error("email must have a recipient")]
    NoRecipients,

    /// Request has no subject
    #[error("email must have a subject")]
    NoSubject,

    /// Request has no body content
    #[error("email must have a text body")]
    NoContent,

    /// Invalid email address format
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// SMTP transport error
    #[error("{0}")]
    SmtpError(String),

    /// Email configuration error
    #[error("email configuration error: {0}")]
    ConfigError(String),
}

impl EmailError {
    /// Create an SMTP error from a string message
    #[must_use]
    pub fn smtp<T: Into<String>>(msg: T) -> Self {
        Self::SmtpError(msg.into())
    }

    /// Create a configuration error from a string message
    #[must_use]
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::ConfigError(msg.into())
    }
}
