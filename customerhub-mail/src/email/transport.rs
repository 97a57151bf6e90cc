//! Transport abstraction
//!
//! A [`MailTransport`] submits one fully addressed message to a mail-sending
//! service. A [`TransportFactory`] turns a [`TransportConfig`] into a
//! transport; the resolver goes through the factory so tests can substitute
//! their own transports.

use std::sync::Arc;

use async_trait::async_trait;

use super::{EmailError, OutboundMessage};
use crate::config::TransportConfig;

/// Trait for submitting messages to a mail service
///
/// Implemented by [`SmtpTransport`](super::SmtpTransport) for production and
/// by [`RecordingTransport`](crate::testing::RecordingTransport) for tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submit a single message
    ///
    /// # Errors
    ///
    /// Returns `EmailError` describing why the service did not accept the
    /// message (authentication, connection, timeout, recipient rejected)
    async fn submit(&self, message: &OutboundMessage) -> Result<(), EmailError>;

    /// Perform a live handshake with the service
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the service cannot be reached
    async fn verify(&self) -> Result<bool, EmailError>;
}

/// Trait for building transports from configuration
#[cfg_attr(test, mockall::automock)]
pub trait TransportFactory: Send + Sync {
    /// Build a transport bound to `config`
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the configuration cannot produce a transport
    fn build(&self, config: &TransportConfig) -> Result<Arc<dyn MailTransport>, EmailError>;
}
