//! Bulk outbound email
//!
//! This module provides:
//! - Transport resolution from a [`TransportConfig`](crate::config::TransportConfig),
//!   with simulated mode when no transport is available
//! - A single-recipient [`send`] that never fails
//! - A [`BulkDispatcher`] that sends sequentially with pacing and aggregates
//!   a [`BulkResult`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use customerhub_mail::config::TransportConfig;
//! use customerhub_mail::email::BulkDispatcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = BulkDispatcher::new(TransportConfig::from_env()?);
//!
//! let result = dispatcher
//!     .send_bulk(
//!         &["alice@example.com", "bob@example.com"],
//!         "Spring sale",
//!         "Everything is 50% off this week.",
//!         None,
//!     )
//!     .await;
//!
//! println!("sent {} / failed {}", result.sent_count, result.failed_count);
//! # Ok(())
//! # }
//! ```

mod backend;
mod cancellation;
mod dispatcher;
mod error;
mod message;
mod resolver;
mod sender;
pub(crate) mod transport;

pub use backend::smtp::{SmtpTransport, SmtpTransportFactory};
pub use cancellation::CancellationToken;
pub use dispatcher::BulkDispatcher;
pub use error::EmailError;
pub use message::{
    BulkFailure, BulkRequest, BulkResult, DeliveryStatus, OutboundMessage, SendOutcome,
    SendRequest,
};
pub use resolver::{resolve, verify, ResolvedTransport, SimulationReason};
pub use sender::send;
pub use transport::{MailTransport, TransportFactory};
