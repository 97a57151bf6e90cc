//! customerhub-mail: bulk outbound email for the CustomerHub customer-management app
//!
//! The core is the [`email::BulkDispatcher`]: given recipients, a subject and
//! a body it attempts delivery to every recipient, tolerates partial failure,
//! paces sends to stay under provider rate limits, and falls back to a
//! simulated mode when no mail transport is configured.
//!
//! Around it sit the pieces an application needs to drive it:
//! - [`config`]: transport and dispatch configuration (figment, `SMTP_*` env)
//! - [`customers`]: resolving selected customer IDs to addresses (sqlx)
//! - [`handlers`]: the axum endpoint behind the bulk message dialog
//! - [`observability`]: tracing subscriber setup
//! - [`testing`]: in-memory transports for tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use customerhub_mail::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     observability::init()?;
//!
//!     let config = MailerConfig::load_for_service("customerhub")?;
//!     let dispatcher = BulkDispatcher::from_config(&config);
//!
//!     let result = dispatcher
//!         .send_bulk(&["a@x.com", "b@x.com"], "Sale", "50% off", None)
//!         .await;
//!
//!     match result.status() {
//!         DeliveryStatus::Sent => println!("sent to everyone"),
//!         DeliveryStatus::PartiallySent { failed } => println!("{failed} failed"),
//!         DeliveryStatus::Failed => println!("nothing was delivered"),
//!         DeliveryStatus::Simulated => println!("email not configured; simulated"),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod customers;
pub mod email;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod observability;
pub mod state;
pub mod testing;

pub mod prelude {
    //! Convenience re-exports for common types and traits

    pub use crate::config::{DispatchSettings, MailerConfig, TransportConfig};
    pub use crate::customers::{Customer, CustomerStore, NewCustomer, SqliteCustomerStore};
    pub use crate::email::{
        resolve, send, verify, BulkDispatcher, BulkFailure, BulkRequest, BulkResult,
        CancellationToken, DeliveryStatus, EmailError, MailTransport, ResolvedTransport,
        SendOutcome, SendRequest, SimulationReason, SmtpTransportFactory,
    };
    pub use crate::error::MailerError;
    pub use crate::observability;
    pub use crate::state::MailerState;
}
