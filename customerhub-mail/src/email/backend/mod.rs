//! Transport implementations
//!
//! - **SMTP**: submit messages to an SMTP relay (production)
//!
//! Simulated delivery has no backend of its own: it is the absence of a
//! transport, handled by [`crate::email::send`].

pub mod smtp;
