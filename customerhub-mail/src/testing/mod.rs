//! Testing utilities for the email system
//!
//! - [`RecordingTransport`] captures submitted messages in memory and can be
//!   scripted to reject chosen recipients
//! - [`StaticTransportFactory`] hands out a fixed transport (or a fixed build
//!   error) and counts how often it was asked
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use customerhub_mail::config::TransportConfig;
//! use customerhub_mail::email::BulkDispatcher;
//! use customerhub_mail::testing::{RecordingTransport, StaticTransportFactory};
//!
//! # async fn example() {
//! let transport = RecordingTransport::new().failing_for("b@x.com", "rejected");
//! let dispatcher = BulkDispatcher::new(TransportConfig::default())
//!     .with_factory(Arc::new(StaticTransportFactory::new(transport.clone())));
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::TransportConfig;
use crate::email::{EmailError, MailTransport, OutboundMessage, TransportFactory};

/// In-memory transport recording every accepted message
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    rejections: Arc<HashMap<String, String>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    reachable: bool,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            sent: Arc::default(),
            attempts: Arc::default(),
            rejections: Arc::default(),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
            reachable: true,
        }
    }
}

impl RecordingTransport {
    /// Create a transport that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject messages to `recipient` with `error`
    #[must_use]
    pub fn failing_for(mut self, recipient: &str, error: &str) -> Self {
        Arc::make_mut(&mut self.rejections).insert(recipient.to_string(), error.to_string());
        self
    }

    /// Make the handshake fail
    #[must_use]
    pub const fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Number of messages accepted
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// All accepted messages, in submission order
    #[must_use]
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    /// Every recipient a submission was attempted for, in order
    #[must_use]
    pub fn attempted_recipients(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }

    /// Whether a message to `address` was accepted
    #[must_use]
    pub fn was_sent_to(&self, address: &str) -> bool {
        self.sent.lock().iter().any(|message| message.to == address)
    }

    /// Last accepted message
    #[must_use]
    pub fn last_sent(&self) -> Option<OutboundMessage> {
        self.sent.lock().last().cloned()
    }

    /// Highest number of submissions observed running at once
    #[must_use]
    pub fn max_concurrent_submissions(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.sent.lock().clear();
        self.attempts.lock().clear();
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn submit(&self, message: &OutboundMessage) -> Result<(), EmailError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.attempts.lock().push(message.to.clone());

        // Yield so overlapping submissions would be observable
        tokio::task::yield_now().await;

        let result = match self.rejections.get(&message.to) {
            Some(error) => Err(EmailError::smtp(error.clone())),
            None => {
                self.sent.lock().push(message.clone());
                Ok(())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn verify(&self) -> Result<bool, EmailError> {
        if self.reachable {
            Ok(true)
        } else {
            Err(EmailError::smtp("connection refused"))
        }
    }
}

/// Factory returning a fixed transport or a fixed build error
#[derive(Clone)]
pub struct StaticTransportFactory {
    transport: Option<Arc<dyn MailTransport>>,
    error: String,
    builds: Arc<AtomicUsize>,
}

impl StaticTransportFactory {
    /// Factory that always returns `transport`
    #[must_use]
    pub fn new(transport: impl MailTransport + 'static) -> Self {
        Self {
            transport: Some(Arc::new(transport)),
            error: String::new(),
            builds: Arc::default(),
        }
    }

    /// Factory whose every build fails with `error`
    #[must_use]
    pub fn failing(error: &str) -> Self {
        Self {
            transport: None,
            error: error.to_string(),
            builds: Arc::default(),
        }
    }

    /// Number of times `build` was called
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl TransportFactory for StaticTransportFactory {
    fn build(&self, _config: &TransportConfig) -> Result<Arc<dyn MailTransport>, EmailError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.transport
            .clone()
            .ok_or_else(|| EmailError::smtp(self.error.clone()))
    }
}
