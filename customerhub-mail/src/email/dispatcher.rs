//! Bulk dispatch
//!
//! A bulk call resolves the transport exactly once, then sends to each
//! recipient in input order, one at a time, sleeping a fixed pacing interval
//! after every send. Sends are never fanned out concurrently: the pacing is
//! what keeps a batch under provider rate limits.
//!
//! ```text
//! Start → ResolveTransport ─┬─ Absent ─→ SimulatedShortCircuit → Done
//!                           └─ Live ───→ Send(i) → Pace → (more ? Send(i+1) : Done)
//! ```
//!
//! There is no dispatcher-level timeout; a hung send stalls the rest of the
//! batch until the transport's own timeout fires.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{
    resolve, send, BulkRequest, BulkResult, CancellationToken, ResolvedTransport, SendRequest,
    SmtpTransportFactory, TransportFactory,
};
use crate::config::{DispatchSettings, MailerConfig, TransportConfig};

/// Sends one subject/body pair to an ordered list of recipients
///
/// Holds only immutable configuration, so one dispatcher can serve
/// concurrent bulk calls; each call resolves its own transport.
///
/// # Examples
///
/// ```rust
/// use customerhub_mail::config::TransportConfig;
/// use customerhub_mail::email::BulkDispatcher;
///
/// # async fn example() {
/// // No credentials configured: the batch is simulated
/// let dispatcher = BulkDispatcher::new(TransportConfig::default());
/// let result = dispatcher
///     .send_bulk(&["a@x.com", "b@x.com"], "Sale", "50% off", None)
///     .await;
///
/// assert!(result.simulated);
/// assert_eq!(result.sent_count, 2);
/// # }
/// ```
#[derive(Clone)]
pub struct BulkDispatcher {
    config: TransportConfig,
    factory: Arc<dyn TransportFactory>,
    pacing_interval: Duration,
}

impl BulkDispatcher {
    /// Create a dispatcher sending over SMTP with the default pacing interval
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            factory: Arc::new(SmtpTransportFactory),
            pacing_interval: DispatchSettings::default().pacing_interval(),
        }
    }

    /// Create a dispatcher from the application configuration
    #[must_use]
    pub fn from_config(config: &MailerConfig) -> Self {
        Self::new(config.transport.clone()).with_pacing_interval(config.dispatch.pacing_interval())
    }

    /// Replace the transport factory
    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Replace the delay inserted after each send
    #[must_use]
    pub const fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }

    /// Transport configuration used for resolution
    #[must_use]
    pub const fn transport_config(&self) -> &TransportConfig {
        &self.config
    }

    /// Delay inserted after each send
    #[must_use]
    pub const fn pacing_interval(&self) -> Duration {
        self.pacing_interval
    }

    /// Resolve the transport this dispatcher would use right now
    #[must_use]
    pub fn resolve(&self) -> ResolvedTransport {
        resolve(&self.config, self.factory.as_ref())
    }

    /// Dispatch a bulk request
    pub async fn dispatch(&self, request: &BulkRequest) -> BulkResult {
        self.send_bulk(
            &request.recipients,
            &request.subject,
            &request.text_body,
            request.html_body.as_deref(),
        )
        .await
    }

    /// Send to every recipient, tolerating per-recipient failure
    pub async fn send_bulk<S: AsRef<str> + Sync>(
        &self,
        recipients: &[S],
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> BulkResult {
        self.send_bulk_with_cancellation(
            recipients,
            subject,
            text_body,
            html_body,
            &CancellationToken::new(),
        )
        .await
    }

    /// Send to every recipient, stopping early if `cancellation` fires
    ///
    /// The token is checked between recipients only. Recipients after the
    /// cancellation point are not attempted and not counted.
    pub async fn send_bulk_with_cancellation<S: AsRef<str> + Sync>(
        &self,
        recipients: &[S],
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
        cancellation: &CancellationToken,
    ) -> BulkResult {
        let transport = self.resolve();

        if let ResolvedTransport::Absent(reason) = &transport {
            info!(
                recipients = recipients.len(),
                subject = %subject,
                reason = %reason,
                "[SIMULATED] Bulk email would be sent"
            );
            let result = BulkResult::simulated(recipients.len(), *reason);
            log_summary(&result);
            return result;
        }

        let mut result = BulkResult::live();

        for (index, recipient) in recipients.iter().enumerate() {
            if cancellation.is_cancelled() {
                warn!(
                    attempted = result.total_attempted,
                    skipped = recipients.len() - index,
                    "Bulk email cancelled"
                );
                result.cancelled = true;
                break;
            }

            let request = SendRequest {
                recipient: recipient.as_ref().to_string(),
                subject: subject.to_string(),
                text_body: text_body.to_string(),
                html_body: html_body.map(ToString::to_string),
                from_address: None,
            };

            let outcome = send(&transport, &request, self.config.default_sender()).await;
            result.record(outcome);

            self.pace(cancellation).await;
        }

        log_summary(&result);
        result
    }

    async fn pace(&self, cancellation: &CancellationToken) {
        if self.pacing_interval.is_zero() {
            return;
        }

        tokio::select! {
            () = tokio::time::sleep(self.pacing_interval) => {}
            () = cancellation.cancelled() => {}
        }
    }
}

fn log_summary(result: &BulkResult) {
    if result.success() {
        info!(
            simulated = result.simulated,
            sent = result.sent_count,
            failed = result.failed_count,
            errors = ?result.failures,
            "Bulk email finished"
        );
    } else {
        warn!(
            simulated = result.simulated,
            sent = result.sent_count,
            failed = result.failed_count,
            errors = ?result.failures,
            "Bulk email finished with failures"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::transport::{MockMailTransport, MockTransportFactory};
    use crate::email::{BulkFailure, EmailError, MailTransport, SimulationReason};

    fn configured() -> TransportConfig {
        TransportConfig {
            user: Some("user@example.com".to_string()),
            password: Some("password123".to_string()),
            ..TransportConfig::default()
        }
    }

    fn factory_for(transport: MockMailTransport) -> Arc<MockTransportFactory> {
        let transport: Arc<dyn MailTransport> = Arc::new(transport);
        let mut factory = MockTransportFactory::new();
        factory
            .expect_build()
            .times(1)
            .returning(move |_| Ok(Arc::clone(&transport)));
        Arc::new(factory)
    }

    #[tokio::test]
    async fn test_no_transport_simulates_whole_batch() {
        let dispatcher = BulkDispatcher::new(TransportConfig::default());

        let result = dispatcher
            .send_bulk(&["a@x.com", "b@x.com"], "Sale", "50% off", None)
            .await;

        assert!(result.simulated);
        assert_eq!(result.sent_count, 2);
        assert_eq!(result.failed_count, 0);
        assert_eq!(result.total_attempted, 2);
        assert_eq!(
            result.simulation_reason,
            Some(SimulationReason::MissingCredentials)
        );
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_factory_failure_simulates_whole_batch() {
        let mut factory = MockTransportFactory::new();
        factory
            .expect_build()
            .times(1)
            .returning(|_| Err(EmailError::smtp("TLS init failed")));

        let dispatcher = BulkDispatcher::new(configured()).with_factory(Arc::new(factory));
        let result = dispatcher
            .send_bulk(&["a@x.com", "not an address"], "Sale", "50% off", None)
            .await;

        assert!(result.simulated);
        assert_eq!(result.failed_count, 0);
        assert_eq!(
            result.simulation_reason,
            Some(SimulationReason::TransportUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_rejection_scenario() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_submit()
            .times(1)
            .returning(|_| Err(EmailError::smtp("rejected")));

        let dispatcher = BulkDispatcher::new(configured()).with_factory(factory_for(transport));
        let result = dispatcher.send_bulk(&["a@x.com"], "Sale", "50% off", None).await;

        assert!(!result.simulated);
        assert_eq!(result.sent_count, 0);
        assert_eq!(result.failed_count, 1);
        assert_eq!(
            result.failures,
            vec![BulkFailure {
                recipient: "a@x.com".to_string(),
                error_message: "rejected".to_string(),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_middle_failure_does_not_stop_batch() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_submit()
            .times(3)
            .returning(|message| {
                if message.to == "2@x.com" {
                    Err(EmailError::smtp("mailbox unavailable"))
                } else {
                    Ok(())
                }
            });

        let dispatcher = BulkDispatcher::new(configured()).with_factory(factory_for(transport));
        let result = dispatcher
            .send_bulk(&["1@x.com", "2@x.com", "3@x.com"], "Sale", "50% off", None)
            .await;

        assert_eq!(result.sent_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.failures[0].recipient, "2@x.com");
        assert!(!result.success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_follows_every_send() {
        let mut transport = MockMailTransport::new();
        transport.expect_submit().times(3).returning(|message| {
            if message.to == "b@x.com" {
                Err(EmailError::smtp("rejected"))
            } else {
                Ok(())
            }
        });

        let dispatcher = BulkDispatcher::new(configured())
            .with_factory(factory_for(transport))
            .with_pacing_interval(Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        dispatcher
            .send_bulk(&["a@x.com", "b@x.com", "c@x.com"], "Sale", "50% off", None)
            .await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_empty_batch_with_transport() {
        let mut transport = MockMailTransport::new();
        transport.expect_submit().times(0);

        let dispatcher = BulkDispatcher::new(configured()).with_factory(factory_for(transport));
        let result = dispatcher
            .send_bulk::<&str>(&[], "Sale", "50% off", None)
            .await;

        assert_eq!(result.total_attempted, 0);
        assert_eq!(result.sent_count, 0);
        assert_eq!(result.failed_count, 0);
        assert!(!result.simulated);
    }

    #[tokio::test]
    async fn test_empty_batch_without_transport() {
        let dispatcher = BulkDispatcher::new(TransportConfig::default());
        let result = dispatcher
            .send_bulk::<String>(&[], "Sale", "50% off", None)
            .await;

        assert_eq!(result.total_attempted, 0);
        assert_eq!(result.sent_count, 0);
        assert_eq!(result.failed_count, 0);
        assert!(result.simulated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_between_recipients() {
        let token = CancellationToken::new();
        let trigger = token.clone();

        let mut transport = MockMailTransport::new();
        transport.expect_submit().times(1).returning(move |_| {
            trigger.cancel();
            Ok(())
        });

        let dispatcher = BulkDispatcher::new(configured()).with_factory(factory_for(transport));
        let result = dispatcher
            .send_bulk_with_cancellation(
                &["a@x.com", "b@x.com", "c@x.com"],
                "Sale",
                "50% off",
                None,
                &token,
            )
            .await;

        assert!(result.cancelled);
        assert_eq!(result.total_attempted, 1);
        assert_eq!(result.sent_count, 1);
        assert_eq!(result.failed_count, 0);
    }

    #[tokio::test]
    async fn test_dispatch_forwards_html_body() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_submit()
            .withf(|message| message.html.as_deref() == Some("<b>50% off</b>"))
            .times(1)
            .returning(|_| Ok(()));

        let dispatcher = BulkDispatcher::new(configured())
            .with_factory(factory_for(transport))
            .with_pacing_interval(Duration::ZERO);

        let request = BulkRequest::new(vec!["a@x.com".to_string()], "Sale", "50% off")
            .html("<b>50% off</b>");
        let result = dispatcher.dispatch(&request).await;
        assert_eq!(result.sent_count, 1);
    }

    #[test]
    fn test_from_config_uses_dispatch_settings() {
        let mut config = MailerConfig::default();
        config.dispatch.pacing_interval_ms = 250;

        let dispatcher = BulkDispatcher::from_config(&config);
        assert_eq!(dispatcher.pacing_interval(), Duration::from_millis(250));
        assert_eq!(dispatcher.transport_config(), &config.transport);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_simulated_batch_logs_summary() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dispatcher = BulkDispatcher::new(TransportConfig::default());
        dispatcher
            .send_bulk(&["a@x.com", "b@x.com"], "Sale", "50% off", None)
            .await;

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("Bulk email finished"), "{output}");
        assert!(output.contains("simulated=true"), "{output}");
        assert!(output.contains("sent=2"), "{output}");
        assert!(output.contains("failed=0"), "{output}");
    }
}
