//! SMTP transport
//!
//! Uses the `lettre` crate to submit messages to an SMTP relay.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::TransportConfig;
use crate::email::{EmailError, MailTransport, OutboundMessage, TransportFactory};

/// SMTP mail transport
///
/// Holds one pooled `lettre` client for the lifetime of a bulk call.
///
/// # Examples
///
/// ```rust,no_run
/// use customerhub_mail::config::TransportConfig;
/// use customerhub_mail::email::{MailTransport, OutboundMessage, SmtpTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = SmtpTransport::new(&TransportConfig::from_env()?)?;
///
/// transport
///     .submit(&OutboundMessage {
///         from: "noreply@customerhub.com".to_string(),
///         to: "user@example.com".to_string(),
///         subject: "Hello!".to_string(),
///         text: "Hello, World!".to_string(),
///         html: None,
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Build a transport from configuration
    ///
    /// `secure = true` connects with implicit TLS; otherwise the connection
    /// is upgraded with STARTTLS when the server offers it.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::ConfigError` if credentials are missing and
    /// `EmailError::SmtpError` if the relay cannot be set up
    pub fn new(config: &TransportConfig) -> Result<Self, EmailError> {
        let (user, password) = config
            .credentials()
            .ok_or_else(|| EmailError::config("SMTP credentials are not configured"))?;
        let credentials = Credentials::new(user.to_string(), password.to_string());

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| EmailError::smtp(format!("SMTP relay error: {e}")))?
        } else {
            let tls_params = TlsParameters::new(config.host.clone())
                .map_err(|e| EmailError::smtp(format!("SMTP TLS params error: {e}")))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .tls(Tls::Opportunistic(tls_params))
        };

        let mut builder = builder.port(config.port).credentials(credentials);
        // Unset keeps lettre's default timeout
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(Some(timeout));
        }

        let inner = builder.build();

        Ok(Self { inner })
    }

    /// Build a lettre `Message` from an outbound message
    fn build_message(message: &OutboundMessage) -> Result<Message, EmailError> {
        let from: Mailbox = message
            .from
            .parse()
            .map_err(|_| EmailError::InvalidAddress(message.from.clone()))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(message.to.clone()))?;

        let builder = Message::builder()
            .from(from)
            .to(to)
            .subject(&message.subject);

        let built = if let Some(html) = &message.html {
            builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html.clone()),
                    ),
            )
        } else {
            builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(message.text.clone())
        };

        built.map_err(|e| EmailError::smtp(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn submit(&self, message: &OutboundMessage) -> Result<(), EmailError> {
        let message = Self::build_message(message)?;

        let response = self
            .inner
            .send(message)
            .await
            .map_err(|e| EmailError::smtp(e.to_string()))?;

        tracing::debug!(
            code = %response.code(),
            "SMTP server accepted message"
        );

        Ok(())
    }

    async fn verify(&self) -> Result<bool, EmailError> {
        self.inner
            .test_connection()
            .await
            .map_err(|e| EmailError::smtp(e.to_string()))
    }
}

/// Factory producing [`SmtpTransport`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpTransportFactory;

impl TransportFactory for SmtpTransportFactory {
    fn build(&self, config: &TransportConfig) -> Result<Arc<dyn MailTransport>, EmailError> {
        Ok(Arc::new(SmtpTransport::new(config)?))
    }
}
