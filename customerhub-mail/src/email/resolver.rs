//! Transport resolution
//!
//! Decides, from a [`TransportConfig`], whether a live transport exists.
//! Resolution never fails: anything short of a usable transport yields
//! [`ResolvedTransport::Absent`], which routes sends through simulated mode.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{MailTransport, TransportFactory};
use crate::config::TransportConfig;

/// Why no live transport is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationReason {
    /// `user` or `password` is not configured
    MissingCredentials,
    /// Credentials were present but the transport could not be built
    TransportUnavailable,
}

impl fmt::Display for SimulationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials => f.write_str("SMTP credentials not configured"),
            Self::TransportUnavailable => f.write_str("SMTP transport could not be created"),
        }
    }
}

/// Outcome of transport resolution
#[derive(Clone)]
pub enum ResolvedTransport {
    /// A transport ready to submit messages
    Live(Arc<dyn MailTransport>),
    /// No transport; every send is simulated
    Absent(SimulationReason),
}

impl ResolvedTransport {
    /// Whether sends will be simulated
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }

    /// Reason for simulated mode, if absent
    #[must_use]
    pub const fn simulation_reason(&self) -> Option<SimulationReason> {
        match self {
            Self::Live(_) => None,
            Self::Absent(reason) => Some(*reason),
        }
    }
}

impl fmt::Debug for ResolvedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(_) => f.write_str("Live"),
            Self::Absent(reason) => f.debug_tuple("Absent").field(reason).finish(),
        }
    }
}

/// Resolve a transport from configuration
///
/// Missing credentials and factory errors both yield
/// [`ResolvedTransport::Absent`] and log a warning.
///
/// # Examples
///
/// ```rust
/// use customerhub_mail::config::TransportConfig;
/// use customerhub_mail::email::{resolve, SimulationReason, SmtpTransportFactory};
///
/// let resolved = resolve(&TransportConfig::default(), &SmtpTransportFactory);
/// assert_eq!(resolved.simulation_reason(), Some(SimulationReason::MissingCredentials));
/// ```
pub fn resolve(config: &TransportConfig, factory: &dyn TransportFactory) -> ResolvedTransport {
    if config.credentials().is_none() {
        warn!("SMTP credentials not configured; emails will be simulated");
        return ResolvedTransport::Absent(SimulationReason::MissingCredentials);
    }

    match factory.build(config) {
        Ok(transport) => ResolvedTransport::Live(transport),
        Err(error) => {
            warn!(
                host = %config.host,
                port = config.port,
                error = %error,
                "Failed to create SMTP transport; emails will be simulated"
            );
            ResolvedTransport::Absent(SimulationReason::TransportUnavailable)
        }
    }
}

/// Perform a live handshake against a resolved transport
///
/// Diagnostic only; sending never requires it. Returns `false` without any
/// I/O when the transport is absent.
pub async fn verify(transport: &ResolvedTransport) -> bool {
    let ResolvedTransport::Live(transport) = transport else {
        return false;
    };

    match transport.verify().await {
        Ok(true) => {
            info!("SMTP server is ready to send emails");
            true
        }
        Ok(false) => {
            warn!("SMTP server did not accept the connection test");
            false
        }
        Err(error) => {
            warn!(error = %error, "SMTP connection failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::transport::{MockMailTransport, MockTransportFactory};
    use crate::email::EmailError;

    fn configured() -> TransportConfig {
        TransportConfig {
            user: Some("user@example.com".to_string()),
            password: Some("password123".to_string()),
            ..TransportConfig::default()
        }
    }

    #[test]
    fn test_missing_credentials_skip_factory() {
        let mut factory = MockTransportFactory::new();
        factory.expect_build().times(0);

        let resolved = resolve(&TransportConfig::default(), &factory);
        assert_eq!(
            resolved.simulation_reason(),
            Some(SimulationReason::MissingCredentials)
        );
    }

    #[test]
    fn test_either_missing_credential_forces_absent() {
        let mut factory = MockTransportFactory::new();
        factory.expect_build().times(0);

        let no_user = TransportConfig {
            user: None,
            ..configured()
        };
        let no_password = TransportConfig {
            password: None,
            ..configured()
        };

        assert!(resolve(&no_user, &factory).is_absent());
        assert!(resolve(&no_password, &factory).is_absent());
    }

    #[test]
    fn test_factory_error_downgrades_to_absent() {
        let mut factory = MockTransportFactory::new();
        factory
            .expect_build()
            .times(1)
            .returning(|_| Err(EmailError::smtp("bad relay")));

        let resolved = resolve(&configured(), &factory);
        assert_eq!(
            resolved.simulation_reason(),
            Some(SimulationReason::TransportUnavailable)
        );
    }

    #[test]
    fn test_credentials_present_yield_live() {
        let mut factory = MockTransportFactory::new();
        factory.expect_build().times(1).returning(|config| {
            assert_eq!(config.port, 587);
            Ok(Arc::new(MockMailTransport::new()) as Arc<dyn MailTransport>)
        });

        let resolved = resolve(&configured(), &factory);
        assert!(!resolved.is_absent());
        assert_eq!(format!("{resolved:?}"), "Live");
    }

    #[tokio::test]
    async fn test_verify_absent_is_false() {
        let resolved = ResolvedTransport::Absent(SimulationReason::MissingCredentials);
        assert!(!verify(&resolved).await);
    }

    #[tokio::test]
    async fn test_verify_reports_handshake() {
        let mut healthy = MockMailTransport::new();
        healthy.expect_verify().times(1).returning(|| Ok(true));
        assert!(verify(&ResolvedTransport::Live(Arc::new(healthy))).await);

        let mut unreachable = MockMailTransport::new();
        unreachable
            .expect_verify()
            .times(1)
            .returning(|| Err(EmailError::smtp("connection refused")));
        assert!(!verify(&ResolvedTransport::Live(Arc::new(unreachable))).await);
    }
}
