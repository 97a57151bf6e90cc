//! Configuration management for customerhub-mail
//!
//! Two layers of configuration exist:
//!
//! - [`TransportConfig`] describes the outbound mail server. It is a plain
//!   value handed to the transport resolver on every bulk call, so resolution
//!   never reads ambient process state. [`TransportConfig::from_env`] builds
//!   one from the conventional `SMTP_*` variables.
//! - [`MailerConfig`] is the full application configuration, loaded from
//!   multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `CUSTOMERHUB_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/customerhub/{service}/config.toml` (user config, XDG)
//! 4. `/etc/customerhub/{service}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [transport]
//! host = "smtp.example.com"
//! port = 465
//! secure = true
//! user = "mailer@example.com"
//! password = "app-password"
//! from_email = "hello@example.com"
//!
//! [dispatch]
//! pacing_interval_ms = 250
//!
//! [database]
//! url = "sqlite://customers.db"
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::email::EmailError;

/// Sender used when neither the request nor the configuration names one
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@customerhub.com";

/// Outbound mail server configuration
///
/// Missing `user` or `password` is not an error: it routes every send
/// through simulated mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// SMTP server hostname
    pub host: String,

    /// SMTP server port (587 for STARTTLS, 465 for implicit TLS)
    pub port: u16,

    /// Use implicit TLS instead of STARTTLS
    pub secure: bool,

    /// SMTP username
    pub user: Option<String>,

    /// SMTP password
    pub password: Option<String>,

    /// Default sender address
    pub from_email: Option<String>,

    /// Connection and command timeout of the SMTP client, in seconds
    pub timeout_secs: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            secure: false,
            user: None,
            password: None,
            from_email: None,
            timeout_secs: None,
        }
    }
}

impl TransportConfig {
    /// Create transport configuration from environment variables
    ///
    /// Reads the following variables, all optional:
    /// - `SMTP_HOST`: SMTP server hostname (default: `smtp.gmail.com`)
    /// - `SMTP_PORT`: SMTP server port (default: 587)
    /// - `SMTP_SECURE`: `true` for implicit TLS (default: false)
    /// - `SMTP_USER`: SMTP username
    /// - `SMTP_PASSWORD`: SMTP password
    /// - `SMTP_FROM_EMAIL`: default sender address
    /// - `SMTP_TIMEOUT_SECS`: SMTP client timeout
    ///
    /// # Errors
    ///
    /// Returns `EmailError::ConfigError` if `SMTP_PORT` or `SMTP_TIMEOUT_SECS`
    /// is set but not a number
    pub fn from_env() -> Result<Self, EmailError> {
        let defaults = Self::default();

        let host = std::env::var("SMTP_HOST").unwrap_or(defaults.host);

        let port = match std::env::var("SMTP_PORT") {
            Ok(port) => port
                .trim()
                .parse()
                .map_err(|_| EmailError::config("SMTP_PORT must be a valid port number"))?,
            Err(_) => defaults.port,
        };

        let secure = std::env::var("SMTP_SECURE").is_ok_and(|value| value == "true");

        let timeout_secs = match std::env::var("SMTP_TIMEOUT_SECS") {
            Ok(secs) => Some(
                secs.trim()
                    .parse()
                    .map_err(|_| EmailError::config("SMTP_TIMEOUT_SECS must be a number"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            host,
            port,
            secure,
            user: std::env::var("SMTP_USER").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            from_email: std::env::var("SMTP_FROM_EMAIL").ok(),
            timeout_secs,
        })
    }

    /// Username and password, if both are present and non-blank
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let user = self.user.as_deref().filter(|u| !u.trim().is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some((user, password))
    }

    /// Sender address used when a request does not name one
    #[must_use]
    pub fn default_sender(&self) -> &str {
        self.from_email
            .as_deref()
            .filter(|from| !from.trim().is_empty())
            .unwrap_or(DEFAULT_FROM_ADDRESS)
    }

    /// SMTP client timeout, if configured
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Copy of this configuration with the password masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// Bulk dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Delay inserted after each send within a batch, in milliseconds
    pub pacing_interval_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            pacing_interval_ms: 100,
        }
    }
}

impl DispatchSettings {
    /// Pacing interval as a [`Duration`]
    #[must_use]
    pub const fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }
}

/// Customer database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLx connection URL
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://customers.db?mode=rwc".to_string(),
        }
    }
}

/// Complete customerhub-mail configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MailerConfig {
    /// Outbound mail server
    #[serde(default)]
    pub transport: TransportConfig,

    /// Bulk dispatch settings
    #[serde(default)]
    pub dispatch: DispatchSettings,

    /// Customer database settings
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl MailerConfig {
    /// Load configuration for a specific service
    ///
    /// Searches for configuration with precedence:
    /// 1. Environment variables (`CUSTOMERHUB_*`)
    /// 2. `./config.toml`
    /// 3. `~/.config/customerhub/{service_name}/config.toml`
    /// 4. `/etc/customerhub/{service_name}/config.toml`
    /// 5. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - A configuration file cannot be read or parsed
    /// - Configuration values fail type conversion
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(&toml::to_string(&Self::default())?));

        let system_config = PathBuf::from("/etc/customerhub")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        figment = figment.merge(Env::prefixed("CUSTOMERHUB_").split("__").lowercase(true));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML or values fail
    /// type conversion
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CUSTOMERHUB_").split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("customerhub")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn clear_smtp_env() {
        for var in [
            "SMTP_HOST",
            "SMTP_PORT",
            "SMTP_SECURE",
            "SMTP_USER",
            "SMTP_PASSWORD",
            "SMTP_FROM_EMAIL",
            "SMTP_TIMEOUT_SECS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_transport_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.host, "smtp.gmail.com");
        assert_eq!(config.port, 587);
        assert!(!config.secure);
        assert!(config.credentials().is_none());
        assert_eq!(config.default_sender(), DEFAULT_FROM_ADDRESS);
    }

    #[test]
    fn test_credentials_require_both_halves() {
        let mut config = TransportConfig {
            user: Some("user@example.com".to_string()),
            ..TransportConfig::default()
        };
        assert!(config.credentials().is_none());

        config.user = None;
        config.password = Some("secret".to_string());
        assert!(config.credentials().is_none());

        config.user = Some("user@example.com".to_string());
        assert_eq!(config.credentials(), Some(("user@example.com", "secret")));
    }

    #[test]
    fn test_blank_user_counts_as_missing() {
        let config = TransportConfig {
            user: Some("   ".to_string()),
            password: Some("secret".to_string()),
            ..TransportConfig::default()
        };
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_default_sender_prefers_configured_address() {
        let config = TransportConfig {
            from_email: Some("sales@example.com".to_string()),
            ..TransportConfig::default()
        };
        assert_eq!(config.default_sender(), "sales@example.com");
    }

    #[test]
    fn test_redacted_masks_password() {
        let config = TransportConfig {
            user: Some("user".to_string()),
            password: Some("hunter2".to_string()),
            ..TransportConfig::default()
        };
        let redacted = config.redacted();
        assert_eq!(redacted.user.as_deref(), Some("user"));
        assert_eq!(redacted.password.as_deref(), Some("********"));
    }

    // Every SMTP_* assertion lives in one test so parallel tests never race
    // on the process environment.
    #[test]
    fn test_transport_from_env() {
        clear_smtp_env();

        let config = TransportConfig::from_env().unwrap();
        assert_eq!(config, TransportConfig::default());

        std::env::set_var("SMTP_HOST", "smtp.example.com");
        std::env::set_var("SMTP_PORT", "465");
        std::env::set_var("SMTP_SECURE", "true");
        std::env::set_var("SMTP_USER", "user@example.com");
        std::env::set_var("SMTP_PASSWORD", "password123");
        std::env::set_var("SMTP_FROM_EMAIL", "hello@example.com");
        std::env::set_var("SMTP_TIMEOUT_SECS", "30");

        let config = TransportConfig::from_env().unwrap();
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 465);
        assert!(config.secure);
        assert_eq!(config.credentials(), Some(("user@example.com", "password123")));
        assert_eq!(config.default_sender(), "hello@example.com");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));

        std::env::set_var("SMTP_PORT", "not-a-port");
        assert!(matches!(
            TransportConfig::from_env(),
            Err(EmailError::ConfigError(_))
        ));

        clear_smtp_env();
    }

    #[test]
    fn test_dispatch_defaults() {
        let dispatch = DispatchSettings::default();
        assert_eq!(dispatch.pacing_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_load_from_nonexistent_file() {
        let config = MailerConfig::load_from("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.transport.port, 587);
        assert_eq!(config.dispatch.pacing_interval_ms, 100);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[transport]
host = "mail.example.com"
port = 2525
user = "mailer"
password = "secret"

[dispatch]
pacing_interval_ms = 250
"#,
        )
        .unwrap();

        let config = MailerConfig::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.transport.host, "mail.example.com");
        assert_eq!(config.transport.port, 2525);
        assert_eq!(config.transport.credentials(), Some(("mailer", "secret")));
        assert_eq!(config.dispatch.pacing_interval_ms, 250);
        assert!(config.database.url.starts_with("sqlite://"));
    }

    #[test]
    fn test_recommended_path() {
        let path = MailerConfig::recommended_path("test-app");
        let path = path.to_str().unwrap();
        assert!(path.ends_with("config.toml"));
        assert!(path.contains("test-app") || path == "./config.toml");
    }
}
