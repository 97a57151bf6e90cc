//! Application state shared by HTTP handlers

use std::sync::Arc;

use crate::config::MailerConfig;
use crate::customers::{CustomerStore, SqliteCustomerStore, StoreError};
use crate::email::BulkDispatcher;

/// State for the customerhub-mail router
///
/// # Example
///
/// ```rust,no_run
/// use customerhub_mail::{config::MailerConfig, state::MailerState};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = MailerConfig::load_for_service("customerhub")?;
/// let state = MailerState::connect(&config).await?;
///
/// let app = customerhub_mail::handlers::router(state);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MailerState {
    dispatcher: Arc<BulkDispatcher>,
    customers: Arc<dyn CustomerStore>,
}

impl MailerState {
    /// Create state from its parts
    #[must_use]
    pub fn new(dispatcher: BulkDispatcher, customers: Arc<dyn CustomerStore>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            customers,
        }
    }

    /// Build state from configuration, connecting to the customer database
    pub async fn connect(config: &MailerConfig) -> Result<Self, StoreError> {
        let customers = SqliteCustomerStore::connect(&config.database.url).await?;
        Ok(Self::new(
            BulkDispatcher::from_config(config),
            Arc::new(customers),
        ))
    }

    /// Bulk dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &BulkDispatcher {
        &self.dispatcher
    }

    /// Customer store
    #[must_use]
    pub fn customers(&self) -> &dyn CustomerStore {
        self.customers.as_ref()
    }
}
