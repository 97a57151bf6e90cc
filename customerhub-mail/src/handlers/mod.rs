//! HTTP handlers
//!
//! ```rust,no_run
//! use customerhub_mail::{config::MailerConfig, handlers, state::MailerState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let state = MailerState::connect(&MailerConfig::default()).await?;
//! let app = handlers::router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod bulk_message;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::MailerState;

pub use bulk_message::{
    mail_status, send_bulk_message, BulkMessageForm, BulkMessageResponse, MailStatusResponse,
};

/// Build the router for the bulk message endpoints
pub fn router(state: MailerState) -> Router {
    Router::new()
        .route("/customers/bulk-message", post(send_bulk_message))
        .route("/mail/status", get(mail_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
