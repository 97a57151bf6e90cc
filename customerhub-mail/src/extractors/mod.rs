//! Validated form extractor
//!
//! Deserializes `application/x-www-form-urlencoded` bodies and runs the
//! `validator` rules before the handler sees the data.
//!
//! # Example
//!
//! ```rust,no_run
//! use customerhub_mail::extractors::ValidatedForm;
//! use serde::Deserialize;
//! use validator::Validate;
//!
//! #[derive(Debug, Deserialize, Validate)]
//! struct ContactForm {
//!     #[validate(email)]
//!     email: String,
//! }
//!
//! async fn contact(ValidatedForm(form): ValidatedForm<ContactForm>) -> String {
//!     format!("Contacting {}", form.email)
//! }
//! ```

use axum::{
    extract::{Form, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::de::DeserializeOwned;
use std::fmt;
use validator::Validate;

/// Validated form extractor
///
/// Rejects with 400 when the body cannot be parsed and 422 with a JSON
/// error map when validation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedForm<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync + 'static,
{
    type Rejection = ValidationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(data) = Form::<T>::from_request(req, state)
            .await
            .map_err(|err| ValidationError::FormRejection(err.body_text()))?;

        data.validate().map_err(ValidationError::Validation)?;

        Ok(Self(data))
    }
}

/// Validation error response
#[derive(Debug)]
pub enum ValidationError {
    /// Form parsing failed (malformed data)
    FormRejection(String),
    /// Validation failed (data parsed but invalid)
    Validation(validator::ValidationErrors),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormRejection(msg) => write!(f, "Form parsing error: {msg}"),
            Self::Validation(errors) => {
                write!(f, "Validation failed: {}", format_validation_errors(errors))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        match self {
            Self::FormRejection(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid form data: {msg}")).into_response()
            }
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(validation_errors_json(&errors)),
            )
                .into_response(),
        }
    }
}

/// Format validation errors as `; `-separated messages
#[must_use]
pub fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error.message.as_ref().map_or_else(
                || format!("{field}: {}", error.code),
                ToString::to_string,
            );
            messages.push(message);
        }
    }

    messages.sort();
    messages.join("; ")
}

/// Validation errors as `{"errors": {field: [messages]}}`
#[must_use]
pub fn validation_errors_json(errors: &validator::ValidationErrors) -> serde_json::Value {
    let mut error_map = serde_json::Map::new();

    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|error| {
                error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string)
            })
            .collect();

        error_map.insert(field.to_string(), serde_json::json!(messages));
    }

    serde_json::json!({ "errors": error_map })
}
