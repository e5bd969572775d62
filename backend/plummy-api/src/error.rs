use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::utils::camel_case;

pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// Field-keyed validation messages, one message per top-level field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the derived validation of `value`.
    pub fn of<T: Validate>(value: &T) -> Self {
        match value.validate() {
            Ok(()) => Self::new(),
            Err(e) => Self::from(&e),
        }
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a message for `field` unless one is already present.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }

    fn as_json(&self) -> serde_json::Value {
        json!(self.0)
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, kind) in errors.errors() {
            if let Some(message) = first_message(kind) {
                fields.add(&camel_case(field), message);
            }
        }
        fields
    }
}

fn first_message(kind: &ValidationErrorsKind) -> Option<String> {
    match kind {
        ValidationErrorsKind::Field(errors) => errors.first().map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", e.code))
        }),
        ValidationErrorsKind::Struct(inner) => inner.errors().values().find_map(first_message),
        ValidationErrorsKind::List(items) => items
            .values()
            .find_map(|inner| inner.errors().values().find_map(first_message)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(FieldErrors::from(&errors))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Database(e) => {
                tracing::error!(error = ?e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", GENERIC_ERROR_MESSAGE.to_string())
            }
            AppError::Upstream(e) => {
                tracing::error!(error = %e, "Upstream service error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", GENERIC_ERROR_MESSAGE.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", GENERIC_ERROR_MESSAGE.to_string())
            }
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let AppError::Validation(fields) = &self {
            error["fields"] = fields.as_json();
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
