use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Message shown to the analyst when the report service cannot be reached
pub const CONNECTIVITY_MESSAGE: &str =
    "Could not reach the report service. Check your connection and try again.";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from I/O operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON serialization/deserialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Analyst input rejected before any request was issued
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A structured data input could not be parsed into its expected shape
    #[error("Malformed input for {panel}: {reason}")]
    MalformedInput { panel: String, reason: String },

    /// The report service could not be reached
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    /// The report service answered with a failure
    #[error("Service error (status {status}): {}", .message.as_deref().unwrap_or("no details"))]
    ServiceError {
        status: u16,
        message: Option<String>,
    },

    /// A submission for this export action is already in flight
    #[error("{0} is already in progress")]
    ExportBusy(String),

    /// No capture with this id has been loaded
    #[error("Capture not found: {0}")]
    CaptureNotFound(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Text surfaced to the analyst, the most specific one available
    pub fn user_message(&self) -> String {
        match self {
            AppError::TransportError(_) => CONNECTIVITY_MESSAGE.to_string(),
            AppError::ServiceError {
                message: Some(message),
                ..
            } => message.clone(),
            AppError::ServiceError { status, .. } => {
                format!("The report service failed with status {}", status)
            }
            AppError::ValidationError(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ExportBusy(_) => StatusCode::CONFLICT,
            AppError::CaptureNotFound(_) => StatusCode::NOT_FOUND,
            AppError::TransportError(_) | AppError::ServiceError { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "status": "error",
            "message": self.user_message()
        }))
    }
}

/// Result type for application
pub type AppResult<T> = Result<T, AppError>;
