//! HTTP-facing error type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::ingest::IngestError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Ingest(IngestError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Ingest(IngestError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Ingest(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::Ingest(IngestError::InvalidInput(_)) => {
                "VALIDATION_ERROR"
            },
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Ingest(IngestError::StoreWrite(_)) => "STORAGE_ERROR",
            AppError::Ingest(IngestError::Readback(_)) => "PROCESSING_ERROR",
            AppError::Ingest(IngestError::Persistence(_)) => "DATABASE_ERROR",
            AppError::Ingest(IngestError::Rejected(_)) => "REJECTED",
            AppError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-safe message; infrastructure details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::Ingest(IngestError::InvalidInput(msg)) => msg.clone(),
            AppError::Ingest(IngestError::StoreWrite(_)) => "Failed to upload image".to_string(),
            AppError::Ingest(IngestError::Readback(_)) => {
                "Failed to process uploaded image".to_string()
            },
            AppError::Ingest(IngestError::Persistence(_)) => {
                "Failed to save image metadata".to_string()
            },
            AppError::Ingest(IngestError::Rejected(msg)) => format!("Image rejected: {msg}"),
            AppError::Unavailable(msg) => msg.clone(),
            AppError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(format!("Failed to read multipart data: {}", err.body_text()))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }

        let body = ErrorResponse::new(self.code(), self.public_message());
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, AppError>;
