use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{
    card_issuer::CardIssuanceError, card_verifier::VerificationError,
    qr_generator::QrGenerationError, training_registry::RegistryError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<CardIssuanceError> for AppError {
    fn from(err: CardIssuanceError) -> Self {
        match err {
            CardIssuanceError::Validation(msg) => AppError::Validation(msg),
            CardIssuanceError::TrainingNotFound => AppError::NotFound("Training not found".into()),
            CardIssuanceError::CardNotFound => AppError::NotFound("Card not found".into()),
            e @ CardIssuanceError::DuplicateCode(_) => AppError::Conflict(e.to_string()),
            e @ CardIssuanceError::CodeSpaceExhausted(_) => {
                AppError::ServiceUnavailable(e.to_string())
            }
            CardIssuanceError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(msg) => AppError::Validation(msg),
            RegistryError::CompanyNotFound => AppError::NotFound("Company not found".into()),
            RegistryError::TrainingNotFound => AppError::NotFound("Training not found".into()),
            RegistryError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Storage(e) => AppError::Storage(e),
            e @ VerificationError::DanglingCard { .. } => AppError::Internal(e.into()),
        }
    }
}

impl From<QrGenerationError> for AppError {
    fn from(err: QrGenerationError) -> Self {
        AppError::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_debug = format!("{:?}", self);

        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %error_debug, "Request failed");
        }

        let body = Json(json!({
            "error": error_debug,
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
