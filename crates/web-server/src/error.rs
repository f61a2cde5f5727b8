use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use risk::RiskError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Risk analysis error: {0}")]
    Risk(#[from] RiskError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Data synchronization is not available on this server")]
    SyncUnavailable,
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(database::DbError::NotFound) => {
                (StatusCode::NOT_FOUND, "The requested resource was not found".to_string())
            }
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Risk(RiskError::Store(db_err)) => {
                tracing::error!(error = ?db_err, "Database error during risk analysis.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred during risk analysis".to_string(),
                )
            }
            AppError::Risk(risk_err) => (StatusCode::BAD_REQUEST, risk_err.to_string()),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::SyncUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, AppError::SyncUnavailable.to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
