use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream feed error: {0}")]
    Upstream(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::refresh::RefreshError> for AppError {
    fn from(err: crate::refresh::RefreshError) -> Self {
        use crate::refresh::RefreshError;
        match err {
            RefreshError::InvalidEntryPrice(_) => AppError::BadRequest(err.to_string()),
            RefreshError::Feed(_) | RefreshError::FeedTimeout => {
                AppError::Upstream(err.to_string())
            }
            RefreshError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<crate::datasource::MarketDataError> for AppError {
    fn from(err: crate::datasource::MarketDataError) -> Self {
        use crate::datasource::MarketDataError;
        match err {
            MarketDataError::TokenNotFound(_) => AppError::NotFound(err.to_string()),
            _ => AppError::Upstream(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
