use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::models::ApiError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: i64, required: i64 },

    #[error("Prize pool not found: {0}")]
    PoolNotFound(String),

    #[error("Invalid item: {item_type}/{item_key}")]
    InvalidItem { item_type: String, item_key: String },

    #[error("Draw incomplete: cost debited in transaction {transaction_id}, reward not yet issued")]
    DrawIncomplete { transaction_id: i64 },

    #[error("Resource busy, retry later")]
    Busy,

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message, detail) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                    None,
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                    None,
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
                None,
            ),
            AppError::InsufficientBalance { balance, required } => (
                actix_web::http::StatusCode::CONFLICT,
                "INSUFFICIENT_BALANCE",
                self.to_string(),
                Some(json!({ "balance": balance, "required": required })),
            ),
            AppError::PoolNotFound(pool_id) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "POOL_NOT_FOUND",
                self.to_string(),
                Some(json!({ "pool_id": pool_id })),
            ),
            AppError::InvalidItem {
                item_type,
                item_key,
            } => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_ITEM",
                self.to_string(),
                Some(json!({ "item_type": item_type, "item_key": item_key })),
            ),
            AppError::DrawIncomplete { transaction_id } => {
                log::warn!("Draw incomplete for ledger transaction {transaction_id}");
                (
                    actix_web::http::StatusCode::CONFLICT,
                    "DRAW_INCOMPLETE",
                    self.to_string(),
                    // Retrying with the same reference resumes the grant, never re-debits
                    Some(json!({ "transaction_id": transaction_id, "retryable": true })),
                )
            }
            AppError::Busy => (
                actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                "BUSY",
                self.to_string(),
                None,
            ),
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                    None,
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": ApiError {
                code: error_code.to_string(),
                message,
                detail,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_insufficient_balance_is_conflict() {
        let err = AppError::InsufficientBalance {
            balance: 50,
            required: 100,
        };
        assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("have 50"));
        assert!(err.to_string().contains("need 100"));
    }

    #[test]
    fn test_pool_not_found_is_404() {
        let err = AppError::PoolNotFound("standard".to_string());
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_draw_incomplete_is_conflict() {
        let err = AppError::DrawIncomplete { transaction_id: 42 };
        assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_busy_is_503() {
        assert_eq!(
            AppError::Busy.error_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
