use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

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

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("No available items to order")]
    NoValidItems,

    #[error("You have already purchased this movie")]
    AlreadyPurchased,

    #[error("Order total does not match its items")]
    InvalidOrderTotal,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Bad webhook metadata: {0}")]
    BadMetadata(String),

    #[error("No payment found for this order")]
    NoPaymentFound,

    #[error("Payment gateway error: {0}")]
    GatewayError(String),

    #[error("Refund failed: {0}")]
    RefundFailed(String),

    #[error("Mail error: {0}")]
    MailError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl AppError {
    /// Stable machine-readable reason code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Forbidden => "FORBIDDEN",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::EmptyCart => "EMPTY_CART",
            AppError::NoValidItems => "NO_VALID_ITEMS",
            AppError::AlreadyPurchased => "ALREADY_PURCHASED",
            AppError::InvalidOrderTotal => "INVALID_ORDER_TOTAL",
            AppError::InvalidSignature => "INVALID_SIGNATURE",
            AppError::BadMetadata(_) => "BAD_METADATA",
            AppError::NoPaymentFound => "NO_PAYMENT_FOUND",
            AppError::GatewayError(_) => "GATEWAY_ERROR",
            AppError::RefundFailed(_) => "REFUND_FAILED",
            AppError::MailError(_) => "MAIL_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    fn status_code_for(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidState(_)
            | AppError::EmptyCart
            | AppError::NoValidItems
            | AppError::AlreadyPurchased
            | AppError::InvalidOrderTotal
            | AppError::InvalidSignature
            | AppError::BadMetadata(_)
            | AppError::NoPaymentFound => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code_for();
        let error_code = self.code();

        let message = match self {
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                msg.clone()
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                "Invalid or expired token".to_string()
            }
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                "Forbidden".to_string()
            }
            AppError::InvalidOrderTotal => {
                // Should never occur absent a bug; worth alerting on.
                log::error!("Order total consistency check failed");
                self.to_string()
            }
            AppError::GatewayError(msg) => {
                log::error!("Payment gateway error: {msg}");
                "Payment gateway error".to_string()
            }
            AppError::RefundFailed(msg) => {
                log::error!("Refund failed: {msg}");
                "Refund failed".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            AppError::MailError(msg) => {
                log::error!("Mail error: {msg}");
                "Notification dispatch failed".to_string()
            }
            AppError::ConfigError(msg) | AppError::InternalError(msg) => {
                log::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::BcryptError(err) => {
                log::error!("Password hashing error: {err}");
                "Internal server error".to_string()
            }
            AppError::ReqwestError(err) => {
                log::error!("HTTP request error: {err}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn error_kinds_map_to_expected_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code_for(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code_for(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::EmptyCart.status_code_for(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidState("x".into()).status_code_for(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::GatewayError("x".into()).status_code_for(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::RefundFailed("x".into()).status_code_for(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Forbidden.status_code_for(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AppError::EmptyCart.code(), "EMPTY_CART");
        assert_eq!(AppError::NoValidItems.code(), "NO_VALID_ITEMS");
        assert_eq!(AppError::InvalidSignature.code(), "INVALID_SIGNATURE");
        assert_eq!(AppError::NoPaymentFound.code(), "NO_PAYMENT_FOUND");
        assert_eq!(AppError::InvalidOrderTotal.code(), "INVALID_ORDER_TOTAL");
    }
}
