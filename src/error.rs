//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every variant maps to an HTTP status and a stable `error_code` string, and is rendered
//! as the JSON body `{ "error_code", "message", "details"? }`.
//!
//! `AppError` implements `actix_web::error::ResponseError`, and provides `From`
//! implementations for `sqlx::Error`, `validator::ValidationErrors` and
//! `jsonwebtoken::errors::Error` so handlers can use the `?` operator.

use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Stable error codes returned in the `error_code` field.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const TASK_NOT_FOUND: &str = "TASK_NOT_FOUND";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// JSON error body sent to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// No bearer token was supplied (HTTP 401).
    Unauthorized(String),
    /// The bearer token is malformed, badly signed, or otherwise unusable (HTTP 401).
    InvalidToken(String),
    /// The bearer token is past its `exp` (HTTP 401).
    TokenExpired,
    /// The task does not exist or belongs to someone else (HTTP 404).
    /// Both cases look the same so that existence never leaks to non-owners.
    TaskNotFound,
    /// Any other missing resource (HTTP 404).
    NotFound(String),
    /// Input failed validation (HTTP 422). `details` carries per-field errors when known.
    ValidationError {
        message: String,
        details: Option<serde_json::Value>,
    },
    /// An unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// A failure from the database layer (HTTP 500). The transaction is rolled back.
    DatabaseError(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
            details: None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::InvalidToken(_) => codes::INVALID_TOKEN,
            AppError::TokenExpired => codes::TOKEN_EXPIRED,
            AppError::TaskNotFound => codes::TASK_NOT_FOUND,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::ValidationError { .. } => codes::VALIDATION_ERROR,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => codes::INTERNAL_ERROR,
        }
    }

    /// The message shown to clients. Internal causes are logged, never echoed.
    fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidToken(_) => "Invalid or expired token".to_string(),
            AppError::TokenExpired => "Token has expired".to_string(),
            AppError::TaskNotFound => "The requested task does not exist".to_string(),
            AppError::ValidationError { message, .. } => message.clone(),
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::ValidationError { details, .. } => details.clone(),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            AppError::TokenExpired => write!(f, "Token expired"),
            AppError::TaskNotFound => write!(f, "Not Found: task"),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationError { message, .. } => write!(f, "Validation Error: {}", message),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::InvalidToken(_) | AppError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AppError::TaskNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => log::error!("{}", self),
            StatusCode::UNAUTHORIZED => log::debug!("{}", self),
            _ => {}
        }

        let body = ErrorResponse {
            error_code: self.error_code().to_string(),
            message: self.public_message(),
            details: self.details(),
        };

        let mut response = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(body)
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Lookups use `fetch_optional`; every error reaching this point is a database failure.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(format!("Migration failed: {}", error))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`,
/// keeping the per-field errors as `details`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError {
            message: "Request validation failed".to_string(),
            details: serde_json::to_value(&error).ok(),
        }
    }
}

/// Converts `jsonwebtoken::errors::Error` into the matching 401 variant.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        match error.kind() {
            JwtErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value, bool) {
        let response = error.error_response();
        let status = response.status();
        let has_challenge = response.headers().contains_key(header::WWW_AUTHENTICATE);
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), has_challenge)
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(AppError::InvalidToken("x".into()).status_code(), 401);
        assert_eq!(AppError::TokenExpired.status_code(), 401);
        assert_eq!(AppError::TaskNotFound.status_code(), 404);
        assert_eq!(AppError::validation("x").status_code(), 422);
        assert_eq!(AppError::DatabaseError("x".into()).status_code(), 500);
        assert_eq!(AppError::InternalServerError("x".into()).status_code(), 500);
    }

    #[actix_rt::test]
    async fn test_unauthorized_body_and_challenge() {
        let (status, json, has_challenge) =
            body_json(AppError::Unauthorized("Authentication required".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(has_challenge);
        assert_eq!(json["error_code"], "UNAUTHORIZED");
        assert_eq!(json["message"], "Authentication required");
        assert!(json.get("details").is_none());
    }

    #[actix_rt::test]
    async fn test_database_error_does_not_leak_cause() {
        let (status, json, _) =
            body_json(AppError::DatabaseError("relation \"task\" does not exist".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error_code"], "INTERNAL_ERROR");
        assert!(!json["message"].as_str().unwrap().contains("relation"));
    }

    #[test]
    fn test_jwt_error_conversion() {
        let expired: AppError = jsonwebtoken::errors::Error::from(JwtErrorKind::ExpiredSignature).into();
        assert!(matches!(expired, AppError::TokenExpired));

        let bad_sig: AppError = jsonwebtoken::errors::Error::from(JwtErrorKind::InvalidSignature).into();
        assert_eq!(bad_sig.error_code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let error: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.error_code(), "INTERNAL_ERROR");
    }
}
