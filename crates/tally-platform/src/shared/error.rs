//! Platform Error Types

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use utoipa::ToSchema;

use crate::auth::token_service::TokenError;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Value out of range: {message}")]
    OutOfRange { message: String },

    #[error("Authorization error: {message}")]
    Unauthorized { message: String },

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("The token has expired.")]
    TokenExpired,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TallyError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Outward HTTP status for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TallyError::Validation { .. } => StatusCode::BAD_REQUEST,
            TallyError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
            TallyError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            TallyError::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            TallyError::Forbidden { .. } => StatusCode::FORBIDDEN,
            TallyError::TokenExpired => StatusCode::FORBIDDEN,
            TallyError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, TallyError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for TallyError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            TallyError::Validation { .. } => "VALIDATION_ERROR",
            TallyError::OutOfRange { .. } => "OUT_OF_RANGE",
            TallyError::Unauthorized { .. } => "UNAUTHORIZED",
            TallyError::InvalidToken { .. } => "INVALID_TOKEN",
            TallyError::Forbidden { .. } => "FORBIDDEN",
            TallyError::TokenExpired => "TOKEN_EXPIRED",
            TallyError::Internal { .. } => "INTERNAL_ERROR",
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Central mapping from token verification failures to outward error kinds.
///
/// Malformed or signature-invalid tokens are 401s; structurally valid tokens
/// whose time or issuer claims fail are 403s.
impl From<TokenError> for TallyError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid { .. } => TallyError::InvalidToken {
                message: "A valid token must be passed.".to_string(),
            },
            TokenError::Expired => TallyError::TokenExpired,
            TokenError::InvalidIssuer => TallyError::Forbidden {
                message: "The token does not have a valid issuer.".to_string(),
            },
            TokenError::InvalidIssuedAt => TallyError::Forbidden {
                message: "The token does not have a valid \"issued at\" time.".to_string(),
            },
        }
    }
}
