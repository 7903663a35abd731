use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use sqlx::error::Error as SqlxError;

/// Typed failures produced by the token, session, and permission services.
///
/// Services return these to their callers; only the HTTP boundary
/// (`AppError`) translates them into status codes.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("session not found")]
    SessionNotFound,
    #[error("token has been revoked")]
    Revoked,
    #[error("lookup failed: {0}")]
    LookupFailed(String),
    #[error("permission denied for {0}")]
    PermissionDenied(String),
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("session store error: {0}")]
    Store(String),
}

impl AuthError {
    /// True when the session store could not be reached at all, as opposed
    /// to reaching it and getting an error back. Callers that treat the
    /// store as optional key off this distinction.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable(_))
    }
}

/// Transport failures count as unavailability; anything the store actually
/// answered with is a hard error.
impl From<redis::RedisError> for AuthError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_timeout() || error.is_connection_refusal() || error.is_io_error() {
            AuthError::StoreUnavailable(error.to_string())
        } else {
            AuthError::Store(error.to_string())
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Database(String),
    Internal(String),
    Auth(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    BadRequest(String),
    Configuration(String),
    Validation(String),
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    code: u16,
    message: String,
    error_type: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::Auth(e) => write!(f, "Authentication error: {}", e),
            AppError::Unauthorized(e) => write!(f, "Unauthorized: {}", e),
            AppError::Forbidden(e) => write!(f, "Forbidden: {}", e),
            AppError::NotFound(e) => write!(f, "Not found: {}", e),
            AppError::Conflict(e) => write!(f, "Conflict: {}", e),
            AppError::BadRequest(e) => write!(f, "Bad request: {}", e),
            AppError::Configuration(e) => write!(f, "Configuration error: {}", e),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl StdError for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_type) = match self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        };

        let error_response = ErrorResponse {
            code: status_code.as_u16(),
            message: self.to_string(),
            error_type: error_type.to_string(),
        };

        HttpResponse::build(status_code).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<SqlxError> for AppError {
    fn from(error: SqlxError) -> Self {
        match error {
            SqlxError::RowNotFound => AppError::NotFound("Record not found".to_string()),
            _ => AppError::Database(error.to_string()),
        }
    }
}

/// Status-code translation for the auth taxonomy. This is the only place
/// typed auth errors become user-visible outcomes.
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidToken => AppError::Auth("Invalid token".to_string()),
            AuthError::ExpiredToken => AppError::Auth("Token has expired".to_string()),
            AuthError::Revoked => AppError::Auth("Token has been revoked".to_string()),
            AuthError::SessionNotFound => AppError::NotFound("Session not found".to_string()),
            AuthError::LookupFailed(msg) => {
                AppError::Internal(format!("Permission lookup failed: {}", msg))
            }
            AuthError::PermissionDenied(what) => {
                AppError::Forbidden(format!("Missing permission: {}", what))
            }
            AuthError::StoreUnavailable(msg) => {
                AppError::Internal(format!("Session store unavailable: {}", msg))
            }
            AuthError::Store(e) => AppError::Internal(format!("Session store error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_maps_to_expected_status_codes() {
        let cases = [
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::ExpiredToken, StatusCode::UNAUTHORIZED),
            (AuthError::Revoked, StatusCode::UNAUTHORIZED),
            (AuthError::SessionNotFound, StatusCode::NOT_FOUND),
            (
                AuthError::LookupFailed("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::PermissionDenied("game_server:delete".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                AuthError::StoreUnavailable("connect timeout".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn store_unavailable_is_degradable() {
        assert!(AuthError::StoreUnavailable("timed out".to_string()).is_store_unavailable());
        assert!(!AuthError::Revoked.is_store_unavailable());
        assert!(!AuthError::LookupFailed("x".to_string()).is_store_unavailable());
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = AppError::from(SqlxError::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
