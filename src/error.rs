use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload embedded in every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Application error taxonomy.
///
/// Policy denials (`Expired`, `LimitReached`, `Unauthorized`, `PasswordRequired`,
/// `InvalidPassword`) are expected outcomes and map to stable 4xx codes so
/// clients can tell "never existed" from "existed but gone" from "needs a
/// password" without parsing message text. `Unavailable` is the only class a
/// caller should retry.
#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    NotFound { message: String, details: Value },
    Expired { message: String, details: Value },
    LimitReached { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    PasswordRequired { message: String, details: Value },
    InvalidPassword { message: String, details: Value },
    Conflict { message: String, details: Value },
    QuotaExceeded { message: String, details: Value },
    Unavailable { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn expired(message: impl Into<String>, details: Value) -> Self {
        Self::Expired {
            message: message.into(),
            details,
        }
    }
    pub fn limit_reached(message: impl Into<String>, details: Value) -> Self {
        Self::LimitReached {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn password_required(message: impl Into<String>, details: Value) -> Self {
        Self::PasswordRequired {
            message: message.into(),
            details,
        }
    }
    pub fn invalid_password(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidPassword {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn quota_exceeded(message: impl Into<String>, details: Value) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable code for this error class.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::Expired { .. } => "expired",
            AppError::LimitReached { .. } => "limit_reached",
            AppError::Unauthorized { .. } => "unauthorized",
            AppError::PasswordRequired { .. } => "password_required",
            AppError::InvalidPassword { .. } => "invalid_password",
            AppError::Conflict { .. } => "conflict",
            AppError::QuotaExceeded { .. } => "quota_exceeded",
            AppError::Unavailable { .. } => "store_unavailable",
            AppError::Internal { .. } => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            // Expired and over-limit resources existed once; both map to the
            // "gone" class, distinct from generic 404.
            AppError::Expired { .. } | AppError::LimitReached { .. } => StatusCode::GONE,
            AppError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            AppError::PasswordRequired { .. } | AppError::InvalidPassword { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Conflict { .. } | AppError::QuotaExceeded { .. } => StatusCode::CONFLICT,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts into the serializable error payload.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (message, details) = match self {
            AppError::Validation { message, details }
            | AppError::NotFound { message, details }
            | AppError::Expired { message, details }
            | AppError::LimitReached { message, details }
            | AppError::Unauthorized { message, details }
            | AppError::PasswordRequired { message, details }
            | AppError::InvalidPassword { message, details }
            | AppError::Conflict { message, details }
            | AppError::QuotaExceeded { message, details }
            | AppError::Unavailable { message, details }
            | AppError::Internal { message, details } => (message.clone(), details.clone()),
        };

        ErrorInfo {
            code: self.code(),
            message,
            details,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = self.to_error_info();
        write!(f, "{}: {}", info.code, info.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::bad_request(
            "Request validation failed",
            serde_json::to_value(&errors).unwrap_or_else(|_| json!({})),
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

/// Maps a low-level sqlx error onto the application taxonomy.
///
/// Unique-constraint violations become `Conflict` (short key / slug races are
/// settled by the store). Connection-level faults become `Unavailable` so
/// callers can distinguish "try again later" from policy denials.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
        return AppError::internal("Database error", json!({}));
    }

    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::unavailable("Storage temporarily unavailable", json!({}))
        }
        _ => AppError::internal("Database error", json!({})),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::bad_request("m", json!({})), 400),
            (AppError::not_found("m", json!({})), 404),
            (AppError::expired("m", json!({})), 410),
            (AppError::limit_reached("m", json!({})), 410),
            (AppError::unauthorized("m", json!({})), 403),
            (AppError::password_required("m", json!({})), 401),
            (AppError::invalid_password("m", json!({})), 401),
            (AppError::conflict("m", json!({})), 409),
            (AppError::quota_exceeded("m", json!({})), 409),
            (AppError::unavailable("m", json!({})), 503),
            (AppError::internal("m", json!({})), 500),
        ];

        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{}", err.code());
        }
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AppError::expired("m", json!({})).code(), "expired");
        assert_eq!(
            AppError::limit_reached("m", json!({})).code(),
            "limit_reached"
        );
        assert_eq!(
            AppError::password_required("m", json!({})).code(),
            "password_required"
        );
        assert_eq!(
            AppError::unavailable("m", json!({})).code(),
            "store_unavailable"
        );
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = AppError::conflict("Short key already taken", json!({ "key": "abc" }));
        let s = err.to_string();
        assert!(s.contains("conflict"));
        assert!(s.contains("Short key already taken"));
    }
}
