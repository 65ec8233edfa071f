/// Response envelope and error handling for the API server
///
/// All handlers return `Result<T, ApiError>`. Successes are wrapped in the
/// `{"success": true, ...}` envelope via [`ApiSuccess`]; every `ApiError`
/// converts to `{"success": false, "message": ...}` with the matching HTTP
/// status. Nothing escapes a handler uncaught: store, credential, token, and
/// authorization errors all have `From` conversions into `ApiError`.
///
/// Internal errors are the only category logged with raw detail; clients get
/// a curated message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use taskroster_shared::auth::{
    authorization::AccessError, jwt::JwtError, middleware::AuthError, password::PasswordError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - malformed input or identifier
    BadRequest(String),

    /// Unauthorized (401) - missing or invalid credential
    Unauthorized(String),

    /// Forbidden (403) - principal lacks rights over the target
    Forbidden(String),

    /// Not found (404) - absent record, or a denial that must not confirm
    /// existence
    NotFound(String),

    /// Conflict (409) - business-rule violation (duplicate email,
    /// already-completed task, admin already bootstrapped)
    Conflict(String),

    /// Unprocessable entity (422) - field-level validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,

    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

/// Success response envelope
///
/// Carries `{"success": true}` plus a data payload, a message, or both.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    /// Always true
    pub success: bool,

    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiSuccess<T> {
    /// Envelope with a data payload
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    /// Envelope with a data payload and a message
    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        })
    }
}

impl ApiSuccess<()> {
    /// Envelope with a message only
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
        })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log raw detail, surface a curated message
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Unique-index clashes on email surface as conflicts; the
                // handler-level pre-check usually catches them first, this is
                // the race-window fallback.
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already in use".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert authentication errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert authorization denials to API errors
///
/// Denials against resources outside the caller's roster map to 404, not
/// 403, so existence of other admins' records is never confirmed.
impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        if err.is_not_found_shaped() {
            return ApiError::NotFound(err.to_string());
        }

        match err {
            AccessError::AdminAlreadyExists => ApiError::Conflict(err.to_string()),
            _ => ApiError::Forbidden(err.to_string()),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert field validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid user ID".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid user ID");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_validation_error_display() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "title".to_string(),
                message: "Title is required".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_access_error_shaping() {
        // Cross-roster member probes come back as not-found
        assert!(matches!(
            ApiError::from(AccessError::MemberNotInRoster),
            ApiError::NotFound(_)
        ));

        // Cross-roster task writes are plain forbidden
        assert!(matches!(
            ApiError::from(AccessError::UpdateOutsideRoster),
            ApiError::Forbidden(_)
        ));

        // Repeat bootstrap is a conflict
        assert!(matches!(
            ApiError::from(AccessError::AdminAlreadyExists),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_success_envelope_shape() {
        let Json(envelope) = ApiSuccess::data(vec![1, 2, 3]);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert!(json.get("message").is_none());

        let Json(envelope) = ApiSuccess::message("Task deleted successfully");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Task deleted successfully");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_error_response_envelope_shape() {
        let body = ErrorResponse {
            success: false,
            error: "conflict".to_string(),
            message: "Email already in use".to_string(),
            details: None,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Email already in use");
        assert!(json.get("details").is_none());
    }
}
