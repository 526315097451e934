/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; each failure kind of the
/// account workflows gets its own status code.
///
/// | kind | status |
/// |---|---|
/// | malformed request | 400 |
/// | unauthenticated, wrong OTP | 401 |
/// | other company, insufficient status | 403 |
/// | unknown entity | 404 |
/// | reused access token, email taken, company without admin | 409 |
/// | expired invite | 410 |
/// | missing or invalid fields | 422 |
/// | throttled | 429 |
/// | persistence, hashing, signing | 500 |
/// | mail delivery | 503 |
///
/// # Example
///
/// ```
/// use imcm_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(name: Option<String>) -> ApiResult<Json<serde_json::Value>> {
///     let name = name.ok_or_else(|| ApiError::BadRequest("name is required".to_string()))?;
///     Ok(Json(json!({ "name": name })))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use imcm_shared::accounts::AccountError;
use imcm_shared::auth::authorization::AuthzError;
use imcm_shared::auth::jwt::JwtError;
use imcm_shared::auth::middleware::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Gone (410), e.g. an expired invite
    Gone(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Too many requests (429)
    RateLimitExceeded {
        retry_after: u64,
        message: String,
    },

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Status code this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Validation error from plain messages
    pub fn validation(messages: impl IntoIterator<Item = String>) -> Self {
        ApiError::ValidationError(
            messages
                .into_iter()
                .map(ValidationErrorDetail::message)
                .collect(),
        )
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
            ApiError::Gone(msg) => write!(f, "Gone: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::RateLimitExceeded { message, .. } => write!(f, "Rate limit exceeded: {}", message),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details, retry_after) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None, None),
            ApiError::NotFound(msg) => ("not_found", msg, None, None),
            ApiError::Conflict(msg) => ("conflict", msg, None, None),
            ApiError::Gone(msg) => ("gone", msg, None, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
                None,
            ),
            ApiError::RateLimitExceeded { retry_after, message } => {
                ("rate_limit_exceeded", message, None, Some(retry_after))
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                ("service_unavailable", msg, None, None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        let mut response = (status, body).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert malformed JSON bodies to validation errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::message(rejection.body_text())])
    }
}

/// Convert `validator` failures, one detail per field error
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: Some(field.to_string()),
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

/// Convert account workflow errors to API errors
impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(messages) => ApiError::validation(messages),
            AccountError::NotFound(_) | AccountError::UserNotFound => {
                ApiError::NotFound(err.to_string())
            }
            AccountError::TokenExpired => ApiError::Gone(err.to_string()),
            AccountError::AccessTokenAlreadyUsed
            | AccountError::EmailInUse(_)
            | AccountError::NoCompanyAdmin => ApiError::Conflict(err.to_string()),
            AccountError::OtpNotGenerated
            | AccountError::ActivationExpired
            | AccountError::InvalidVerificationToken => ApiError::BadRequest(err.to_string()),
            AccountError::OtpVerificationFailed(_) | AccountError::InvalidCredentials => {
                ApiError::Unauthorized(err.to_string())
            }
            AccountError::Mail(e) => {
                ApiError::ServiceUnavailable(format!("Mail delivery failed: {}", e))
            }
            AccountError::Password(_)
            | AccountError::Token(_)
            | AccountError::Otp(_)
            | AccountError::Database(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

/// Convert auth errors to API errors
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

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                ApiError::Forbidden("Not a member of this company".to_string())
            }
            AuthzError::InsufficientStatus { .. } => {
                ApiError::Forbidden("Insufficient permissions".to_string())
            }
            AuthzError::NotAuthorized => {
                ApiError::Forbidden("Not authorized to access this resource".to_string())
            }
            AuthzError::UnknownUser => {
                ApiError::Unauthorized("Authenticated user no longer exists".to_string())
            }
            AuthzError::DatabaseError(err) => {
                ApiError::InternalError(format!("Database error: {}", err))
            }
        }
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token signing failed: {}", msg)),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imcm_shared::mail::MailError;
    use imcm_shared::models::user::UserStatus;
    use uuid::Uuid;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_account_error_status_codes() {
        let cases = [
            (AccountError::validation("Email can't be empty"), StatusCode::UNPROCESSABLE_ENTITY),
            (AccountError::NotFound("Invite token"), StatusCode::NOT_FOUND),
            (AccountError::UserNotFound, StatusCode::NOT_FOUND),
            (AccountError::TokenExpired, StatusCode::GONE),
            (AccountError::AccessTokenAlreadyUsed, StatusCode::CONFLICT),
            (AccountError::EmailInUse("a@b.test".to_string()), StatusCode::CONFLICT),
            (AccountError::NoCompanyAdmin, StatusCode::CONFLICT),
            (AccountError::OtpNotGenerated, StatusCode::BAD_REQUEST),
            (AccountError::OtpVerificationFailed("OTP verification failed"), StatusCode::UNAUTHORIZED),
            (AccountError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AccountError::ActivationExpired, StatusCode::BAD_REQUEST),
            (
                AccountError::Mail(MailError::Transport("refused".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AccountError::Database(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let label = err.to_string();
            assert_eq!(ApiError::from(err).status(), expected, "{}", label);
        }
    }

    #[test]
    fn test_authz_errors_are_forbidden() {
        let err = ApiError::from(AuthzError::NotMember(Uuid::new_v4()));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = ApiError::from(AuthzError::InsufficientStatus {
            required: UserStatus::Admin,
            actual: UserStatus::Active,
        });
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_validation_response_body() {
        let response = ApiError::validation(vec![
            "Email can't be empty".to_string(),
            "Password can't be empty".to_string(),
        ])
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["details"][1]["message"], "Password can't be empty");
        assert!(json["details"][0].get("field").is_none());
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = ApiError::RateLimitExceeded {
            retry_after: 7,
            message: "slow down".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "7");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::InternalError("connection reset".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["message"], "An internal error occurred");
    }
}
