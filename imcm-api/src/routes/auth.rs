/// Authentication endpoints
///
/// This module provides the public account endpoints:
/// - Admin registration
/// - Email verification (token post and confirmation link)
/// - Login
/// - Token refresh
///
/// # Endpoints
///
/// - `POST /v1/register` - Register the first admin of a company
/// - `POST /v1/verify-registration` - Verify an email with a signed token
/// - `GET /v1/confirmation/:token/:user_id` - Confirmation link from the mail
/// - `POST /v1/login` - Login and get tokens
/// - `POST /v1/token/refresh` - Refresh access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    serialization::UserWithToken,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use imcm_shared::{
    accounts::{
        confirmation::{confirm_email, verify_registration as verify_user, ConfirmationOutcome},
        registration::{register_admin, RegisterAdmin},
        session, AccountError,
    },
    auth::jwt,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
///
/// Every field is required; missing ones are reported together.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,

    /// Company name
    pub company: Option<String>,

    /// Access token handed out with the company
    pub access_token: Option<String>,

    pub phone: Option<String>,
}

impl From<RegisterRequest> for RegisterAdmin {
    fn from(req: RegisterRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password: req.password,
            company: req.company,
            access_token: req.access_token,
            phone: req.phone,
        }
    }
}

/// Verification request
#[derive(Debug, Deserialize)]
pub struct VerifyRegistrationRequest {
    /// Signed verification token
    pub token: String,
}

/// `{"detail": ...}` body of the verification endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password can't be empty"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh: String,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access: String,
}

/// Text shown for an expired confirmation link
pub const CONFIRMATION_EXPIRED: &str = "Your activation link has been expired";

/// Register the first admin of a company
///
/// The company is looked up by name and access token; registration succeeds
/// only while the company has no verified user yet.
///
/// # Endpoint
///
/// ```text
/// POST /v1/register
/// Content-Type: application/json
///
/// {
///   "firstName": "Dana",
///   "lastName": "Hart",
///   "email": "dana@acme.test",
///   "password": "SecureP@ss123",
///   "company": "Acme Heating",
///   "accessToken": "imcm_...",
///   "phone": "555-0100"
/// }
/// ```
///
/// # Response
///
/// The new admin with an `access`/`refresh` token pair.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing fields, weak password, email taken
/// - `404 Not Found`: No company with this name and access token
/// - `409 Conflict`: The company already has a verified user
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserWithToken>)> {
    let Json(req) = payload?;

    let user = register_admin(&state.db, req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserWithToken::issue(&user, state.jwt_secret())?),
    ))
}

/// Verify an email address
///
/// # Endpoint
///
/// ```text
/// POST /v1/verify-registration
/// Content-Type: application/json
///
/// { "token": "eyJ..." }
/// ```
///
/// # Response
///
/// ```json
/// { "detail": "Successfully activated" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: `{"detail": "Activation Expired"}` or
///   `{"detail": "Invalid token"}`
/// - `404 Not Found`: The token names no user
pub async fn verify_registration(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRegistrationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DetailResponse>)> {
    let Json(req) = payload?;

    let (status, detail) = match verify_user(&state.db, state.jwt_secret(), &req.token).await {
        Ok(_) => (StatusCode::OK, "Successfully activated".to_string()),
        Err(
            e @ (AccountError::ActivationExpired | AccountError::InvalidVerificationToken),
        ) => (StatusCode::BAD_REQUEST, e.to_string()),
        Err(e @ AccountError::UserNotFound) => (StatusCode::NOT_FOUND, e.to_string()),
        Err(e) => return Err(e.into()),
    };

    Ok((status, Json(DetailResponse { detail })))
}

/// Confirmation link
///
/// # Endpoint
///
/// ```text
/// GET /v1/confirmation/:token/:user_id
/// ```
///
/// # Response
///
/// - `303 See Other` to the login page once the account is verified
///   (now or before)
/// - `200 OK` with a plain text notice when the link has expired
///
/// # Errors
///
/// - `400 Bad Request`: Token not signed by us or for another user
/// - `404 Not Found`: Unknown user
pub async fn confirmation(
    State(state): State<AppState>,
    Path((token, user_id)): Path<(String, Uuid)>,
) -> ApiResult<Response> {
    let outcome = confirm_email(&state.db, state.jwt_secret(), &token, user_id).await?;

    let response = match outcome {
        ConfirmationOutcome::Verified | ConfirmationOutcome::AlreadyVerified => {
            Redirect::to(&state.config.accounts.login_redirect_url).into_response()
        }
        ConfirmationOutcome::Expired => (StatusCode::OK, CONFIRMATION_EXPIRED).into_response(),
    };

    Ok(response)
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response
///
/// The user with a token pair. When `otpEnabled` is true the client must
/// call `/v1/otp/validate` next.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<UserWithToken>> {
    let Json(req) = payload?;
    req.validate()?;

    let user = session::login(&state.db, &req.email, &req.password).await?;

    Ok(Json(UserWithToken::issue(&user, state.jwt_secret())?))
}

/// Token refresh endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/token/refresh
/// Content-Type: application/json
///
/// { "refresh": "eyJ..." }
/// ```
///
/// # Response
///
/// ```json
/// { "access": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshResponse>> {
    let Json(req) = payload?;

    let access = jwt::refresh_access_token(&req.refresh, state.jwt_secret())
        .map_err(|e| ApiError::Unauthorized(format!("Invalid refresh token: {}", e)))?;

    Ok(Json(RefreshResponse { access }))
}
