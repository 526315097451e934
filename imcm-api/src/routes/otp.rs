/// Two-factor (TOTP) endpoints
///
/// A caller may only operate on their own user. Every endpoint answers with
/// the user and a fresh token pair.
///
/// # Flow
///
/// ```text
/// generate ──► otpAuthUrl (scan in an authenticator app)
/// verify   ──► two-factor enabled (code from the current 30 s step)
/// validate ──► login-time check (one step of skew either way)
/// disable  ──► secret forgotten
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    serialization::UserWithToken,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use imcm_shared::{
    accounts::two_factor,
    auth::{authorization::require_self, middleware::AuthContext},
    models::user::User,
};
use serde::Deserialize;
use uuid::Uuid;

/// OTP request body
#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    /// User id
    pub id: Uuid,

    /// Six-digit code; required by verify and validate
    #[serde(default)]
    pub otp: Option<String>,
}

impl OtpRequest {
    fn code(&self) -> ApiResult<&str> {
        self.otp
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| ApiError::validation(["otp can't be empty".to_string()]))
    }
}

fn respond(state: &AppState, user: &User) -> ApiResult<Json<UserWithToken>> {
    Ok(Json(UserWithToken::issue(user, state.jwt_secret())?))
}

fn own_request(
    auth: &AuthContext,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<OtpRequest> {
    let Json(req) = payload?;
    require_self(auth, req.id)?;
    Ok(req)
}

/// Create a new secret
///
/// # Endpoint
///
/// ```text
/// POST /v1/otp/generate
/// Authorization: Bearer <access token>
///
/// { "id": "uuid" }
/// ```
///
/// # Response
///
/// The user with `otpAuthUrl` set and a token pair. Two-factor stays off
/// until the code is verified.
pub async fn generate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<Json<UserWithToken>> {
    let req = own_request(&auth, payload)?;

    let user = two_factor::generate_otp(&state.db, &state.config.accounts, req.id).await?;
    let body = UserWithToken::issue(&user, state.jwt_secret())?.with_otp_auth_url(&user);
    Ok(Json(body))
}

/// Confirm enrolment
///
/// # Errors
///
/// - `400 Bad Request`: No secret generated
/// - `401 Unauthorized`: Wrong code
pub async fn verify(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<Json<UserWithToken>> {
    let req = own_request(&auth, payload)?;

    let user = two_factor::verify_otp(&state.db, req.id, req.code()?).await?;
    respond(&state, &user)
}

/// Check a login-time code
///
/// # Errors
///
/// - `400 Bad Request`: No secret generated
/// - `401 Unauthorized`: Enrolment not verified, or wrong code
pub async fn validate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<Json<UserWithToken>> {
    let req = own_request(&auth, payload)?;

    let user = two_factor::validate_otp(&state.db, req.id, req.code()?).await?;
    respond(&state, &user)
}

/// Switch two-factor off
pub async fn disable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> ApiResult<Json<UserWithToken>> {
    let req = own_request(&auth, payload)?;

    let user = two_factor::disable_otp(&state.db, req.id).await?;
    respond(&state, &user)
}
