/// Two-factor (TOTP) workflow
///
/// Per-user state: `otp_base32` (None while disabled), `otp_auth_url`,
/// `otp_enabled` and `otp_verified`.
///
/// | operation | requires | effect |
/// |---|---|---|
/// | generate | user exists | new secret + URI; flags untouched |
/// | verify   | secret | code (current step) ok → both flags true |
/// | validate | secret, verified | code (±1 step) ok; nothing changes |
/// | disable  | user exists | secret, URI and flags cleared |

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{AccountError, AccountsConfig};
use crate::auth::otp::{generate_secret, unix_now, validate_code, verify_code};
use crate::models::user::User;

const CODE_MISMATCH: &str = "OTP verification failed";
const NOT_VERIFIED: &str = "One Time Password incorrect";

async fn load(pool: &PgPool, user_id: Uuid) -> Result<User, AccountError> {
    User::find_by_id(pool, user_id)
        .await?
        .ok_or(AccountError::UserNotFound)
}

/// Secret to check a login-time code against
///
/// A missing secret wins over a not-yet-verified enrolment.
pub fn validation_secret(user: &User) -> Result<&str, AccountError> {
    let secret = user
        .otp_base32
        .as_deref()
        .ok_or(AccountError::OtpNotGenerated)?;

    if !user.otp_verified {
        return Err(AccountError::OtpVerificationFailed(NOT_VERIFIED));
    }

    Ok(secret)
}

/// Creates a fresh secret and provisioning URI for the user
pub async fn generate_otp(
    pool: &PgPool,
    config: &AccountsConfig,
    user_id: Uuid,
) -> Result<User, AccountError> {
    let user = load(pool, user_id).await?;
    let secret = generate_secret(&config.otp_issuer, &user.email)?;

    let user = User::set_otp_secret(pool, user.id, &secret.base32, &secret.auth_url)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    info!(user_id = %user.id, "OTP secret generated");
    Ok(user)
}

/// Confirms enrolment with a code from the current time step
pub async fn verify_otp(pool: &PgPool, user_id: Uuid, code: &str) -> Result<User, AccountError> {
    let user = load(pool, user_id).await?;
    let secret = user
        .otp_base32
        .as_deref()
        .ok_or(AccountError::OtpNotGenerated)?;

    if !verify_code(secret, code, unix_now())? {
        warn!(user_id = %user.id, "OTP verification failed");
        return Err(AccountError::OtpVerificationFailed(CODE_MISMATCH));
    }

    let user = User::enable_otp(pool, user.id)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    info!(user_id = %user.id, "Two-factor enabled");
    Ok(user)
}

/// Checks a login-time code, allowing one adjacent time step either way
pub async fn validate_otp(pool: &PgPool, user_id: Uuid, code: &str) -> Result<User, AccountError> {
    let user = load(pool, user_id).await?;
    let secret = validation_secret(&user)?;

    if !validate_code(secret, code, unix_now())? {
        warn!(user_id = %user.id, "OTP validation failed");
        return Err(AccountError::OtpVerificationFailed(CODE_MISMATCH));
    }

    Ok(user)
}

/// Switches two-factor off and forgets the secret
pub async fn disable_otp(pool: &PgPool, user_id: Uuid) -> Result<User, AccountError> {
    let user = User::disable_otp(pool, user_id)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    info!(user_id = %user.id, "Two-factor disabled");
    Ok(user)
}
