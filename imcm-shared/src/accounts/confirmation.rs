/// Email verification
///
/// A verification token (`{user_id, exp}`, see
/// [`issue_verification_token`](crate::auth::jwt::issue_verification_token))
/// is sent out of band. Two entry points consume it:
///
/// - [`verify_registration`]: API call, strict about expiry.
/// - [`confirm_email`]: link clicked from the mail; the caller turns the
///   outcome into a redirect or a message.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::AccountError;
use crate::auth::jwt::{decode_verification_token, validate_verification_token, JwtError};
use crate::models::user::User;

/// What following a confirmation link did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The account was unverified and is now verified
    Verified,

    /// Nothing to do, the account was verified before
    AlreadyVerified,

    /// The link is past its expiry; nothing changed
    Expired,
}

/// Marks the token's user verified (idempotent)
///
/// # Errors
///
/// `ActivationExpired`, `InvalidVerificationToken` or `UserNotFound`.
pub async fn verify_registration(pool: &PgPool, secret: &str, token: &str) -> Result<User, AccountError> {
    let claims = validate_verification_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AccountError::ActivationExpired,
        _ => AccountError::InvalidVerificationToken,
    })?;

    let user = User::find_by_id(pool, claims.user_id)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    if user.is_verified {
        return Ok(user);
    }

    let user = User::mark_verified(pool, user.id)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    info!(user_id = %user.id, "Email verified");
    Ok(user)
}

/// Handles a confirmation link for `user_id`
///
/// The token must be signed by us and name the same user; its expiry is
/// reported as [`ConfirmationOutcome::Expired`] rather than as an error.
pub async fn confirm_email(
    pool: &PgPool,
    secret: &str,
    token: &str,
    user_id: Uuid,
) -> Result<ConfirmationOutcome, AccountError> {
    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    let claims = decode_verification_token(token, secret)
        .map_err(|_| AccountError::InvalidVerificationToken)?;

    if claims.user_id != user.id {
        warn!(user_id = %user.id, "Confirmation link for another user");
        return Err(AccountError::InvalidVerificationToken);
    }

    let expired = claims.is_expired();

    if !user.is_verified && !expired {
        User::mark_verified(pool, user.id).await?;
        info!(user_id = %user.id, "Email confirmed");
        return Ok(ConfirmationOutcome::Verified);
    }

    if expired {
        return Ok(ConfirmationOutcome::Expired);
    }

    Ok(ConfirmationOutcome::AlreadyVerified)
}
