/// Password login
///
/// Only accounts that can sign in (`active` or `admin`) and have a password
/// are accepted. Every failure reads the same to the caller.

use sqlx::PgPool;
use tracing::{info, warn};

use super::AccountError;
use crate::auth::password::verify_password;
use crate::models::user::User;

/// Checks the credentials and records the login
pub async fn login(pool: &PgPool, email: &str, password: &str) -> Result<User, AccountError> {
    let user = User::find_by_email(pool, email)
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    let hash = match (&user.password_hash, user.status.can_login()) {
        (Some(hash), true) => hash,
        _ => {
            warn!(user_id = %user.id, status = user.status.as_str(), "Login refused for account without access");
            return Err(AccountError::InvalidCredentials);
        }
    };

    if !verify_password(password, hash)? {
        warn!(user_id = %user.id, "Login with wrong password");
        return Err(AccountError::InvalidCredentials);
    }

    User::update_last_login(pool, user.id).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(user)
}
