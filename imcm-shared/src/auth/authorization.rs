/// Tenant authorization checks
///
/// Callers are authorized against their current user record, not the token
/// claims: a user removed from a company or demoted loses access at once.
///
/// Permission model: the caller must belong to the company, and their
/// status must be at least the required one (`admin` > `active` > `pending`).
///
/// # Example
///
/// ```no_run
/// use imcm_shared::auth::authorization::require_company_admin;
/// use imcm_shared::auth::middleware::AuthContext;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, auth: AuthContext, company_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let admin = require_company_admin(&pool, &auth, company_id).await?;
/// println!("{} may manage users", admin.email);
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::{User, UserStatus};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Not a member of company {0}")]
    NotMember(Uuid),

    #[error("Insufficient permissions: requires {}, has {}", required.as_str(), actual.as_str())]
    InsufficientStatus {
        required: UserStatus,
        actual: UserStatus,
    },

    #[error("Not authorized to act on this user")]
    NotAuthorized,

    #[error("Authenticated user no longer exists")]
    UnknownUser,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks a loaded user record against a company and minimum status
pub fn check_company_access(
    user: &User,
    company_id: Uuid,
    required: UserStatus,
) -> Result<(), AuthzError> {
    if user.company_id != Some(company_id) {
        return Err(AuthzError::NotMember(company_id));
    }

    if !user.status.has_permission(&required) {
        return Err(AuthzError::InsufficientStatus {
            required,
            actual: user.status,
        });
    }

    Ok(())
}

async fn load_caller(pool: &PgPool, auth: &AuthContext) -> Result<User, AuthzError> {
    User::find_by_id(pool, auth.user_id)
        .await?
        .ok_or(AuthzError::UnknownUser)
}

/// Requires the caller to be an active member (or admin) of the company
///
/// Returns the caller's user record.
pub async fn require_company_member(
    pool: &PgPool,
    auth: &AuthContext,
    company_id: Uuid,
) -> Result<User, AuthzError> {
    let caller = load_caller(pool, auth).await?;
    check_company_access(&caller, company_id, UserStatus::Active)?;
    Ok(caller)
}

/// Requires the caller to be an admin of the company
///
/// Returns the caller's user record.
pub async fn require_company_admin(
    pool: &PgPool,
    auth: &AuthContext,
    company_id: Uuid,
) -> Result<User, AuthzError> {
    let caller = load_caller(pool, auth).await?;
    check_company_access(&caller, company_id, UserStatus::Admin)?;
    Ok(caller)
}

/// Requires the caller to be the given user
pub fn require_self(auth: &AuthContext, user_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != user_id {
        return Err(AuthzError::NotAuthorized);
    }

    Ok(())
}
