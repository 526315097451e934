/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Session (access/refresh) and email-verification tokens
/// - [`otp`]: TOTP secrets and code checks for two-factor login
/// - [`middleware`]: Axum bearer-token middleware producing [`middleware::AuthContext`]
/// - [`authorization`]: Company membership and status checks
///
/// # Example
///
/// ```no_run
/// use imcm_shared::auth::password::{hash_password, verify_password};
/// use imcm_shared::auth::jwt::issue_token_pair;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = issue_token_pair(Uuid::new_v4(), None, "a-secret-key-of-at-least-32-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod otp;
pub mod password;
