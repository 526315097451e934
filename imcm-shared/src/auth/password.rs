/// Password hashing with Argon2id
///
/// Passwords are set twice in an account's life: when the first admin
/// registers a company and when an invited user accepts. Both paths store
/// the PHC string produced here; login checks against it.
///
/// Parameters: 64 MB memory, 3 passes, 4 lanes, 32-byte output, random
/// 16-byte salt per call. Verification reads the parameters back from the
/// stored hash, so they can be raised later without invalidating accounts.
///
/// # Example
///
/// ```
/// use imcm_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("open sesame")?;
/// assert!(verify_password("open sesame", &hash)?);
/// assert!(!verify_password("open barley", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, ParamsBuilder, Version,
};

const MEMORY_KIB: u32 = 65536;
const ITERATIONS: u32 = 3;
const LANES: u32 = 4;
const OUTPUT_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Stored password hash is malformed: {0}")]
    InvalidHash(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),
}

fn params() -> Result<Params, PasswordError> {
    ParamsBuilder::new()
        .m_cost(MEMORY_KIB)
        .t_cost(ITERATIONS)
        .p_cost(LANES)
        .output_len(OUTPUT_LEN)
        .build()
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Hashes a plaintext password into a PHC string
///
/// # Errors
///
/// `PasswordError::Empty` for an empty password.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params()?);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks a plaintext password against a stored hash
///
/// Returns `Ok(false)` on mismatch; errors only for unusable hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}
