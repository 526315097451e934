/// Time-based one-time passwords (RFC 6238)
///
/// SHA-1, 6 digits, 30 second step: the parameters authenticator apps
/// assume when scanning an `otpauth://` URI. Secrets are 20 random bytes
/// kept in base32.
///
/// Two windows are used:
///
/// - [`verify_code`] (enrolment): the current step only.
/// - [`validate_code`] (login): one adjacent step either side.

use rand::Rng;
use totp_rs::{Algorithm, Secret, TOTP};

const DIGITS: usize = 6;
const STEP_SECONDS: u64 = 30;
const SECRET_BYTES: usize = 20;

const VERIFY_SKEW: u8 = 0;
const VALIDATE_SKEW: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Stored OTP secret is not valid base32: {0}")]
    InvalidSecret(String),

    #[error("Cannot build provisioning URI: {0}")]
    InvalidAccount(String),
}

/// A freshly generated shared secret and its provisioning URI
#[derive(Debug, Clone)]
pub struct OtpSecret {
    pub base32: String,
    pub auth_url: String,
}

/// Generates a new random secret for `account` (the user's email)
pub fn generate_secret(issuer: &str, account: &str) -> Result<OtpSecret, OtpError> {
    let mut bytes = vec![0u8; SECRET_BYTES];
    rand::thread_rng().fill(bytes.as_mut_slice());

    let totp = TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        VERIFY_SKEW,
        STEP_SECONDS,
        bytes,
        Some(issuer.to_string()),
        account.to_lowercase(),
    )
    .map_err(|e| OtpError::InvalidAccount(e.to_string()))?;

    Ok(OtpSecret {
        base32: totp.get_secret_base32(),
        auth_url: totp.get_url(),
    })
}

fn totp_from_base32(base32: &str, skew: u8) -> Result<TOTP, OtpError> {
    let bytes = Secret::Encoded(base32.to_string())
        .to_bytes()
        .map_err(|e| OtpError::InvalidSecret(format!("{:?}", e)))?;

    TOTP::new(Algorithm::SHA1, DIGITS, skew, STEP_SECONDS, bytes, None, String::new())
        .map_err(|e| OtpError::InvalidSecret(e.to_string()))
}

/// Checks `code` against the step containing `unix_time`
pub fn verify_code(base32: &str, code: &str, unix_time: u64) -> Result<bool, OtpError> {
    Ok(totp_from_base32(base32, VERIFY_SKEW)?.check(code.trim(), unix_time))
}

/// Checks `code` against the step containing `unix_time` and its neighbours
pub fn validate_code(base32: &str, code: &str, unix_time: u64) -> Result<bool, OtpError> {
    Ok(totp_from_base32(base32, VALIDATE_SKEW)?.check(code.trim(), unix_time))
}

/// The code an authenticator would show at `unix_time`
pub fn code_at(base32: &str, unix_time: u64) -> Result<String, OtpError> {
    Ok(totp_from_base32(base32, VERIFY_SKEW)?.generate(unix_time))
}

/// Current Unix time in seconds
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUER: &str = "Is My Customer Moving";
    // Middle of a step so neighbouring-step arithmetic is unambiguous
    const T: u64 = 1_700_000_015;

    #[test]
    fn test_generated_secret_shape() {
        let secret = generate_secret(ISSUER, "Agent@Example.com").unwrap();

        assert_eq!(secret.base32.len(), 32);
        assert!(secret.auth_url.starts_with("otpauth://totp/"));
        assert!(secret.auth_url.contains(&format!("secret={}", secret.base32)));
        assert!(secret.auth_url.contains("issuer="));
        assert!(secret.auth_url.contains("agent%40example.com"));
    }

    #[test]
    fn test_secrets_are_random() {
        let a = generate_secret(ISSUER, "a@example.com").unwrap();
        let b = generate_secret(ISSUER, "a@example.com").unwrap();
        assert_ne!(a.base32, b.base32);
    }

    #[test]
    fn test_verify_current_step_only() {
        let secret = generate_secret(ISSUER, "a@example.com").unwrap().base32;

        let current = code_at(&secret, T).unwrap();
        let previous = code_at(&secret, T - STEP_SECONDS).unwrap();

        assert_eq!(current.len(), DIGITS);
        assert!(verify_code(&secret, &current, T).unwrap());
        if previous != current {
            assert!(!verify_code(&secret, &previous, T).unwrap());
        }
    }

    #[test]
    fn test_validate_accepts_adjacent_steps() {
        let secret = generate_secret(ISSUER, "a@example.com").unwrap().base32;

        let previous = code_at(&secret, T - STEP_SECONDS).unwrap();
        let next = code_at(&secret, T + STEP_SECONDS).unwrap();
        let stale = code_at(&secret, T - 3 * STEP_SECONDS).unwrap();

        assert!(validate_code(&secret, &previous, T).unwrap());
        assert!(validate_code(&secret, &next, T).unwrap());

        let window: Vec<String> = (0..3)
            .map(|i| code_at(&secret, T - STEP_SECONDS + i * STEP_SECONDS).unwrap())
            .collect();
        if !window.contains(&stale) {
            assert!(!validate_code(&secret, &stale, T).unwrap());
        }
    }

    #[test]
    fn test_wrong_code_rejected() {
        let secret = generate_secret(ISSUER, "a@example.com").unwrap().base32;
        let current = code_at(&secret, T).unwrap();
        let wrong = if current == "000000" { "111111" } else { "000000" };

        assert!(!verify_code(&secret, wrong, T).unwrap());
        assert!(!verify_code(&secret, "not-a-code", T).unwrap());
    }

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(
            verify_code("not base32 !!", "123456", T),
            Err(OtpError::InvalidSecret(_))
        ));
    }
}
