use crate::auth::jwt::JwtError;
use crate::auth::otp::OtpError;
use crate::auth::password::PasswordError;
use crate::mail::MailError;

/// Failure of an account workflow
///
/// Domain outcomes (expired token, reused access token, wrong OTP, …) have
/// their own variants; infrastructure failures wrap the underlying error.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Missing or invalid input, one message per problem
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The named entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// No user matches (pending user for an invite, or the user id given)
    #[error("Cannot find user")]
    UserNotFound,

    #[error("Token Expired")]
    TokenExpired,

    #[error("Access Token Already Used. Ask an admin to login and create profile for you.")]
    AccessTokenAlreadyUsed,

    #[error("Email {0} is already used by another account")]
    EmailInUse(String),

    #[error("Company has no admin to send invites")]
    NoCompanyAdmin,

    #[error("OTP not generated for this user")]
    OtpNotGenerated,

    #[error("{0}")]
    OtpVerificationFailed(&'static str),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Email verification token past its expiry
    #[error("Activation Expired")]
    ActivationExpired,

    /// Email verification token that does not decode
    #[error("Invalid token")]
    InvalidVerificationToken,

    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AccountError {
    pub fn validation(message: impl Into<String>) -> Self {
        AccountError::Validation(vec![message.into()])
    }
}

/// Whether a database error is a unique-constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_joins_errors() {
        let err = AccountError::Validation(vec![
            "Email can't be empty".to_string(),
            "Password can't be empty".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: Email can't be empty; Password can't be empty"
        );
    }

    #[test]
    fn test_domain_messages() {
        assert_eq!(AccountError::NotFound("Invite token").to_string(), "Invite token not found");
        assert_eq!(AccountError::TokenExpired.to_string(), "Token Expired");
        assert_eq!(
            AccountError::OtpVerificationFailed("One Time Password incorrect").to_string(),
            "One Time Password incorrect"
        );
    }

    #[test]
    fn test_row_not_found_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
