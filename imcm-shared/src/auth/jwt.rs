/// JWT session and email-verification tokens
///
/// Two kinds of HS256 tokens are signed with the same server secret:
///
/// - **Session tokens** ([`Claims`]): an access token (24 h) authenticating
///   API calls and a refresh token (30 d) exchanging for new access tokens.
///   They carry the user ID as subject, the user's company and the token
///   type, and are issued by `imcm`.
/// - **Verification tokens** ([`VerificationClaims`]): `{user_id, exp}`,
///   sent out of band to confirm an email address.
///
/// # Example
///
/// ```
/// use imcm_shared::auth::jwt::{issue_token_pair, validate_access_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-very-long-secret-key-of-32-bytes!";
/// let user_id = Uuid::new_v4();
///
/// let pair = issue_token_pair(user_id, Some(Uuid::new_v4()), secret)?;
/// let claims = validate_access_token(&pair.access, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Issuer of session tokens
pub const ISSUER: &str = "imcm";

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Invalid token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Expected {expected} token, got {actual} token")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    /// Always [`ISSUER`]
    pub iss: String,

    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,

    /// Company the user belonged to when the token was issued
    pub company_id: Option<Uuid>,

    pub token_type: TokenType,
}

impl Claims {
    /// Claims with the default lifetime of the token type
    pub fn new(user_id: Uuid, company_id: Option<Uuid>, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, company_id, token_type, token_type.default_expiration())
    }

    pub fn with_expiration(
        user_id: Uuid,
        company_id: Option<Uuid>,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            company_id,
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Access and refresh token issued together at login, registration and
/// invite acceptance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str, validation: &Validation) -> Result<T, JwtError> {
    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::ValidationError(e.to_string()),
        })
}

/// Signs session claims
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    sign(claims, secret)
}

/// Checks signature, expiration, not-before and issuer of a session token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;

    verify(token, secret, &validation)
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongTokenType {
            expected: expected.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Access)
}

pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Refresh)
}

/// Issues a fresh access/refresh pair for a user
pub fn issue_token_pair(
    user_id: Uuid,
    company_id: Option<Uuid>,
    secret: &str,
) -> Result<TokenPair, JwtError> {
    Ok(TokenPair {
        access: create_token(&Claims::new(user_id, company_id, TokenType::Access), secret)?,
        refresh: create_token(&Claims::new(user_id, company_id, TokenType::Refresh), secret)?,
    })
}

/// Exchanges a valid refresh token for a new access token
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let refresh = validate_refresh_token(refresh_token, secret)?;

    create_token(
        &Claims::new(refresh.sub, refresh.company_id, TokenType::Access),
        secret,
    )
}

/// Email-verification token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub user_id: Uuid,
    pub exp: i64,
}

impl VerificationClaims {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Issues a token confirming `user_id`'s email, valid for `ttl`
pub fn issue_verification_token(user_id: Uuid, ttl: Duration, secret: &str) -> Result<String, JwtError> {
    let claims = VerificationClaims {
        user_id,
        exp: (Utc::now() + ttl).timestamp(),
    };

    sign(&claims, secret)
}

/// Decodes a verification token, rejecting expired ones with `JwtError::Expired`
pub fn validate_verification_token(token: &str, secret: &str) -> Result<VerificationClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    verify(token, secret, &validation)
}

/// Decodes a verification token checking only its signature
///
/// The caller decides what an expired token means (see
/// [`VerificationClaims::is_expired`]).
pub fn decode_verification_token(token: &str, secret: &str) -> Result<VerificationClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    verify(token, secret, &validation)
}
