/// JWT authentication middleware for Axum
///
/// Validates `Authorization: Bearer <access token>` and inserts an
/// [`AuthContext`] into the request extensions for handlers to extract.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, response::Response, routing::get, Extension, Router};
/// use imcm_shared::auth::middleware::{jwt_auth_middleware, AuthContext, AuthError};
///
/// async fn auth(req: Request, next: Next) -> Result<Response, AuthError> {
///     jwt_auth_middleware("secret".to_string(), req, next).await
/// }
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     format!("user {}", auth.user_id)
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(auth));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};

/// Identity of the caller of an authenticated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Company claimed by the token; authorization re-reads the user record
    pub company_id: Option<Uuid>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            company_id: claims.company_id,
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    InvalidFormat(String),
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication credentials were not provided".to_string(),
            ),
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
        };

        (
            status,
            Json(serde_json::json!({ "error": error, "message": message })),
        )
            .into_response()
    }
}

/// Extracts the bearer token from an `Authorization` header value
pub fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = bearer_token(header_value)?;

    let claims = validate_access_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
