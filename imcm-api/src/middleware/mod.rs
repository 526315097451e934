/// Middleware modules for the API server
///
/// - `security`: security headers on every response
/// - `throttle`: per-client rate limit on the public routes
///
/// JWT authentication lives in `imcm_shared::auth::middleware`.

pub mod security;
pub mod throttle;
