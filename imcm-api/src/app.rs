/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use imcm_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::from_config(pool, config)?;
/// let app = imcm_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::{Config, MailConfig};
use crate::middleware::{security::SecurityHeadersLayer, throttle::{anon_throttle_layer, AnonThrottle}};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use imcm_shared::auth::middleware::{jwt_auth_middleware, AuthError};
use imcm_shared::mail::{log::LogMailer, smtp::SmtpMailer, MailError, Mailer};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound mail
    pub mailer: Arc<dyn Mailer>,

    /// Throttle for the public routes
    pub throttle: AnonThrottle,
}

/// Picks the mailer for the configuration: SMTP when a host is set,
/// otherwise log only
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.smtp {
        Some(settings) => Ok(Arc::new(SmtpMailer::new(settings.clone())?)),
        None => {
            tracing::warn!("SMTP_HOST not set, outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let throttle = AnonThrottle::new(config.throttle.anon_requests_per_minute);

        Self {
            db,
            config: Arc::new(config),
            mailer,
            throttle,
        }
    }

    /// Creates state with the mailer the configuration asks for
    pub fn from_config(db: PgPool, config: Config) -> Result<Self, MailError> {
        let mailer = mailer_from_config(&config.mail)?;
        Ok(Self::new(db, config, mailer))
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check (public)
/// └── /v1/
///     ├── public, throttled per client
///     │   ├── POST /register
///     │   ├── POST /verify-registration
///     │   ├── GET  /confirmation/:token/:user_id
///     │   ├── POST /login
///     │   ├── POST /token/refresh
///     │   └── POST /invites/:token_id/accept
///     └── JWT required
///         ├── POST /companies/:company_id/invites
///         ├── GET  /companies/:company_id/users
///         ├── POST /users/:user_id/promote
///         ├── GET  /authenticated-user/:email
///         ├── POST | PUT | DELETE /manage-user/:id
///         └── POST /otp/{generate,verify,validate,disable}
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Throttle or JWT authentication (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/verify-registration", post(routes::auth::verify_registration))
        .route("/confirmation/:token/:user_id", get(routes::auth::confirmation))
        .route("/login", post(routes::auth::login))
        .route("/token/refresh", post(routes::auth::refresh))
        .route("/invites/:token_id/accept", post(routes::users::accept_invite))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            anon_throttle_layer,
        ));

    let authenticated_routes = Router::new()
        .route("/companies/:company_id/invites", post(routes::users::invite_user))
        .route("/companies/:company_id/users", get(routes::users::company_roster))
        .route("/users/:user_id/promote", post(routes::users::promote_user))
        .route("/authenticated-user/:email", get(routes::users::authenticated_user))
        .route(
            "/manage-user/:id",
            post(routes::users::manage_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_users),
        )
        .route("/otp/generate", post(routes::otp::generate))
        .route("/otp/verify", post(routes::otp::verify))
        .route("/otp/validate", post(routes::otp::validate))
        .route("/otp/disable", post(routes::otp::disable))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(authenticated_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token and injects
/// [`AuthContext`](imcm_shared::auth::middleware::AuthContext) into the
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    jwt_auth_middleware(state.jwt_secret().to_string(), req, next).await
}
