/// Configuration management for the API server
///
/// This module loads configuration from environment variables into an
/// explicit [`Config`] that is handed to the router; nothing is read from
/// the environment after startup.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:8080)
/// - `CORS_ORIGINS`: comma separated origins, `*` for any (default: *)
/// - `PRODUCTION`: `true` enables HSTS (default: false)
/// - `JWT_SECRET`: signs session and email verification tokens (required, ≥ 32 chars)
/// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `MAIL_FROM`:
///   outbound mail; without `SMTP_HOST` mail is only logged
/// - `APP_BASE_URL`, `LOGIN_REDIRECT_URL`, `INVITE_TTL_HOURS`, `OTP_ISSUER`,
///   `VERIFICATION_TTL_HOURS`: account workflow settings
/// - `ANON_REQUESTS_PER_MINUTE`: throttle for public routes (default: 30)
///
/// # Example
///
/// ```no_run
/// use imcm_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use imcm_shared::accounts::AccountsConfig;
use imcm_shared::mail::smtp::SmtpSettings;
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub accounts: AccountsConfig,
    pub throttle: ThrottleConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` = permissive)
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Outbound mail configuration
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    /// SMTP relay; `None` logs mail instead of sending it
    pub smtp: Option<SmtpSettings>,
}

/// Throttle for unauthenticated routes
#[derive(Debug, Clone, Copy)]
pub struct ThrottleConfig {
    pub anon_requests_per_minute: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            anon_requests_per_minute: 30,
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(name, default)
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{} has an invalid value: {}", name, e))
}

/// Splits a comma separated origin list
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpSettings {
                host,
                port: parse_var("SMTP_PORT", "587")?,
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
                from: env::var("MAIL_FROM").map_err(|_| {
                    anyhow::anyhow!("MAIL_FROM environment variable is required with SMTP_HOST")
                })?,
            }),
            _ => None,
        };

        let defaults = AccountsConfig::default();
        let accounts = AccountsConfig {
            app_base_url: var_or("APP_BASE_URL", &defaults.app_base_url),
            login_redirect_url: var_or("LOGIN_REDIRECT_URL", &defaults.login_redirect_url),
            invite_ttl_hours: parse_var("INVITE_TTL_HOURS", &defaults.invite_ttl_hours.to_string())?,
            otp_issuer: var_or("OTP_ISSUER", &defaults.otp_issuer),
            verification_ttl_hours: parse_var(
                "VERIFICATION_TTL_HOURS",
                &defaults.verification_ttl_hours.to_string(),
            )?,
        };

        let anon_requests_per_minute: u32 = parse_var("ANON_REQUESTS_PER_MINUTE", "30")?;
        if anon_requests_per_minute == 0 {
            anyhow::bail!("ANON_REQUESTS_PER_MINUTE must be greater than zero");
        }

        Ok(Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: parse_var("API_PORT", "8080")?,
                cors_origins: parse_origins(&var_or("CORS_ORIGINS", "*")),
                production: parse_var("PRODUCTION", "false")?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "10")?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            mail: MailConfig { smtp },
            accounts,
            throttle: ThrottleConfig {
                anon_requests_per_minute,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            mail: MailConfig::default(),
            accounts: AccountsConfig::default(),
            throttle: ThrottleConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://app.ismycustomermoving.com, ,http://localhost:3000 "),
            vec!["https://app.ismycustomermoving.com", "http://localhost:3000"]
        );
        assert!(parse_origins("").is_empty());
    }
}
