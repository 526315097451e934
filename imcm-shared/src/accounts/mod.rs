/// Account workflows
///
/// Each workflow takes the pool, and where needed the [`AccountsConfig`]
/// and a [`Mailer`](crate::mail::Mailer), as explicit arguments.
///
/// - [`invite`]: inviting users, accepting invites, promoting, editing and
///   removing users, the company roster
/// - [`registration`]: first-admin signup gated by the company access token
/// - [`two_factor`]: TOTP generate / verify / validate / disable
/// - [`confirmation`]: email verification tokens
/// - [`session`]: password login
///
/// All of them fail with [`AccountError`].

pub mod confirmation;
pub mod error;
pub mod invite;
pub mod registration;
pub mod session;
pub mod two_factor;

pub use error::AccountError;

use chrono::Duration;
use uuid::Uuid;

use crate::models::invite_token::DEFAULT_INVITE_TTL_HOURS;

/// Settings shared by the account workflows
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// Front-end base URL; invite links point at `{app_base_url}/addeduser/{token}`
    pub app_base_url: String,

    /// Where a confirmed email address is redirected
    pub login_redirect_url: String,

    pub invite_ttl_hours: i64,

    /// Issuer shown by authenticator apps
    pub otp_issuer: String,

    pub verification_ttl_hours: i64,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            app_base_url: "https://app.ismycustomermoving.com".to_string(),
            login_redirect_url: "http://www.ismycustomermoving.com/login".to_string(),
            invite_ttl_hours: DEFAULT_INVITE_TTL_HOURS,
            otp_issuer: "Is My Customer Moving".to_string(),
            verification_ttl_hours: 24,
        }
    }
}

impl AccountsConfig {
    pub fn invite_ttl(&self) -> Duration {
        Duration::hours(self.invite_ttl_hours)
    }

    pub fn verification_ttl(&self) -> Duration {
        Duration::hours(self.verification_ttl_hours)
    }

    /// Link the invitee follows to accept
    pub fn invite_link(&self, token_id: Uuid) -> String {
        format!("{}/addeduser/{}", self.app_base_url.trim_end_matches('/'), token_id)
    }
}
