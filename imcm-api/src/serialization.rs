/// JSON representations of users
///
/// Three shapes, all camelCase:
///
/// - [`UserListItem`]: roster entries
/// - [`UserProfile`]: list fields plus company and two-factor flags
/// - [`UserWithToken`]: profile plus a fresh access/refresh token pair,
///   returned wherever the client ends up acting as the user (registration,
///   login, invite acceptance, OTP operations, profile update)
///
/// The provisioning URI carries the TOTP secret. Only the owner's
/// `otp/generate` response includes it.

use chrono::{DateTime, Utc};
use imcm_shared::auth::jwt::{issue_token_pair, JwtError};
use imcm_shared::models::user::{User, UserStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: UserListItem,

    /// Company id
    pub company: Option<Uuid>,

    pub otp_enabled: bool,
    pub otp_verified: bool,

    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithToken {
    #[serde(flatten)]
    pub profile: UserProfile,

    /// Access token (24h)
    pub access: String,

    /// Refresh token (30d)
    pub refresh: String,

    /// Provisioning URI, set only on the owner's OTP generate response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_auth_url: Option<String>,
}

impl From<&User> for UserListItem {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            status: user.status,
            is_verified: user.is_verified,
        }
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user: UserListItem::from(user),
            company: user.company_id,
            otp_enabled: user.otp_enabled,
            otp_verified: user.otp_verified,
            last_login_at: user.last_login_at,
        }
    }
}

impl UserWithToken {
    /// Serializes the user with a newly signed token pair
    pub fn issue(user: &User, secret: &str) -> Result<Self, JwtError> {
        let tokens = issue_token_pair(user.id, user.company_id, secret)?;

        Ok(Self {
            profile: UserProfile::from(user),
            access: tokens.access,
            refresh: tokens.refresh,
            otp_auth_url: None,
        })
    }

    /// Adds the user's provisioning URI for the authenticator app
    pub fn with_otp_auth_url(mut self, user: &User) -> Self {
        self.otp_auth_url = user.otp_auth_url.clone();
        self
    }
}

/// Roster representation
pub fn roster(users: &[User]) -> Vec<UserListItem> {
    users.iter().map(UserListItem::from).collect()
}
