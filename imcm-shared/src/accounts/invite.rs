/// Invite and onboarding workflow
///
/// ```text
///   invite_user ──► pending user + invite token ──► mail (invite / reminder)
///                              │
///   accept_invite ─────────────┘──► active, verified user; token deleted
/// ```
///
/// Inviting the same `(company, email)` again renews the single existing
/// token instead of creating another one, and sends a reminder. Pending-user
/// creation and token issue run in one transaction, so a token never exists
/// without its pending user.
///
/// The remaining user-management operations (promote, update, delete,
/// roster) live here too, as does [`resolve_target`] for the legacy route
/// that multiplexes them on one id.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::is_unique_violation;
use super::{AccountError, AccountsConfig};
use crate::auth::password::hash_password;
use crate::mail::{Mailer, OutgoingMail};
use crate::models::company::Company;
use crate::models::invite_token::InviteToken;
use crate::models::user::{normalize_email, ActivateUser, User, UserStatus};

pub const INVITE_SUBJECT: &str = "Account Invite For Is My Customer Moving";
pub const REMINDER_SUBJECT: &str = "Invite Reminder For Is My Customer Moving";

/// Result of [`invite_user`]
#[derive(Debug, Clone)]
pub struct InviteOutcome {
    pub token: InviteToken,

    /// True when an existing invite was renewed
    pub renewed: bool,

    /// Every user of the company after the invite
    pub roster: Vec<User>,
}

/// Data submitted by the invitee
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcceptInvite {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub password: String,
}

impl AcceptInvite {
    fn missing_fields(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.email.trim().is_empty() {
            errors.push("Email can't be empty".to_string());
        }
        if self.first_name.trim().is_empty() {
            errors.push("first_name can't be empty".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.push("last_name can't be empty".to_string());
        }
        if self.password.is_empty() {
            errors.push("Password can't be empty".to_string());
        }

        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Which kind of record an id passed to the legacy manage-user route names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageTarget {
    Company(Uuid),
    InviteToken(Uuid),
    User(Uuid),
}

fn check_email(email: &str) -> Result<String, AccountError> {
    let email = normalize_email(email);

    if email.is_empty() {
        return Err(AccountError::validation("Email can't be empty"));
    }
    if !email.contains('@') {
        return Err(AccountError::validation(format!("{email} is not a valid email address")));
    }

    Ok(email)
}

/// Escapes text for interpolation into HTML
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Composes the invite (or reminder) mail sent on behalf of `admin`
pub fn invite_mail(
    config: &AccountsConfig,
    admin: &User,
    to: &str,
    token_id: Uuid,
    renewed: bool,
) -> OutgoingMail {
    let link = config.invite_link(token_id);
    let inviter = admin.full_name();
    let subject = if renewed { REMINDER_SUBJECT } else { INVITE_SUBJECT };

    OutgoingMail {
        to: to.to_string(),
        subject: subject.to_string(),
        text_body: format!(
            "You have been invited to join Is My Customer Moving by {inviter}. \
             Please click the link below to join. {link}"
        ),
        html_body: format!(
            "<p>You have been invited to join <strong>Is My Customer Moving</strong> by {}.</p>\
             <p><a href=\"{}\">Join your team</a></p>",
            escape_html(&inviter),
            escape_html(&link),
        ),
    }
}

/// Invites `email` to the company
///
/// # Errors
///
/// - `NotFound` if the company does not exist
/// - `NoCompanyAdmin` if it has no admin to send the invite on behalf of
/// - `EmailInUse` if the email belongs to an account other than this
///   company's pending invitee
/// - `Mail` if the message cannot be delivered (the invite itself is kept;
///   inviting again renews it and resends)
pub async fn invite_user(
    pool: &PgPool,
    mailer: &dyn Mailer,
    config: &AccountsConfig,
    company_id: Uuid,
    email: &str,
) -> Result<InviteOutcome, AccountError> {
    let email = check_email(email)?;

    if !Company::exists(pool, company_id).await? {
        return Err(AccountError::NotFound("Company"));
    }

    let admin = User::find_first_admin(pool, company_id)
        .await?
        .ok_or(AccountError::NoCompanyAdmin)?;

    let mut tx = pool.begin().await?;

    let pending = User::upsert_pending(&mut *tx, company_id, &email)
        .await?
        .ok_or_else(|| AccountError::EmailInUse(email.clone()))?;

    let issued = InviteToken::issue(&mut *tx, company_id, &email, config.invite_ttl()).await?;

    tx.commit().await?;

    let renewed = !issued.created;
    info!(
        company_id = %company_id,
        user_id = %pending.id,
        token_id = %issued.token.id,
        renewed,
        "Invite issued"
    );

    mailer
        .send(invite_mail(config, &admin, &email, issued.token.id, renewed))
        .await?;

    let roster = User::list_by_company(pool, company_id).await?;

    Ok(InviteOutcome {
        token: issued.token,
        renewed,
        roster,
    })
}

/// Activates the pending user an invite points at
///
/// # Errors
///
/// - `Validation` for missing fields
/// - `NotFound` if no token with this id was issued to `data.email`
///   (including tokens already consumed)
/// - `TokenExpired` if the token is past its expiry; the user stays pending
/// - `UserNotFound` if no pending user matches the token
pub async fn accept_invite(
    pool: &PgPool,
    token_id: Uuid,
    data: AcceptInvite,
) -> Result<User, AccountError> {
    let errors = data.missing_fields();
    if !errors.is_empty() {
        return Err(AccountError::Validation(errors));
    }

    let token = InviteToken::find_for_email(pool, token_id, &data.email)
        .await?
        .ok_or(AccountError::NotFound("Invite token"))?;

    if token.is_expired() {
        warn!(token_id = %token.id, company_id = %token.company_id, "Expired invite token used");
        return Err(AccountError::TokenExpired);
    }

    let password_hash = hash_password(&data.password)?;

    let mut tx = pool.begin().await?;

    let pending = User::find_pending(&mut *tx, token.company_id, &token.email)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    let user = User::activate(
        &mut *tx,
        pending.id,
        ActivateUser {
            first_name: data.first_name.trim().to_string(),
            last_name: data.last_name.trim().to_string(),
            phone: data.phone.filter(|p| !p.trim().is_empty()),
            password_hash,
        },
    )
    .await?
    .ok_or(AccountError::UserNotFound)?;

    if !InviteToken::delete(&mut *tx, token.id).await? {
        return Err(AccountError::NotFound("Invite token"));
    }

    tx.commit().await?;

    info!(user_id = %user.id, company_id = %token.company_id, "Invite accepted, user activated");
    Ok(user)
}

/// Makes a user an admin of their company and returns the company roster
///
/// Pending users have to accept their invite first.
pub async fn promote_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<User>, AccountError> {
    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    if user.status == UserStatus::Pending {
        return Err(AccountError::validation(
            "Only users who accepted their invite can be promoted",
        ));
    }

    let promoted = User::set_status(pool, user.id, UserStatus::Admin)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    info!(user_id = %promoted.id, company_id = ?promoted.company_id, "User promoted to admin");

    match promoted.company_id {
        Some(company_id) => Ok(User::list_by_company(pool, company_id).await?),
        None => Ok(vec![promoted]),
    }
}

/// Overwrites a user's names and email
///
/// A pending invitee's token follows the new address, so the user and
/// their invite stay matched.
pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    data: UpdateUser,
) -> Result<User, AccountError> {
    let mut errors = Vec::new();
    if data.first_name.trim().is_empty() {
        errors.push("first_name can't be empty".to_string());
    }
    if data.last_name.trim().is_empty() {
        errors.push("last_name can't be empty".to_string());
    }
    if !errors.is_empty() {
        return Err(AccountError::Validation(errors));
    }
    let email = check_email(&data.email)?;

    let current = User::find_by_id(pool, user_id)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    let mut tx = pool.begin().await?;

    let updated = User::update_profile(
        &mut *tx,
        user_id,
        data.first_name.trim(),
        data.last_name.trim(),
        &email,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AccountError::EmailInUse(email.clone())
        } else {
            AccountError::Database(e)
        }
    })?
    .ok_or(AccountError::UserNotFound)?;

    if let (UserStatus::Pending, Some(company_id)) = (updated.status, updated.company_id) {
        if current.email != updated.email {
            InviteToken::change_email(&mut *tx, company_id, &current.email, &updated.email)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AccountError::EmailInUse(email.clone())
                    } else {
                        AccountError::Database(e)
                    }
                })?;
        }
    }

    tx.commit().await?;

    Ok(updated)
}

/// Removes users from a company and returns what is left of its roster
///
/// Ids of other companies' users are ignored. A single id that matches no
/// user of the company is `NotFound`.
pub async fn delete_users(
    pool: &PgPool,
    company_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<User>, AccountError> {
    if ids.is_empty() {
        return Err(AccountError::validation("No user ids given"));
    }

    let mut tx = pool.begin().await?;

    // Pending invitees take their invite with them
    let revoked = InviteToken::delete_for_pending_users(&mut *tx, company_id, ids).await?;

    match ids {
        [id] => {
            if !User::delete_in_company(&mut *tx, company_id, *id).await? {
                return Err(AccountError::NotFound("User"));
            }
        }
        many => {
            let removed = User::delete_many_in_company(&mut *tx, company_id, many).await?;
            info!(company_id = %company_id, requested = many.len(), removed, "Users removed");
        }
    }

    tx.commit().await?;

    if revoked > 0 {
        info!(company_id = %company_id, revoked, "Invites revoked with their pending users");
    }

    Ok(User::list_by_company(pool, company_id).await?)
}

/// Every user of the company
pub async fn company_roster(pool: &PgPool, company_id: Uuid) -> Result<Vec<User>, AccountError> {
    if !Company::exists(pool, company_id).await? {
        return Err(AccountError::NotFound("Company"));
    }

    Ok(User::list_by_company(pool, company_id).await?)
}

/// Resolves an id in the order Company, InviteToken, User
pub async fn resolve_target(pool: &PgPool, id: Uuid) -> Result<ManageTarget, AccountError> {
    if Company::exists(pool, id).await? {
        return Ok(ManageTarget::Company(id));
    }
    if InviteToken::exists(pool, id).await? {
        return Ok(ManageTarget::InviteToken(id));
    }
    if User::exists(pool, id).await? {
        return Ok(ManageTarget::User(id));
    }

    Err(AccountError::NotFound("User"))
}
