/// First-admin registration
///
/// A company is provisioned with an access token. Whoever presents the
/// company name together with that token becomes its first admin, already
/// verified. Once the company has any verified user the token is spent:
/// later attempts fail with `AccessTokenAlreadyUsed` and create nothing.
///
/// The company row is locked for the duration of the check-and-create, so
/// two concurrent registrations cannot both become first admin.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use super::error::is_unique_violation;
use super::AccountError;
use crate::auth::password::hash_password;
use crate::models::company::Company;
use crate::models::user::{normalize_email, CreateUser, User, UserStatus};

/// Registration form; every field is required
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterAdmin {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,

    /// Company name
    pub company: Option<String>,

    pub access_token: Option<String>,
    pub phone: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Lists one message per missing field, in form order
pub fn missing_fields(form: &RegisterAdmin) -> Vec<String> {
    let checks = [
        (&form.first_name, "first_name can't be empty"),
        (&form.last_name, "last_name can't be empty"),
        (&form.email, "Email can't be empty"),
        (&form.password, "Password can't be empty"),
        (&form.company, "Company can't be empty"),
        (&form.access_token, "Access Token can't be empty"),
        (&form.phone, "Phone can't be empty"),
    ];

    checks
        .iter()
        .filter(|(field, _)| present(field).is_none())
        .map(|(_, message)| message.to_string())
        .collect()
}

/// Registers the first admin of a company
///
/// # Errors
///
/// - `Validation` listing every missing field, plus a message when the
///   email is already registered
/// - `NotFound` if no company matches both name and access token
/// - `AccessTokenAlreadyUsed` if the company already has a verified user
pub async fn register_admin(pool: &PgPool, form: RegisterAdmin) -> Result<User, AccountError> {
    let mut errors = missing_fields(&form);

    if let Some(email) = present(&form.email) {
        if User::email_exists(pool, email).await? {
            errors.push("Account already exists with this email id.".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(AccountError::Validation(errors));
    }

    // All present after the check above
    let field = |f: &Option<String>| present(f).unwrap_or_default().to_string();
    let email = normalize_email(&field(&form.email));
    let company_name = field(&form.company);
    let access_token = field(&form.access_token);

    let company = Company::find_by_name_and_access_token(pool, &company_name, &access_token)
        .await?
        .ok_or(AccountError::NotFound("Company"))?;

    let password_hash = hash_password(form.password.as_deref().unwrap_or_default())?;

    let mut tx = pool.begin().await?;

    Company::lock(&mut *tx, company.id)
        .await?
        .ok_or(AccountError::NotFound("Company"))?;

    if User::has_verified_user(&mut *tx, company.id).await? {
        warn!(company_id = %company.id, "Registration with an already used access token");
        return Err(AccountError::AccessTokenAlreadyUsed);
    }

    let user = User::create(
        &mut *tx,
        CreateUser {
            company_id: company.id,
            email: email.clone(),
            password_hash: Some(password_hash),
            first_name: field(&form.first_name),
            last_name: field(&form.last_name),
            phone: Some(field(&form.phone)),
            status: UserStatus::Admin,
            is_verified: true,
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AccountError::EmailInUse(email.clone())
        } else {
            AccountError::Database(e)
        }
    })?;

    tx.commit().await?;

    info!(user_id = %user.id, company_id = %company.id, "First admin registered");
    Ok(user)
}
