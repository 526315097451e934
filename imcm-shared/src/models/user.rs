/// User model and database operations
///
/// A user belongs to exactly one company (the tenant boundary). Users are
/// created `pending` by an invite, or directly as `admin` by the first-admin
/// registration of a company; accepting an invite moves them to `active`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_status AS ENUM ('pending', 'active', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID REFERENCES companies(id) ON DELETE CASCADE,
///     email VARCHAR(255) NOT NULL UNIQUE,          -- always lower case
///     password_hash VARCHAR(255),                   -- NULL while pending
///     first_name VARCHAR(150) NOT NULL DEFAULT '',
///     last_name VARCHAR(150) NOT NULL DEFAULT '',
///     phone VARCHAR(20),
///     status user_status NOT NULL DEFAULT 'pending',
///     is_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     otp_enabled BOOLEAN NOT NULL DEFAULT FALSE,
///     otp_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     otp_base32 VARCHAR(64),
///     otp_auth_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
///
/// CREATE UNIQUE INDEX users_pending_company_email_idx
///     ON users (company_id, email) WHERE status = 'pending';
/// ```
///
/// # Example
///
/// ```no_run
/// use imcm_shared::models::user::User;
/// use imcm_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(company_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// // Create (or fetch) the pending account an invite points at
/// let pending = User::upsert_pending(&pool, company_id, "agent@example.com").await?;
///
/// let roster = User::list_by_company(&pool, company_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Columns selected for every `User` query
const USER_COLUMNS: &str = "id, company_id, email, password_hash, first_name, last_name, phone, \
     status, is_verified, otp_enabled, otp_verified, otp_base32, otp_auth_url, \
     created_at, updated_at, last_login_at";

/// Account lifecycle status
///
/// Doubles as the permission level inside a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Invited, has not accepted yet. Cannot log in.
    Pending,

    /// Accepted an invite
    Active,

    /// Manages the company's users
    Admin,
}

impl UserStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Admin => "admin",
        }
    }

    /// Whether this status may invite, promote and remove users
    pub fn can_manage_users(&self) -> bool {
        matches!(self, UserStatus::Admin)
    }

    /// Whether an account in this status may sign in
    pub fn can_login(&self) -> bool {
        !matches!(self, UserStatus::Pending)
    }

    /// Checks if this status is at least the required one
    ///
    /// Hierarchy: Admin > Active > Pending
    pub fn has_permission(&self, required: &UserStatus) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            UserStatus::Admin => 3,
            UserStatus::Active => 2,
            UserStatus::Pending => 1,
        }
    }
}

/// User model representing an account within a company
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Owning company (None only for orphaned records)
    pub company_id: Option<Uuid>,

    /// Email address, unique across the system, stored lower case
    pub email: String,

    /// Argon2id password hash (None until the invite is accepted)
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Contact phone number
    pub phone: Option<String>,

    /// Lifecycle status
    pub status: UserStatus,

    /// Whether the account has been verified (invite accepted, email confirmed
    /// or created by first-admin registration)
    pub is_verified: bool,

    /// Two-factor authentication is switched on
    pub otp_enabled: bool,

    /// The user proved possession of the OTP secret at least once
    pub otp_verified: bool,

    /// Base32 TOTP shared secret (None when two-factor is disabled)
    #[serde(skip_serializing)]
    pub otp_base32: Option<String>,

    /// `otpauth://` provisioning URI for authenticator apps; embeds the secret
    #[serde(skip_serializing)]
    pub otp_auth_url: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a user directly (registration, fixtures)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Owning company
    pub company_id: Uuid,

    /// Email address (normalised to lower case on insert)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: Option<String>,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Contact phone number
    pub phone: Option<String>,

    /// Initial status
    pub status: UserStatus,

    /// Initial verification flag
    pub is_verified: bool,
}

/// Profile data applied when a pending user accepts an invite
#[derive(Debug, Clone)]
pub struct ActivateUser {
    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Contact phone number
    pub phone: Option<String>,

    /// Argon2id password hash
    pub password_hash: String,
}

/// Normalises an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Display name used in outbound mail
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already taken (`users_email_key`)
    /// or the database connection fails.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            INSERT INTO users (company_id, email, password_hash, first_name, last_name,
                               phone, status, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.company_id)
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.phone)
            .bind(data.status)
            .bind(data.is_verified)
            .fetch_one(executor)
            .await
    }

    /// Creates the pending account for `(company_id, email)` or returns the
    /// existing one, in a single statement
    ///
    /// The insert conflicts on the system-wide email constraint. The
    /// conflicting row is only returned when it is the pending account of
    /// the same company; an email used by any other account yields `None`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use imcm_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, company_id: Uuid) -> Result<(), sqlx::Error> {
    /// match User::upsert_pending(&pool, company_id, "new@example.com").await? {
    ///     Some(user) => println!("pending user {}", user.id),
    ///     None => println!("email belongs to another account"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upsert_pending<'e, E>(
        executor: E,
        company_id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            INSERT INTO users (company_id, email, status)
            VALUES ($1, $2, 'pending')
            ON CONFLICT (email) DO UPDATE
                SET updated_at = users.updated_at
                WHERE users.company_id = EXCLUDED.company_id
                  AND users.status = 'pending'
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(company_id)
            .bind(normalize_email(email))
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Finds the pending account for `(company_id, email)`
    ///
    /// Locks the row so that concurrent acceptances of the same invite
    /// serialize when run inside a transaction.
    pub async fn find_pending<'e, E>(
        executor: E,
        company_id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE company_id = $1 AND email = $2 AND status = 'pending'
            FOR UPDATE
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(company_id)
            .bind(normalize_email(email))
            .fetch_optional(executor)
            .await
    }

    /// Returns the earliest-created admin of a company
    pub async fn find_first_admin(
        pool: &PgPool,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE company_id = $1 AND status = 'admin'
            ORDER BY created_at ASC
            LIMIT 1
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists every user of a company (the roster), oldest first
    pub async fn list_by_company(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE company_id = $1
            ORDER BY created_at ASC, email ASC
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Checks whether a user with this ID exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Checks whether an account already uses this email
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(normalize_email(email))
            .fetch_one(pool)
            .await
    }

    /// Checks whether any verified user exists for a company
    pub async fn has_verified_user<'e, E>(executor: E, company_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE company_id = $1 AND is_verified = TRUE)",
        )
        .bind(company_id)
        .fetch_one(executor)
        .await
    }

    /// Turns a pending user into an active, verified one
    pub async fn activate<'e, E>(
        executor: E,
        id: Uuid,
        data: ActivateUser,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            UPDATE users
            SET status = 'active',
                is_verified = TRUE,
                first_name = $2,
                last_name = $3,
                phone = $4,
                password_hash = $5,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.phone)
            .bind(data.password_hash)
            .fetch_optional(executor)
            .await
    }

    /// Sets the user's status
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: UserStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Overwrites name and email
    ///
    /// # Errors
    ///
    /// Returns an error if the new email belongs to another account.
    pub async fn update_profile<'e, E>(
        executor: E,
        id: Uuid,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(first_name)
            .bind(last_name)
            .bind(normalize_email(email))
            .fetch_optional(executor)
            .await
    }

    /// Marks the account as verified
    pub async fn mark_verified(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Stores a freshly generated OTP secret and provisioning URI
    ///
    /// `otp_enabled` and `otp_verified` are left untouched.
    pub async fn set_otp_secret(
        pool: &PgPool,
        id: Uuid,
        otp_base32: &str,
        otp_auth_url: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users
            SET otp_base32 = $2, otp_auth_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(otp_base32)
            .bind(otp_auth_url)
            .fetch_optional(pool)
            .await
    }

    /// Switches two-factor on after a successful verification
    pub async fn enable_otp(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users
            SET otp_enabled = TRUE, otp_verified = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Clears the OTP secret, URI and both flags
    pub async fn disable_otp(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users
            SET otp_enabled = FALSE,
                otp_verified = FALSE,
                otp_base32 = NULL,
                otp_auth_url = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a single user of a company
    ///
    /// Returns true if a row was removed.
    pub async fn delete_in_company<'e, E>(
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every listed user that belongs to the company
    ///
    /// Returns the number of rows removed. IDs of other companies are ignored.
    pub async fn delete_many_in_company<'e, E>(
        executor: E,
        company_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM users WHERE company_id = $1 AND id = ANY($2)")
            .bind(company_id)
            .bind(ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Updates the last login timestamp for a user
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(status: UserStatus) -> User {
        User {
            id: Uuid::new_v4(),
            company_id: Some(Uuid::new_v4()),
            email: "agent@example.com".to_string(),
            password_hash: None,
            first_name: "Dana".to_string(),
            last_name: "Reyes".to_string(),
            phone: None,
            status,
            is_verified: false,
            otp_enabled: false,
            otp_verified: false,
            otp_base32: None,
            otp_auth_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_status_hierarchy() {
        assert!(UserStatus::Admin.has_permission(&UserStatus::Active));
        assert!(UserStatus::Active.has_permission(&UserStatus::Active));
        assert!(!UserStatus::Pending.has_permission(&UserStatus::Active));
        assert!(!UserStatus::Active.has_permission(&UserStatus::Admin));
    }

    #[test]
    fn test_status_capabilities() {
        assert!(UserStatus::Admin.can_manage_users());
        assert!(!UserStatus::Active.can_manage_users());
        assert!(!UserStatus::Pending.can_login());
        assert!(UserStatus::Active.can_login());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&UserStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let parsed: UserStatus = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, UserStatus::Admin);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Agent@Example.COM "), "agent@example.com");
    }

    #[test]
    fn test_full_name() {
        let mut user = sample_user(UserStatus::Admin);
        assert_eq!(user.full_name(), "Dana Reyes");

        user.last_name.clear();
        assert_eq!(user.full_name(), "Dana");
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut user = sample_user(UserStatus::Active);
        user.password_hash = Some("$argon2id$hash".to_string());
        user.otp_base32 = Some("JBSWY3DPEHPK3PXP".to_string());
        user.otp_auth_url = Some("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP".to_string());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("otp_base32").is_none());
        assert!(json.get("otp_auth_url").is_none());
        assert_eq!(json["status"], "active");
    }

    // Integration tests for database operations are in tests/accounts_tests.rs
}
