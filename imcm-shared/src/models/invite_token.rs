/// Invite token model and database operations
///
/// An invite token binds a prospective user's email to a company and
/// authorizes activating the matching pending account. There is at most one
/// token per `(company, email)`: inviting again renews the expiration of the
/// existing token instead of creating a second one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invite_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     email VARCHAR(255) NOT NULL,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (company_id, email)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use imcm_shared::models::invite_token::InviteToken;
/// use chrono::Duration;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, company_id: Uuid) -> Result<(), sqlx::Error> {
/// let issued = InviteToken::issue(&pool, company_id, "agent@example.com", Duration::hours(24)).await?;
/// if issued.created {
///     println!("new invite {}", issued.token.id);
/// } else {
///     println!("renewed invite {} until {}", issued.token.id, issued.token.expires_at);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::user::normalize_email;

/// Default lifetime of an invite, from creation or renewal
pub const DEFAULT_INVITE_TTL_HOURS: i64 = 24;

/// Invite token model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InviteToken {
    /// Token ID, sent to the invitee as part of the accept link
    pub id: Uuid,

    /// Inviting company
    pub company_id: Uuid,

    /// Invitee email (lower case)
    pub email: String,

    /// Token is unusable from this instant on
    pub expires_at: DateTime<Utc>,

    /// When the token was first issued
    pub created_at: DateTime<Utc>,
}

/// Result of issuing an invite
#[derive(Debug, Clone)]
pub struct IssuedInvite {
    /// The live token
    pub token: InviteToken,

    /// True when a new token was created, false when an existing one was renewed
    pub created: bool,
}

impl InviteToken {
    /// Checks whether the token has expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Checks whether the token has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Creates the token for `(company_id, email)` or renews the existing one
    ///
    /// Either way the expiration becomes `now + ttl`. Runs as a single
    /// conditional insert so concurrent invites for the same email converge
    /// on one row.
    pub async fn issue<'e, E>(
        executor: E,
        company_id: Uuid,
        email: &str,
        ttl: Duration,
    ) -> Result<IssuedInvite, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let expires_at = Utc::now() + ttl;

        let (id, company_id, email, expires_at, created_at, created): (
            Uuid,
            Uuid,
            String,
            DateTime<Utc>,
            DateTime<Utc>,
            bool,
        ) = sqlx::query_as(
            r#"
            INSERT INTO invite_tokens (company_id, email, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (company_id, email) DO UPDATE
                SET expires_at = EXCLUDED.expires_at
            RETURNING id, company_id, email, expires_at, created_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(company_id)
        .bind(normalize_email(email))
        .bind(expires_at)
        .fetch_one(executor)
        .await?;

        Ok(IssuedInvite {
            token: InviteToken {
                id,
                company_id,
                email,
                expires_at,
                created_at,
            },
            created,
        })
    }

    /// Finds a token by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InviteToken>(
            "SELECT id, company_id, email, expires_at, created_at FROM invite_tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a token by ID, only if it was issued to `email`
    pub async fn find_for_email(
        pool: &PgPool,
        id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InviteToken>(
            r#"
            SELECT id, company_id, email, expires_at, created_at
            FROM invite_tokens
            WHERE id = $1 AND email = $2
            "#,
        )
        .bind(id)
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
    }

    /// Finds the token for `(company_id, email)`
    pub async fn find_by_company_and_email(
        pool: &PgPool,
        company_id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InviteToken>(
            r#"
            SELECT id, company_id, email, expires_at, created_at
            FROM invite_tokens
            WHERE company_id = $1 AND email = $2
            "#,
        )
        .bind(company_id)
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
    }

    /// Checks whether a token with this ID exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM invite_tokens WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Counts tokens for `(company_id, email)`; at most one by construction
    pub async fn count_for(pool: &PgPool, company_id: Uuid, email: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM invite_tokens WHERE company_id = $1 AND email = $2")
            .bind(company_id)
            .bind(normalize_email(email))
            .fetch_one(pool)
            .await
    }

    /// Deletes the tokens of the listed users that are still pending
    ///
    /// Run before the users themselves are removed. Returns the number of
    /// tokens deleted.
    pub async fn delete_for_pending_users<'e, E>(
        executor: E,
        company_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM invite_tokens t
            USING users u
            WHERE u.company_id = $1
              AND u.id = ANY($2)
              AND u.status = 'pending'
              AND t.company_id = u.company_id
              AND t.email = u.email
            "#,
        )
        .bind(company_id)
        .bind(user_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Moves a pending invitee's token to their new address
    pub async fn change_email<'e, E>(
        executor: E,
        company_id: Uuid,
        from: &str,
        to: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE invite_tokens SET email = $3 WHERE company_id = $1 AND email = $2",
        )
        .bind(company_id)
        .bind(normalize_email(from))
        .bind(normalize_email(to))
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a token (consumed by a successful acceptance)
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM invite_tokens WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
