/// Franchise model
///
/// A franchise groups companies that may refer clients to each other.
///
/// ```sql
/// CREATE TABLE franchises (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Franchise {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Franchise {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Franchise>(
            "INSERT INTO franchises (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Franchise>("SELECT id, name, created_at FROM franchises WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a franchise; its referrals go with it
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM franchises WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
