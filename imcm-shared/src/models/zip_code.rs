/// Zip codes tracked for market scraping
///
/// A zip code row exists for every zip a client or listing refers to.
/// `last_updated` records when its listings were last refreshed and starts
/// at yesterday so new zips are picked up on the next run.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE zip_codes (
///     zip_code VARCHAR(5) PRIMARY KEY,
///     last_updated DATE NOT NULL DEFAULT (CURRENT_DATE - 1)
/// );
/// ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ZipCode {
    pub zip_code: String,
    pub last_updated: NaiveDate,
}

impl ZipCode {
    /// Returns the zip code row, creating it if needed
    pub async fn ensure<'e, E>(executor: E, zip: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ZipCode>(
            r#"
            INSERT INTO zip_codes (zip_code)
            VALUES ($1)
            ON CONFLICT (zip_code) DO UPDATE SET zip_code = EXCLUDED.zip_code
            RETURNING zip_code, last_updated
            "#,
        )
        .bind(zip)
        .fetch_one(executor)
        .await
    }

    pub async fn find(pool: &PgPool, zip: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ZipCode>("SELECT zip_code, last_updated FROM zip_codes WHERE zip_code = $1")
            .bind(zip)
            .fetch_optional(pool)
            .await
    }

    /// Zip codes not refreshed since before `date`
    pub async fn list_stale(pool: &PgPool, date: NaiveDate) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ZipCode>(
            "SELECT zip_code, last_updated FROM zip_codes WHERE last_updated < $1 ORDER BY zip_code",
        )
        .bind(date)
        .fetch_all(pool)
        .await
    }

    /// Records a refresh of the zip's listings
    pub async fn mark_updated(
        pool: &PgPool,
        zip: &str,
        date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ZipCode>(
            r#"
            UPDATE zip_codes SET last_updated = $2
            WHERE zip_code = $1
            RETURNING zip_code, last_updated
            "#,
        )
        .bind(zip)
        .bind(date)
        .fetch_optional(pool)
        .await
    }
}
