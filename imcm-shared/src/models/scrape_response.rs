/// Raw responses from listing scrapes
///
/// Each scrape of a zip code for one listing status is stored as received.
/// Home listings parsed from it point back here.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE scrape_responses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     date DATE NOT NULL DEFAULT CURRENT_DATE,
///     response TEXT NOT NULL DEFAULT '',
///     zip INTEGER,
///     status listing_status,
///     url VARCHAR(100),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::client::ListingStatus;

const SCRAPE_COLUMNS: &str = "id, date, response, zip, status, url, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScrapeResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    pub response: String,
    pub zip: Option<i32>,
    pub status: Option<ListingStatus>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateScrapeResponse {
    pub response: String,
    pub zip: Option<i32>,
    pub status: Option<ListingStatus>,
    pub url: Option<String>,
}

impl ScrapeResponse {
    /// Stores a response dated today
    pub async fn create(pool: &PgPool, data: CreateScrapeResponse) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO scrape_responses (response, zip, status, url)
            VALUES ($1, $2, $3, $4)
            RETURNING {SCRAPE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ScrapeResponse>(&query)
            .bind(data.response)
            .bind(data.zip)
            .bind(data.status)
            .bind(data.url)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {SCRAPE_COLUMNS} FROM scrape_responses WHERE id = $1");

        sqlx::query_as::<_, ScrapeResponse>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Responses for a zip and status on one day, oldest first
    pub async fn list_for(
        pool: &PgPool,
        zip: i32,
        status: ListingStatus,
        date: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {SCRAPE_COLUMNS} FROM scrape_responses
            WHERE zip = $1 AND status = $2 AND date = $3
            ORDER BY created_at ASC
            "#
        );

        sqlx::query_as::<_, ScrapeResponse>(&query)
            .bind(zip)
            .bind(status)
            .bind(date)
            .fetch_all(pool)
            .await
    }
}
