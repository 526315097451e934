/// Home listings found on the market
///
/// Listings are market data, not tenant data: they are keyed by zip code
/// and shared by every company with clients there. A client matches a
/// listing on zip code and address.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE home_listings (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     zip_code VARCHAR(5) REFERENCES zip_codes(zip_code) ON DELETE SET NULL,
///     address VARCHAR(100) NOT NULL,
///     status listing_status NOT NULL DEFAULT 'Taken Off Market',
///     listed VARCHAR(30) NOT NULL DEFAULT '',
///     scrape_response_id UUID REFERENCES scrape_responses(id) ON DELETE SET NULL,
///     price INTEGER NOT NULL DEFAULT 0,
///     housing_type VARCHAR(100) NOT NULL DEFAULT '',
///     year_built INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::client::ListingStatus;
use super::zip_code::ZipCode;

const LISTING_COLUMNS: &str = "id, zip_code, address, status, listed, scrape_response_id, \
     price, housing_type, year_built, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HomeListing {
    pub id: Uuid,
    pub zip_code: Option<String>,
    pub address: String,
    pub status: ListingStatus,

    /// Listing date as scraped
    pub listed: String,

    pub scrape_response_id: Option<Uuid>,
    pub price: i32,
    pub housing_type: String,
    pub year_built: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHomeListing {
    pub zip_code: Option<String>,
    pub address: String,
    pub status: ListingStatus,
    pub listed: String,
    pub scrape_response_id: Option<Uuid>,
    pub price: i32,
    pub housing_type: String,
    pub year_built: i32,
}

impl Default for CreateHomeListing {
    fn default() -> Self {
        Self {
            zip_code: None,
            address: String::new(),
            status: ListingStatus::TakenOffMarket,
            listed: String::new(),
            scrape_response_id: None,
            price: 0,
            housing_type: String::new(),
            year_built: 0,
        }
    }
}

impl HomeListing {
    /// Creates a listing, registering its zip code
    pub async fn create(pool: &PgPool, data: CreateHomeListing) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(zip) = data.zip_code.as_deref() {
            ZipCode::ensure(&mut *tx, zip).await?;
        }

        let query = format!(
            r#"
            INSERT INTO home_listings
                (zip_code, address, status, listed, scrape_response_id, price, housing_type, year_built)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LISTING_COLUMNS}
            "#
        );

        let listing = sqlx::query_as::<_, HomeListing>(&query)
            .bind(data.zip_code)
            .bind(data.address)
            .bind(data.status)
            .bind(data.listed)
            .bind(data.scrape_response_id)
            .bind(data.price)
            .bind(data.housing_type)
            .bind(data.year_built)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(listing)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {LISTING_COLUMNS} FROM home_listings WHERE id = $1");

        sqlx::query_as::<_, HomeListing>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Listings in a zip code with the given status
    pub async fn list_by_zip_and_status(
        pool: &PgPool,
        zip: &str,
        status: ListingStatus,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {LISTING_COLUMNS} FROM home_listings
            WHERE zip_code = $1 AND status = $2
            ORDER BY address ASC
            "#
        );

        sqlx::query_as::<_, HomeListing>(&query)
            .bind(zip)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Listings at a client's address, newest first
    pub async fn find_for_address(
        pool: &PgPool,
        zip: &str,
        address: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {LISTING_COLUMNS} FROM home_listings
            WHERE zip_code = $1 AND LOWER(address) = LOWER($2)
            ORDER BY created_at DESC
            "#
        );

        sqlx::query_as::<_, HomeListing>(&query)
            .bind(zip)
            .bind(address.trim())
            .fetch_all(pool)
            .await
    }
}
