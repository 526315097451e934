/// Client model (a company's customer) and listing status
///
/// Clients are tenant-scoped: each belongs to a company, and a company may
/// not hold two clients with the same name at the same address. A client's
/// zip code is registered in `zip_codes` when the client is created.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE listing_status AS ENUM (
///     'House For Sale', 'House For Rent', 'House Recently Sold (6)',
///     'Recently Sold (12)', 'Taken Off Market', 'No Change'
/// );
///
/// CREATE TABLE clients (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID REFERENCES companies(id) ON DELETE SET NULL,
///     name VARCHAR(100) NOT NULL,
///     address VARCHAR(100) NOT NULL,
///     zip_code VARCHAR(5) REFERENCES zip_codes(zip_code) ON DELETE SET NULL,
///     city VARCHAR(40),
///     state VARCHAR(31),
///     status listing_status NOT NULL DEFAULT 'No Change',
///     contacted BOOLEAN NOT NULL DEFAULT FALSE,
///     note TEXT,
///     phone_number VARCHAR(100),
///     price INTEGER,
///     housing_type VARCHAR(100),
///     year_built INTEGER,
///     equipment_installed_date DATE,
///     serv_titan_id INTEGER,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (company_id, name, address)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::client_update::ClientUpdate;
use super::tag::Tag;
use super::zip_code::ZipCode;

const CLIENT_COLUMNS: &str = "id, company_id, name, address, zip_code, city, state, status, \
     contacted, note, phone_number, price, housing_type, year_built, \
     equipment_installed_date, serv_titan_id, created_at";

/// Market status detected for a client's home
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_status")]
pub enum ListingStatus {
    #[serde(rename = "House For Sale")]
    #[sqlx(rename = "House For Sale")]
    ForSale,

    #[serde(rename = "House For Rent")]
    #[sqlx(rename = "House For Rent")]
    ForRent,

    /// Sold within the last six months
    #[serde(rename = "House Recently Sold (6)")]
    #[sqlx(rename = "House Recently Sold (6)")]
    RecentlySold6,

    /// Sold within the last twelve months
    #[serde(rename = "Recently Sold (12)")]
    #[sqlx(rename = "Recently Sold (12)")]
    RecentlySold12,

    #[serde(rename = "Taken Off Market")]
    #[sqlx(rename = "Taken Off Market")]
    TakenOffMarket,

    #[default]
    #[serde(rename = "No Change")]
    #[sqlx(rename = "No Change")]
    NoChange,
}

impl ListingStatus {
    /// Label used on the wire and in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::ForSale => "House For Sale",
            ListingStatus::ForRent => "House For Rent",
            ListingStatus::RecentlySold6 => "House Recently Sold (6)",
            ListingStatus::RecentlySold12 => "Recently Sold (12)",
            ListingStatus::TakenOffMarket => "Taken Off Market",
            ListingStatus::NoChange => "No Change",
        }
    }

    /// Whether the status signals that the customer may be moving
    pub fn is_moving_signal(&self) -> bool {
        !matches!(self, ListingStatus::NoChange | ListingStatus::TakenOffMarket)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub name: String,
    pub address: String,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: ListingStatus,
    pub contacted: bool,
    pub note: Option<String>,
    pub phone_number: Option<String>,
    pub price: Option<i32>,
    pub housing_type: Option<String>,
    pub year_built: Option<i32>,
    pub equipment_installed_date: Option<NaiveDate>,

    /// Id of the client in the company's CRM integration
    pub serv_titan_id: Option<i32>,

    pub created_at: DateTime<Utc>,
}

/// A client with its tags and status history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientWithHistory {
    #[serde(flatten)]
    pub client: Client,
    pub tags: Vec<String>,
    pub updates: Vec<ClientUpdate>,
}

/// Input for creating a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateClient {
    pub company_id: Uuid,
    pub name: String,
    pub address: String,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: ListingStatus,
    pub phone_number: Option<String>,
}

impl Client {
    /// Creates a client
    ///
    /// # Errors
    ///
    /// Fails on a duplicate `(company, name, address)`.
    pub async fn create(pool: &PgPool, data: CreateClient) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(zip) = data.zip_code.as_deref() {
            ZipCode::ensure(&mut *tx, zip).await?;
        }

        let query = format!(
            r#"
            INSERT INTO clients (company_id, name, address, zip_code, city, state, status, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CLIENT_COLUMNS}
            "#
        );

        let client = sqlx::query_as::<_, Client>(&query)
            .bind(data.company_id)
            .bind(data.name)
            .bind(data.address)
            .bind(data.zip_code)
            .bind(data.city)
            .bind(data.state)
            .bind(data.status)
            .bind(data.phone_number)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(client)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1");

        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_company(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE company_id = $1 ORDER BY name ASC"
        );

        sqlx::query_as::<_, Client>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Loads a client with its tags and update history
    pub async fn find_with_history(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<ClientWithHistory>, sqlx::Error> {
        let Some(client) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let tags = Tag::for_client(pool, client.id).await?;
        let updates = ClientUpdate::list_by_client(pool, client.id).await?;

        Ok(Some(ClientWithHistory {
            client,
            tags,
            updates,
        }))
    }
}
