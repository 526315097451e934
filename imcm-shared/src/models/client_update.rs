/// Client status history
///
/// One row per observed change of a client's listing status, contact flag
/// or note. Rows go with their client.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE client_updates (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
///     date DATE NOT NULL DEFAULT CURRENT_DATE,
///     status listing_status,
///     listed VARCHAR(30),
///     note TEXT,
///     contacted BOOLEAN,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::client::ListingStatus;

const UPDATE_COLUMNS: &str = "id, client_id, date, status, listed, note, contacted, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientUpdate {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    pub status: Option<ListingStatus>,
    pub listed: Option<String>,
    pub note: Option<String>,
    pub contacted: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateClientUpdate {
    pub client_id: Uuid,
    pub status: Option<ListingStatus>,
    pub listed: Option<String>,
    pub note: Option<String>,
    pub contacted: Option<bool>,
}

impl ClientUpdate {
    /// Records an update dated today
    pub async fn create(pool: &PgPool, data: CreateClientUpdate) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO client_updates (client_id, status, listed, note, contacted)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {UPDATE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ClientUpdate>(&query)
            .bind(data.client_id)
            .bind(data.status)
            .bind(data.listed)
            .bind(data.note)
            .bind(data.contacted)
            .fetch_one(pool)
            .await
    }

    /// A client's history, oldest first
    pub async fn list_by_client(pool: &PgPool, client_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {UPDATE_COLUMNS} FROM client_updates WHERE client_id = $1 ORDER BY date ASC, created_at ASC"
        );

        sqlx::query_as::<_, ClientUpdate>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }
}
