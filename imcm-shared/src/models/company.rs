/// Company model and database operations
///
/// A company is the tenant boundary: users, clients and referrals all hang
/// off one. Companies are provisioned by operators together with a one-time
/// access token that bootstraps the first admin through registration.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     access_token VARCHAR(100) NOT NULL,
///     franchise_id UUID REFERENCES franchises(id) ON DELETE SET NULL,
///     email VARCHAR(100),
///     phone VARCHAR(20),
///     integration JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (name, access_token)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use imcm_shared::models::company::{Company, CreateCompany};
/// use imcm_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let company = Company::create(&pool, CreateCompany {
///     name: "Acme Heating".to_string(),
///     ..Default::default()
/// }).await?;
///
/// // Hand this to the customer so they can register their first admin
/// println!("access token: {}", company.access_token);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const COMPANY_COLUMNS: &str =
    "id, name, access_token, franchise_id, email, phone, integration, created_at, updated_at";

/// Length of the random part of a generated access token
const ACCESS_TOKEN_RANDOM_LENGTH: usize = 32;

/// Generated access token prefix
const ACCESS_TOKEN_PREFIX: &str = "imcm_";

/// Company model representing a tenant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    /// Unique company ID (UUID v4)
    pub id: Uuid,

    /// Company name
    pub name: String,

    /// One-time credential used to register the first admin
    #[serde(skip_serializing)]
    pub access_token: String,

    /// Franchise the company belongs to, if any
    pub franchise_id: Option<Uuid>,

    /// Contact email
    pub email: Option<String>,

    /// Contact phone
    pub phone: Option<String>,

    /// CRM integration settings (tag ids, API credentials)
    ///
    /// Opaque to this service.
    /// Example: {"crm": "ServiceTitan", "tenant_id": "...", "for_sale_tag": 123}
    #[serde(skip_serializing)]
    pub integration: JsonValue,

    /// When the company was created
    pub created_at: DateTime<Utc>,

    /// When the company was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new company
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCompany {
    /// Company name
    pub name: String,

    /// Access token (generated when None)
    pub access_token: Option<String>,

    /// Franchise membership
    pub franchise_id: Option<Uuid>,

    /// Contact email
    pub email: Option<String>,

    /// Contact phone
    pub phone: Option<String>,

    /// Integration settings (defaults to `{}`)
    pub integration: Option<JsonValue>,
}

/// Generates a random company access token
///
/// Format: `imcm_` followed by 32 base62 characters.
pub fn generate_access_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let random_part: String = (0..ACCESS_TOKEN_RANDOM_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    format!("{}{}", ACCESS_TOKEN_PREFIX, random_part)
}

impl Company {
    /// Creates a new company
    ///
    /// # Errors
    ///
    /// Returns an error if the `(name, access_token)` pair already exists or
    /// the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateCompany) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO companies (name, access_token, franchise_id, email, phone, integration)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COMPANY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Company>(&query)
            .bind(data.name)
            .bind(data.access_token.unwrap_or_else(generate_access_token))
            .bind(data.franchise_id)
            .bind(data.email)
            .bind(data.phone)
            .bind(data.integration.unwrap_or_else(|| serde_json::json!({})))
            .fetch_one(pool)
            .await
    }

    /// Finds a company by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1");

        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds the company matching both name and access token
    pub async fn find_by_name_and_access_token(
        pool: &PgPool,
        name: &str,
        access_token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE name = $1 AND access_token = $2"
        );

        sqlx::query_as::<_, Company>(&query)
            .bind(name)
            .bind(access_token)
            .fetch_optional(pool)
            .await
    }

    /// Locks the company row for the rest of the transaction
    ///
    /// Serializes workflows that must see a consistent view of the company's
    /// users (first-admin registration).
    pub async fn lock<'e, E>(executor: E, id: Uuid) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT id FROM companies WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Checks whether a company with this ID exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM companies WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Deletes a company and, by cascade, its users and invite tokens
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
