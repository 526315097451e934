/// Free-form labels shared by home listings and clients
///
/// # Schema
///
/// ```sql
/// CREATE TABLE home_listing_tags (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tag VARCHAR(100) NOT NULL UNIQUE
/// );
///
/// CREATE TABLE home_listing_tag_links (home_listing_id, tag_id);
/// CREATE TABLE client_tags (client_id, tag_id);
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub tag: String,
}

impl Tag {
    /// Returns the tag with this label, creating it if needed
    pub async fn find_or_create(pool: &PgPool, tag: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO home_listing_tags (tag)
            VALUES ($1)
            ON CONFLICT (tag) DO UPDATE SET tag = EXCLUDED.tag
            RETURNING id, tag
            "#,
        )
        .bind(tag.trim())
        .fetch_one(pool)
        .await
    }

    pub async fn tag_home_listing(
        pool: &PgPool,
        home_listing_id: Uuid,
        tag_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO home_listing_tag_links (home_listing_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(home_listing_id)
        .bind(tag_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn tag_client(pool: &PgPool, client_id: Uuid, tag_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO client_tags (client_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(client_id)
            .bind(tag_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Labels on a home listing, alphabetical
    pub async fn for_home_listing(pool: &PgPool, home_listing_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT t.tag
            FROM home_listing_tags t
            JOIN home_listing_tag_links l ON l.tag_id = t.id
            WHERE l.home_listing_id = $1
            ORDER BY t.tag
            "#,
        )
        .bind(home_listing_id)
        .fetch_all(pool)
        .await
    }

    /// Labels on a client, alphabetical
    pub async fn for_client(pool: &PgPool, client_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT t.tag
            FROM home_listing_tags t
            JOIN client_tags c ON c.tag_id = t.id
            WHERE c.client_id = $1
            ORDER BY t.tag
            "#,
        )
        .bind(client_id)
        .fetch_all(pool)
        .await
    }
}
