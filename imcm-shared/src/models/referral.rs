/// Referral model: one company passing a client on to another
///
/// Referrals cross tenant boundaries, so they are only allowed inside a
/// franchise. `Referral::create` enforces at write time that:
///
/// 1. the referring and receiving companies differ,
/// 2. both companies belong to the referral's franchise,
/// 3. the client's company belongs to the franchise,
/// 4. the client's company is the referring company.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE referrals (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     franchise_id UUID NOT NULL REFERENCES franchises(id) ON DELETE CASCADE,
///     referred_from UUID REFERENCES companies(id) ON DELETE SET NULL,
///     referred_to UUID REFERENCES companies(id) ON DELETE SET NULL,
///     client_id UUID REFERENCES clients(id) ON DELETE CASCADE,
///     contacted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::client::Client;
use super::company::Company;

#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    #[error("Referred From and Referred To cannot be the same")]
    SameCompany,

    #[error("Both Referred From and Referred To must be part of the franchise")]
    CompanyOutsideFranchise,

    #[error("Client must be part of the franchise")]
    ClientOutsideFranchise,

    #[error("Client must have the same company as Referred From")]
    ClientCompanyMismatch,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Referral {
    pub id: Uuid,
    pub franchise_id: Uuid,
    pub referred_from: Option<Uuid>,
    pub referred_to: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub contacted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReferral {
    pub franchise_id: Uuid,
    pub referred_from: Uuid,
    pub referred_to: Uuid,
    pub client_id: Uuid,
    #[serde(default)]
    pub contacted: bool,
}

/// Checks the cross-company rules for a referral over loaded records
///
/// `client_company` is the company the client belongs to.
pub fn check_referral(
    franchise_id: Uuid,
    from: &Company,
    to: &Company,
    client_company: &Company,
) -> Result<(), ReferralError> {
    if from.id == to.id {
        return Err(ReferralError::SameCompany);
    }

    if from.franchise_id != Some(franchise_id) || to.franchise_id != Some(franchise_id) {
        return Err(ReferralError::CompanyOutsideFranchise);
    }

    if client_company.franchise_id != Some(franchise_id) {
        return Err(ReferralError::ClientOutsideFranchise);
    }

    if client_company.id != from.id {
        return Err(ReferralError::ClientCompanyMismatch);
    }

    Ok(())
}

impl Referral {
    /// Validates and stores a referral
    ///
    /// # Errors
    ///
    /// - `NotFound` if a company or the client does not exist
    /// - a rule violation (see module docs)
    pub async fn create(pool: &PgPool, data: CreateReferral) -> Result<Self, ReferralError> {
        let from = Company::find_by_id(pool, data.referred_from)
            .await?
            .ok_or(ReferralError::NotFound("Referred From company"))?;
        let to = Company::find_by_id(pool, data.referred_to)
            .await?
            .ok_or(ReferralError::NotFound("Referred To company"))?;
        let client = Client::find_by_id(pool, data.client_id)
            .await?
            .ok_or(ReferralError::NotFound("Client"))?;

        let client_company_id = client
            .company_id
            .ok_or(ReferralError::ClientOutsideFranchise)?;
        let client_company = if client_company_id == from.id {
            from.clone()
        } else {
            Company::find_by_id(pool, client_company_id)
                .await?
                .ok_or(ReferralError::NotFound("Client company"))?
        };

        check_referral(data.franchise_id, &from, &to, &client_company)?;

        let referral = sqlx::query_as::<_, Referral>(
            r#"
            INSERT INTO referrals (franchise_id, referred_from, referred_to, client_id, contacted)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, franchise_id, referred_from, referred_to, client_id, contacted, created_at
            "#,
        )
        .bind(data.franchise_id)
        .bind(data.referred_from)
        .bind(data.referred_to)
        .bind(data.client_id)
        .bind(data.contacted)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            referral_id = %referral.id,
            franchise_id = %referral.franchise_id,
            "Referral created"
        );

        Ok(referral)
    }

    /// Lists referrals addressed to a company
    pub async fn list_received(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(
            r#"
            SELECT id, franchise_id, referred_from, referred_to, client_id, contacted, created_at
            FROM referrals
            WHERE referred_to = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }
}
