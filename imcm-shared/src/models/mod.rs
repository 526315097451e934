/// Database models for Is My Customer Moving
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `company`: Tenants, with the access token that bootstraps the first admin
/// - `franchise`: Groups of companies allowed to refer clients to each other
/// - `user`: Accounts within a company (pending / active / admin)
/// - `invite_token`: Single live invite per (company, email)
/// - `client`: A company's customers and their listing status
/// - `client_update`: Status history of a client
/// - `referral`: Cross-company client referrals inside a franchise
/// - `zip_code`, `scrape_response`, `home_listing`, `tag`: market data
///   shared across companies
///
/// # Example
///
/// ```no_run
/// use imcm_shared::models::company::{Company, CreateCompany};
/// use imcm_shared::models::user::User;
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
/// let roster = User::list_by_company(&pool, company.id).await?;
/// assert!(roster.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod client;
pub mod client_update;
pub mod company;
pub mod franchise;
pub mod home_listing;
pub mod invite_token;
pub mod referral;
pub mod scrape_response;
pub mod tag;
pub mod user;
pub mod zip_code;
