//! # Is My Customer Moving: shared library
//!
//! Data model and account workflows used by the API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (companies, users, invite tokens, clients,
//!   referrals, client updates, zip codes, listings, scrape responses, tags)
//! - `db`: Connection pool and schema migrations
//! - `auth`: Password hashing, JWT, TOTP, authentication middleware, authorization
//! - `accounts`: Invite, registration, two-factor and email confirmation workflows
//! - `mail`: Outbound mail (SMTP or log)

pub mod accounts;
pub mod auth;
pub mod db;
pub mod mail;
pub mod models;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
