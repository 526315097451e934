//! # Is My Customer Moving: API server library
//!
//! HTTP surface over the account workflows in `imcm-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers and anonymous throttling
//! - `routes`: API route handlers
//! - `serialization`: JSON representations of users

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod serialization;
