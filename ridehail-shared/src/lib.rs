//! # Ridehail Shared Library
//!
//! Domain types, persistence, and business logic for the ride-hailing
//! backend. The API server is a thin HTTP layer over this crate.
//!
//! ## Module Organization
//!
//! - `models`: database models and their SQL
//! - `repository`: repository traits with PostgreSQL and in-memory backends
//! - `services`: account, driver, and ride workflow services
//! - `auth`: password hashing, access tokens, authentication, authorization
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod repository;
pub mod services;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
