//! # Ridehail API Server Library
//!
//! HTTP layer of the ride-hailing backend: configuration, error mapping,
//! route handlers, and the router that ties them to the services in
//! `ridehail-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
