/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Rider registration and login
/// - `drivers`: Driver registration, login, profile, status, ride actions
/// - `riders`: Ride requests, history, cancellation

pub mod auth;
pub mod drivers;
pub mod health;
pub mod riders;
