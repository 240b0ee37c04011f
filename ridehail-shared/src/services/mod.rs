/// Business services.
///
/// Services sit between the HTTP handlers and the repositories. They own every
/// business rule (ownership checks, status rules, credential checks) and report
/// failures as [`ServiceError`], whose variants map one-to-one onto the API's
/// error kinds.
///
/// - `accounts`: rider registration and login
/// - `drivers`: driver registration, login, profile, status, deletion
/// - `rides`: the ride workflow (request, history, accept, complete, cancel)
/// - `fare`: fare estimation

use serde::Serialize;

use crate::auth::password::PasswordError;
use crate::repository::RepoError;

pub mod accounts;
pub mod drivers;
pub mod fare;
pub mod rides;

pub use accounts::AccountService;
pub use drivers::DriverService;
pub use fare::{DistanceEstimator, FareConfig, FareEstimator, FixedDistance, RandomDistance};
pub use rides::{RideSettings, RideWorkflow};

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Unexpected failure; the message is for logs, not for clients
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::UniqueViolation(constraint) => {
                if constraint.contains("email") {
                    ServiceError::Conflict("Email already registered".to_string())
                } else {
                    ServiceError::Conflict(format!("Duplicate value violates {}", constraint))
                }
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<crate::auth::jwt::JwtError> for ServiceError {
    fn from(err: crate::auth::jwt::JwtError) -> Self {
        ServiceError::Internal(format!("token issuance failed: {}", err))
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Internal(format!("background task failed: {}", err))
    }
}

/// Trims and lowercases an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Rejects text fields that are empty once trimmed; `None` means not supplied
pub(crate) fn require_non_blank(fields: &[(&str, Option<&str>)]) -> ServiceResult<()> {
    let blank: Vec<FieldError> = fields
        .iter()
        .filter(|(_, value)| value.is_some_and(|v| v.trim().is_empty()))
        .map(|(field, _)| FieldError::new(*field, "Must not be blank"))
        .collect();

    if blank.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(blank))
    }
}

/// Hashes a password on the blocking thread pool
pub(crate) async fn hash_password(password: String) -> ServiceResult<String> {
    let hash =
        tokio::task::spawn_blocking(move || crate::auth::password::hash_password(&password))
            .await??;
    Ok(hash)
}

/// Verifies a password on the blocking thread pool
pub(crate) async fn verify_password(password: String, hash: String) -> ServiceResult<bool> {
    let valid =
        tokio::task::spawn_blocking(move || crate::auth::password::verify_password(&password, &hash))
            .await??;
    Ok(valid)
}
