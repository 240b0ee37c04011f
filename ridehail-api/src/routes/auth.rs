/// Rider account endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register a rider account
/// - `POST /auth/login` - Login and get an access token

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use ridehail_shared::{models::account::Account, services::accounts::RegisterAccount};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, max = 32, message = "Phone must be 3-32 characters"))]
    pub phone: String,

    /// Password (strength is checked by the account service)
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request, shared by riders and drivers
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: Account,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: Account,

    /// Bearer token for the rider routes
    pub token: String,
}

/// Register a new rider
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Rita Rider",
///   "email": "rita@example.com",
///   "phone": "+15550100",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate()?;

    let user = state
        .accounts
        .register(RegisterAccount {
            name: req.name,
            email: req.email,
            phone: req.phone,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let session = state.accounts.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        user: session.account,
        token: session.token,
    }))
}
