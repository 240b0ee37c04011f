/// Driver endpoints
///
/// Registration and login are public. Everything else needs a driver token;
/// the driver acted upon is always the token's subject.
///
/// # Endpoints
///
/// - `POST   /drivers/register`
/// - `POST   /drivers/login` - also brings an offline driver online
/// - `GET    /drivers/profile`
/// - `PUT    /drivers/profile`
/// - `PUT    /drivers/status` - `online` or `offline`
/// - `DELETE /drivers/account`
/// - `POST   /drivers/accept-ride`
/// - `POST   /drivers/complete-ride`

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiResult},
    routes::auth::LoginRequest,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use ridehail_shared::{
    auth::middleware::AuthContext,
    models::{
        driver::{Driver, DriverProfileUpdate, DriverStatus},
        ride::Ride,
    },
    services::drivers::RegisterDriver,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterDriverRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, max = 32, message = "Phone must be 3-32 characters"))]
    pub phone: String,

    #[validate(length(min = 1, max = 64, message = "License number must be 1-64 characters"))]
    pub license_number: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Partial profile update; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 3, max = 32, message = "Phone must be 3-32 characters"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 64, message = "License number must be 1-64 characters"))]
    pub license_number: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RideActionRequest {
    pub ride_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DriverResponse {
    pub driver: Driver,
}

#[derive(Debug, Serialize)]
pub struct DriverLoginResponse {
    pub driver: Driver,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new driver
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterDriverRequest>,
) -> ApiResult<(StatusCode, Json<DriverResponse>)> {
    req.validate()?;

    let driver = state
        .drivers
        .register(RegisterDriver {
            name: req.name,
            email: req.email,
            phone: req.phone,
            license_number: req.license_number,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DriverResponse { driver })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<DriverLoginResponse>> {
    req.validate()?;

    let session = state.drivers.login(&req.email, &req.password).await?;

    Ok(Json(DriverLoginResponse {
        driver: session.driver,
        token: session.token,
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DriverResponse>> {
    let driver = state.drivers.profile(auth.subject_id).await?;
    Ok(Json(DriverResponse { driver }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<DriverResponse>> {
    req.validate()?;

    let driver = state
        .drivers
        .update_profile(
            auth.subject_id,
            DriverProfileUpdate {
                name: req.name,
                phone: req.phone,
                license_number: req.license_number,
                location: req.location,
            },
        )
        .await?;

    Ok(Json(DriverResponse { driver }))
}

/// Sets the caller `online` or `offline`
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status, `busy` requested, or the driver is on a ride
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<DriverResponse>> {
    let status = DriverStatus::try_from(req.status.trim().to_lowercase()).map_err(|_| {
        ApiError::BadRequest("Status must be 'online' or 'offline'".to_string())
    })?;

    let driver = state.drivers.set_status(auth.subject_id, status).await?;
    Ok(Json(DriverResponse { driver }))
}

/// Deletes the caller's account
///
/// # Errors
///
/// - `400 Bad Request`: Driver is on a ride or has ride history
/// - `404 Not Found`: Driver does not exist
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    state.drivers.delete_account(auth.subject_id).await?;

    Ok(Json(MessageResponse {
        message: "Driver account deleted".to_string(),
    }))
}

/// Accepts a requested ride
///
/// # Errors
///
/// - `400 Bad Request`: Driver not online, or ride no longer requested
/// - `404 Not Found`: Ride or driver does not exist
/// - `500 Internal Server Error`: Lost a race with a concurrent writer
pub async fn accept_ride(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<RideActionRequest>,
) -> ApiResult<Json<Ride>> {
    let ride = state.rides.accept_ride(auth.subject_id, req.ride_id).await?;
    Ok(Json(ride))
}

pub async fn complete_ride(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<RideActionRequest>,
) -> ApiResult<Json<Ride>> {
    let ride = state.rides.complete_ride(auth.subject_id, req.ride_id).await?;
    Ok(Json(ride))
}
