/// Rider ride endpoints
///
/// All routes need a rider (or admin) token and act on the token's subject.
///
/// # Endpoints
///
/// - `POST /riders/request-ride`
/// - `GET  /riders/rides`
/// - `POST /riders/cancel-ride`

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use ridehail_shared::{auth::middleware::AuthContext, models::ride::Ride};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RequestRideRequest {
    #[validate(length(min = 1, max = 255, message = "Pickup location must be 1-255 characters"))]
    pub pickup: String,

    #[validate(length(min = 1, max = 255, message = "Dropoff location must be 1-255 characters"))]
    pub dropoff: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelRideRequest {
    pub ride_id: Uuid,
}

/// Requests a ride with an estimated fare
///
/// ```text
/// POST /riders/request-ride
/// Authorization: Bearer <token>
///
/// { "pickup": "Main St 1", "dropoff": "Airport" }
/// ```
///
/// Returns `201 Created` with the ride in `requested` status.
pub async fn request_ride(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<RequestRideRequest>,
) -> ApiResult<(StatusCode, Json<Ride>)> {
    req.validate()?;

    let ride = state
        .rides
        .request_ride(auth.subject_id, &req.pickup, &req.dropoff)
        .await?;

    Ok((StatusCode::CREATED, Json(ride)))
}

/// The caller's rides, newest first
pub async fn ride_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Ride>>> {
    let rides = state.rides.ride_history(auth.subject_id).await?;
    Ok(Json(rides))
}

/// Cancels one of the caller's rides
///
/// # Errors
///
/// - `400 Bad Request`: Ride already completed or canceled
/// - `403 Forbidden`: Ride belongs to someone else
/// - `404 Not Found`: Ride does not exist
pub async fn cancel_ride(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CancelRideRequest>,
) -> ApiResult<Json<Ride>> {
    let ride = state.rides.cancel_ride(auth.subject_id, req.ride_id).await?;
    Ok(Json(ride))
}
