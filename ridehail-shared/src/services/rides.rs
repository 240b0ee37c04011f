/// Ride workflow.
///
/// Owns the ride lifecycle and the driver assignment that goes with it:
///
/// ```text
/// requested ──accept──▶ in_progress ──complete──▶ completed
///     │                      │
///     └──────cancel──────────┴──────────────────▶ canceled
/// ```
///
/// Accept, complete, and cancel each run in one transaction. The ride row (and
/// for accept, the driver row) is locked first, business rules are checked
/// against the locked copy, and every write is a conditional update that only
/// applies while the row is still in the expected status. A conditional update
/// that matches nothing means a concurrent writer won. The operation then fails
/// with an internal error and everything it wrote is rolled back, so a ride
/// can never end up with two drivers and a driver is never left `busy` without
/// a ride.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{fare::FareEstimator, ServiceError, ServiceResult};
use crate::models::{
    driver::DriverStatus,
    ride::{NewRide, Ride, RideStatus},
};
use crate::repository::{
    DriverRepository, Repositories, RideRepository, RideTransaction, TransactionManager,
};

/// Behaviour switches for ride requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RideSettings {
    /// Reject requests while no driver is online
    pub require_available_driver: bool,
}

pub struct RideWorkflow {
    rides: Arc<dyn RideRepository>,
    drivers: Arc<dyn DriverRepository>,
    transactions: Arc<dyn TransactionManager>,
    fares: FareEstimator,
    settings: RideSettings,
}

fn ride_not_found() -> ServiceError {
    ServiceError::NotFound("Ride not found".to_string())
}

impl RideWorkflow {
    pub fn new(repos: &Repositories, fares: FareEstimator, settings: RideSettings) -> Self {
        Self {
            rides: repos.rides.clone(),
            drivers: repos.drivers.clone(),
            transactions: repos.transactions.clone(),
            fares,
            settings,
        }
    }

    /// Creates a `requested` ride with an estimated fare
    pub async fn request_ride(
        &self,
        rider_id: Uuid,
        pickup: &str,
        dropoff: &str,
    ) -> ServiceResult<Ride> {
        let pickup = pickup.trim();
        let dropoff = dropoff.trim();
        if pickup.is_empty() || dropoff.is_empty() {
            return Err(ServiceError::BadRequest(
                "Pickup and dropoff locations are required".to_string(),
            ));
        }

        if self.settings.require_available_driver
            && self.drivers.count_by_status(DriverStatus::Online).await? == 0
        {
            warn!(rider_id = %rider_id, "Ride request rejected: no drivers online");
            return Err(ServiceError::BadRequest("No drivers available".to_string()));
        }

        let fare = self.fares.estimate(pickup, dropoff);

        let ride = self
            .rides
            .create(NewRide {
                rider_id,
                pickup_location: pickup.to_string(),
                dropoff_location: dropoff.to_string(),
                fare,
            })
            .await?;

        info!(ride_id = %ride.id, rider_id = %rider_id, fare, "Ride requested");
        Ok(ride)
    }

    /// All of the rider's rides, newest first
    pub async fn ride_history(&self, rider_id: Uuid) -> ServiceResult<Vec<Ride>> {
        Ok(self.rides.list_by_rider(rider_id).await?)
    }

    /// Cancels a ride on behalf of its rider
    ///
    /// An assigned driver is put back `online` in the same transaction.
    pub async fn cancel_ride(&self, rider_id: Uuid, ride_id: Uuid) -> ServiceResult<Ride> {
        let mut tx = self.transactions.begin().await?;
        let result = cancel_in(tx.as_mut(), rider_id, ride_id).await;
        let ride = finish(tx, result).await?;

        info!(ride_id = %ride_id, rider_id = %rider_id, "Ride canceled");
        Ok(ride)
    }

    /// Assigns an online driver to a requested ride
    pub async fn accept_ride(&self, driver_id: Uuid, ride_id: Uuid) -> ServiceResult<Ride> {
        let mut tx = self.transactions.begin().await?;
        let result = accept_in(tx.as_mut(), driver_id, ride_id).await;
        let ride = finish(tx, result).await?;

        info!(ride_id = %ride_id, driver_id = %driver_id, "Ride accepted");
        Ok(ride)
    }

    /// Finishes an in-progress ride and frees its driver
    pub async fn complete_ride(&self, driver_id: Uuid, ride_id: Uuid) -> ServiceResult<Ride> {
        let mut tx = self.transactions.begin().await?;
        let result = complete_in(tx.as_mut(), driver_id, ride_id).await;
        let ride = finish(tx, result).await?;

        info!(ride_id = %ride_id, driver_id = %driver_id, "Ride completed");
        Ok(ride)
    }
}

/// Commits on success; rolls back and returns the original error otherwise
async fn finish<T>(tx: Box<dyn RideTransaction>, result: ServiceResult<T>) -> ServiceResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

async fn accept_in(
    tx: &mut dyn RideTransaction,
    driver_id: Uuid,
    ride_id: Uuid,
) -> ServiceResult<Ride> {
    let driver = tx
        .lock_driver(driver_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Driver not found".to_string()))?;

    if driver.status != DriverStatus::Online {
        return Err(ServiceError::BadRequest(format!(
            "Driver must be online to accept rides (currently {})",
            driver.status.as_str()
        )));
    }

    let ride = tx.lock_ride(ride_id).await?.ok_or_else(ride_not_found)?;

    if ride.status != RideStatus::Requested {
        return Err(ServiceError::BadRequest(format!(
            "Ride cannot be accepted (currently {})",
            ride.status.as_str()
        )));
    }

    let ride = tx
        .transition_ride(
            ride_id,
            &[RideStatus::Requested],
            RideStatus::InProgress,
            Some(driver_id),
        )
        .await?
        .ok_or_else(|| ServiceError::Internal(format!("ride {} changed during accept", ride_id)))?;

    tx.transition_driver(driver_id, &[DriverStatus::Online], DriverStatus::Busy)
        .await?
        .ok_or_else(|| {
            ServiceError::Internal(format!("driver {} changed during accept", driver_id))
        })?;

    Ok(ride)
}

async fn cancel_in(
    tx: &mut dyn RideTransaction,
    rider_id: Uuid,
    ride_id: Uuid,
) -> ServiceResult<Ride> {
    let ride = tx.lock_ride(ride_id).await?.ok_or_else(ride_not_found)?;

    if ride.rider_id != rider_id {
        return Err(ServiceError::Forbidden(
            "You can only cancel your own rides".to_string(),
        ));
    }

    if !ride.status.is_cancelable() {
        return Err(ServiceError::BadRequest(format!(
            "Ride cannot be canceled (currently {})",
            ride.status.as_str()
        )));
    }

    let canceled = tx
        .transition_ride(
            ride_id,
            &[RideStatus::Requested, RideStatus::InProgress],
            RideStatus::Canceled,
            None,
        )
        .await?
        .ok_or_else(|| ServiceError::Internal(format!("ride {} changed during cancel", ride_id)))?;

    if ride.status == RideStatus::InProgress {
        if let Some(driver_id) = ride.driver_id {
            tx.transition_driver(driver_id, &[DriverStatus::Busy], DriverStatus::Online)
                .await?
                .ok_or_else(|| {
                    ServiceError::Internal(format!(
                        "driver {} could not be released on cancel",
                        driver_id
                    ))
                })?;
        }
    }

    Ok(canceled)
}

async fn complete_in(
    tx: &mut dyn RideTransaction,
    driver_id: Uuid,
    ride_id: Uuid,
) -> ServiceResult<Ride> {
    let ride = tx.lock_ride(ride_id).await?.ok_or_else(ride_not_found)?;

    if ride.driver_id != Some(driver_id) {
        return Err(ServiceError::Forbidden(
            "Ride is not assigned to you".to_string(),
        ));
    }

    if ride.status != RideStatus::InProgress {
        return Err(ServiceError::BadRequest(format!(
            "Ride cannot be completed (currently {})",
            ride.status.as_str()
        )));
    }

    let completed = tx
        .transition_ride(ride_id, &[RideStatus::InProgress], RideStatus::Completed, None)
        .await?
        .ok_or_else(|| {
            ServiceError::Internal(format!("ride {} changed during completion", ride_id))
        })?;

    tx.transition_driver(driver_id, &[DriverStatus::Busy], DriverStatus::Online)
        .await?
        .ok_or_else(|| {
            ServiceError::Internal(format!("driver {} could not be released", driver_id))
        })?;

    Ok(completed)
}
