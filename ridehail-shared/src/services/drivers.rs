/// Driver registration, login, and self-service profile management.
///
/// Drivers go online by logging in or by setting their status explicitly.
/// While a driver is `busy` the ride workflow owns its status: explicit status
/// changes and account deletion are refused until the ride finishes. Rides
/// keep their driver for good, so only a driver with no rides can be deleted.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    hash_password, normalize_email, require_non_blank, verify_password, FieldError, ServiceError,
    ServiceResult,
};
use crate::auth::{authorization::Role, jwt::TokenIssuer, password::validate_password_strength};
use crate::models::driver::{Driver, DriverProfileUpdate, DriverStatus, NewDriver};
use crate::repository::DriverRepository;

#[derive(Debug, Clone)]
pub struct RegisterDriver {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct DriverSession {
    pub driver: Driver,
    pub token: String,
}

pub struct DriverService {
    drivers: Arc<dyn DriverRepository>,
    tokens: Arc<TokenIssuer>,
}

fn driver_not_found() -> ServiceError {
    ServiceError::NotFound("Driver not found".to_string())
}

impl DriverService {
    pub fn new(drivers: Arc<dyn DriverRepository>, tokens: Arc<TokenIssuer>) -> Self {
        Self { drivers, tokens }
    }

    /// Registers a driver; new drivers start `offline`
    pub async fn register(&self, input: RegisterDriver) -> ServiceResult<Driver> {
        require_non_blank(&[
            ("name", Some(input.name.as_str())),
            ("phone", Some(input.phone.as_str())),
            ("license_number", Some(input.license_number.as_str())),
        ])?;
        validate_password_strength(&input.password)
            .map_err(|msg| ServiceError::Validation(vec![FieldError::new("password", msg)]))?;

        let email = normalize_email(&input.email);

        if self.drivers.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "Driver registration rejected: email already registered");
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(input.password).await?;

        let driver = self
            .drivers
            .create(NewDriver {
                name: input.name.trim().to_string(),
                email,
                phone: input.phone.trim().to_string(),
                license_number: input.license_number.trim().to_string(),
                password_hash,
            })
            .await?;

        info!(driver_id = %driver.id, "Driver registered");
        Ok(driver)
    }

    /// Checks credentials, brings an offline driver online, and issues a token
    ///
    /// A driver who is already `online` or `busy` keeps that status.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<DriverSession> {
        let email = normalize_email(email);
        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());

        let driver = self
            .drivers
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password.to_string(), driver.password_hash.clone()).await? {
            warn!(driver_id = %driver.id, "Driver login rejected: wrong password");
            return Err(invalid());
        }

        let driver = match self
            .drivers
            .transition_status(driver.id, &[DriverStatus::Offline], DriverStatus::Online)
            .await?
        {
            Some(updated) => {
                info!(driver_id = %updated.id, "Driver went online at login");
                updated
            }
            None => driver,
        };

        let token = self.tokens.issue(driver.id, &driver.email, Role::Driver)?;

        Ok(DriverSession { driver, token })
    }

    pub async fn profile(&self, driver_id: Uuid) -> ServiceResult<Driver> {
        self.drivers
            .find_by_id(driver_id)
            .await?
            .ok_or_else(driver_not_found)
    }

    pub async fn update_profile(
        &self,
        driver_id: Uuid,
        update: DriverProfileUpdate,
    ) -> ServiceResult<Driver> {
        let update = DriverProfileUpdate {
            name: update.name.map(|s| s.trim().to_string()),
            phone: update.phone.map(|s| s.trim().to_string()),
            license_number: update.license_number.map(|s| s.trim().to_string()),
            location: update.location.map(|s| s.trim().to_string()),
        };
        require_non_blank(&[
            ("name", update.name.as_deref()),
            ("phone", update.phone.as_deref()),
            ("license_number", update.license_number.as_deref()),
        ])?;

        if update.is_empty() {
            return self.profile(driver_id).await;
        }

        self.drivers
            .update_profile(driver_id, update)
            .await?
            .ok_or_else(driver_not_found)
    }

    /// Sets the driver `online` or `offline`
    ///
    /// `busy` cannot be requested, and a busy driver cannot change status.
    pub async fn set_status(&self, driver_id: Uuid, status: DriverStatus) -> ServiceResult<Driver> {
        if !status.is_self_selectable() {
            return Err(ServiceError::BadRequest(
                "Status must be 'online' or 'offline'".to_string(),
            ));
        }

        let selectable = [DriverStatus::Online, DriverStatus::Offline];
        if let Some(driver) = self
            .drivers
            .transition_status(driver_id, &selectable, status)
            .await?
        {
            info!(driver_id = %driver_id, status = status.as_str(), "Driver status updated");
            return Ok(driver);
        }

        // Nothing matched: either the driver is gone or it is busy.
        match self.drivers.find_by_id(driver_id).await? {
            None => Err(driver_not_found()),
            Some(_) => Err(ServiceError::BadRequest(
                "Cannot change status while on a ride".to_string(),
            )),
        }
    }

    /// Deletes the driver's account.
    ///
    /// Rides keep the id of the driver who took them, so a driver with any
    /// accepted ride on record cannot be deleted.
    pub async fn delete_account(&self, driver_id: Uuid) -> ServiceResult<()> {
        if self.drivers.delete_if_idle(driver_id).await? {
            info!(driver_id = %driver_id, "Driver account deleted");
            return Ok(());
        }

        match self.drivers.find_by_id(driver_id).await? {
            None => Err(driver_not_found()),
            Some(driver) if driver.status == DriverStatus::Busy => Err(ServiceError::BadRequest(
                "Cannot delete account while on a ride".to_string(),
            )),
            Some(_) => Err(ServiceError::BadRequest(
                "Cannot delete account with ride history".to_string(),
            )),
        }
    }
}
