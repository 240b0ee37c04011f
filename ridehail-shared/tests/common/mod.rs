//! Shared fixtures for service-level tests.
//!
//! Everything runs against the in-memory store with a fixed trip distance, so
//! fares are deterministic: 2.50 + 1.25 * 8 km = 12.50.

#![allow(dead_code)]

use chrono::Duration;
use ridehail_shared::{
    auth::jwt::TokenIssuer,
    models::{account::Account, driver::Driver, driver::DriverStatus, ride::Ride},
    repository::Repositories,
    services::{
        accounts::RegisterAccount, drivers::RegisterDriver, AccountService, DriverService,
        FareConfig, FareEstimator, FixedDistance, RideSettings, RideWorkflow,
    },
};
use std::sync::Arc;
use uuid::Uuid;

pub const PASSWORD: &str = "Sturdy#Pass1";
pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const TRIP_KM: f64 = 8.0;
pub const EXPECTED_FARE: f64 = 12.5;

pub struct Harness {
    pub repos: Repositories,
    pub tokens: Arc<TokenIssuer>,
    pub accounts: AccountService,
    pub drivers: DriverService,
    pub rides: Arc<RideWorkflow>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(RideSettings::default())
    }

    pub fn with_settings(settings: RideSettings) -> Self {
        let repos = Repositories::in_memory();
        let tokens = Arc::new(TokenIssuer::new(SECRET, Duration::hours(1)));

        let fares = FareEstimator::new(FareConfig::default(), Box::new(FixedDistance(TRIP_KM)));

        Self {
            accounts: AccountService::new(repos.accounts.clone(), tokens.clone()),
            drivers: DriverService::new(repos.drivers.clone(), tokens.clone()),
            rides: Arc::new(RideWorkflow::new(&repos, fares, settings)),
            repos,
            tokens,
        }
    }

    pub async fn rider(&self, email: &str) -> Account {
        self.accounts
            .register(RegisterAccount {
                name: "Rita Rider".to_string(),
                email: email.to_string(),
                phone: "+15550100".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("rider registration should succeed")
    }

    pub async fn driver(&self, email: &str) -> Driver {
        self.drivers
            .register(RegisterDriver {
                name: "Dan Driver".to_string(),
                email: email.to_string(),
                phone: "+15550199".to_string(),
                license_number: "DL-0042".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("driver registration should succeed")
    }

    pub async fn online_driver(&self, email: &str) -> Driver {
        let driver = self.driver(email).await;
        self.drivers
            .set_status(driver.id, DriverStatus::Online)
            .await
            .expect("driver should go online")
    }

    pub async fn requested_ride(&self, rider_id: Uuid) -> Ride {
        self.rides
            .request_ride(rider_id, "A", "B")
            .await
            .expect("ride request should succeed")
    }

    pub async fn ride(&self, ride_id: Uuid) -> Ride {
        self.repos
            .rides
            .find_by_id(ride_id)
            .await
            .unwrap()
            .expect("ride should exist")
    }

    pub async fn driver_status(&self, driver_id: Uuid) -> DriverStatus {
        self.repos
            .drivers
            .find_by_id(driver_id)
            .await
            .unwrap()
            .expect("driver should exist")
            .status
    }
}
