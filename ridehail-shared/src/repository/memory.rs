/// In-memory implementation of the repository traits.
///
/// All tables live behind one async mutex. A transaction holds that mutex for
/// its whole lifetime and works on a copy of the tables, which is written back
/// on commit and dropped on rollback. Transactions are therefore fully
/// serialized, which gives the same exclusivity the row locks give in
/// PostgreSQL.
///
/// Code holding a [`RideTransaction`] from this store must not call the plain
/// repository methods on the same store until the transaction ends.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    AccountRepository, DriverRepository, RepoError, RepoResult, RideRepository, RideTransaction,
    TransactionManager,
};
use crate::models::{
    account::{Account, NewAccount},
    driver::{Driver, DriverProfileUpdate, DriverStatus, NewDriver},
    ride::{NewRide, Ride, RideStatus},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: Vec<Account>,
    drivers: Vec<Driver>,
    /// Insertion order, oldest first
    rides: Vec<Ride>,
}

impl Tables {
    fn driver_mut(&mut self, id: Uuid) -> Option<&mut Driver> {
        self.drivers.iter_mut().find(|d| d.id == id)
    }

    fn ride_mut(&mut self, id: Uuid) -> Option<&mut Ride> {
        self.rides.iter_mut().find(|r| r.id == id)
    }

    fn transition_driver(
        &mut self,
        id: Uuid,
        from: &[DriverStatus],
        to: DriverStatus,
    ) -> Option<Driver> {
        let driver = self.driver_mut(id)?;
        if !from.contains(&driver.status) {
            return None;
        }
        driver.status = to;
        driver.updated_at = Utc::now();
        Some(driver.clone())
    }

    fn transition_ride(
        &mut self,
        id: Uuid,
        from: &[RideStatus],
        to: RideStatus,
        driver_id: Option<Uuid>,
    ) -> Option<Ride> {
        let ride = self.ride_mut(id)?;
        if !from.contains(&ride.status) {
            return None;
        }
        ride.apply_transition(to, driver_id, Utc::now());
        Some(ride.clone())
    }
}

/// Shared in-process store; clones see the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create(&self, account: NewAccount) -> RepoResult<Account> {
        let mut tables = self.tables.lock().await;

        if tables
            .accounts
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(RepoError::UniqueViolation("accounts_email_unique".to_string()));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            phone: account.phone,
            password_hash: account.password_hash,
            role: account.role,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Account>> {
        let tables = self.tables.lock().await;
        Ok(tables.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl DriverRepository for MemoryStore {
    async fn create(&self, driver: NewDriver) -> RepoResult<Driver> {
        let mut tables = self.tables.lock().await;

        if tables
            .drivers
            .iter()
            .any(|d| d.email.eq_ignore_ascii_case(&driver.email))
        {
            return Err(RepoError::UniqueViolation("drivers_email_unique".to_string()));
        }

        let now = Utc::now();
        let driver = Driver {
            id: Uuid::new_v4(),
            name: driver.name,
            email: driver.email,
            phone: driver.phone,
            license_number: driver.license_number,
            password_hash: driver.password_hash,
            status: DriverStatus::Offline,
            location: None,
            created_at: now,
            updated_at: now,
        };
        tables.drivers.push(driver.clone());
        Ok(driver)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Driver>> {
        let tables = self.tables.lock().await;
        Ok(tables.drivers.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Driver>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .drivers
            .iter()
            .find(|d| d.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: DriverProfileUpdate,
    ) -> RepoResult<Option<Driver>> {
        let mut tables = self.tables.lock().await;
        let Some(driver) = tables.driver_mut(id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            driver.name = name;
        }
        if let Some(phone) = update.phone {
            driver.phone = phone;
        }
        if let Some(license_number) = update.license_number {
            driver.license_number = license_number;
        }
        if let Some(location) = update.location {
            driver.location = Some(location);
        }
        driver.updated_at = Utc::now();

        Ok(Some(driver.clone()))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: &[DriverStatus],
        to: DriverStatus,
    ) -> RepoResult<Option<Driver>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.transition_driver(id, from, to))
    }

    async fn delete_if_idle(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.rides.iter().any(|r| r.driver_id == Some(id)) {
            return Ok(false);
        }

        let before = tables.drivers.len();
        tables
            .drivers
            .retain(|d| d.id != id || d.status == DriverStatus::Busy);

        Ok(tables.drivers.len() < before)
    }

    async fn count_by_status(&self, status: DriverStatus) -> RepoResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.drivers.iter().filter(|d| d.status == status).count() as i64)
    }
}

#[async_trait]
impl RideRepository for MemoryStore {
    async fn create(&self, ride: NewRide) -> RepoResult<Ride> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let ride = Ride {
            id: Uuid::new_v4(),
            rider_id: ride.rider_id,
            driver_id: None,
            pickup_location: ride.pickup_location,
            dropoff_location: ride.dropoff_location,
            fare: ride.fare,
            status: RideStatus::Requested,
            start_time: None,
            end_time: None,
            created_at: now,
            updated_at: now,
        };
        tables.rides.push(ride.clone());
        Ok(ride)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Ride>> {
        let tables = self.tables.lock().await;
        Ok(tables.rides.iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_rider(&self, rider_id: Uuid) -> RepoResult<Vec<Ride>> {
        let tables = self.tables.lock().await;
        let mut rides: Vec<Ride> = tables
            .rides
            .iter()
            .rev()
            .filter(|r| r.rider_id == rider_id)
            .cloned()
            .collect();
        // Stable, so equal timestamps stay newest-inserted first
        rides.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rides)
    }
}

#[async_trait]
impl TransactionManager for MemoryStore {
    async fn begin(&self) -> RepoResult<Box<dyn RideTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

/// Exclusive transaction over the whole store
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl RideTransaction for MemoryTransaction {
    async fn lock_driver(&mut self, id: Uuid) -> RepoResult<Option<Driver>> {
        Ok(self.working.drivers.iter().find(|d| d.id == id).cloned())
    }

    async fn lock_ride(&mut self, id: Uuid) -> RepoResult<Option<Ride>> {
        Ok(self.working.rides.iter().find(|r| r.id == id).cloned())
    }

    async fn transition_ride(
        &mut self,
        id: Uuid,
        from: &[RideStatus],
        to: RideStatus,
        driver_id: Option<Uuid>,
    ) -> RepoResult<Option<Ride>> {
        Ok(self.working.transition_ride(id, from, to, driver_id))
    }

    async fn transition_driver(
        &mut self,
        id: Uuid,
        from: &[DriverStatus],
        to: DriverStatus,
    ) -> RepoResult<Option<Driver>> {
        Ok(self.working.transition_driver(id, from, to))
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_driver(email: &str) -> NewDriver {
        NewDriver {
            name: "Dana".to_string(),
            email: email.to_string(),
            phone: "+15550101".to_string(),
            license_number: "D-1234".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_driver_email_is_unique_case_insensitively() {
        let store = MemoryStore::new();
        DriverRepository::create(&store, new_driver("dana@example.com"))
            .await
            .unwrap();

        let err = DriverRepository::create(&store, new_driver("DANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let driver = DriverRepository::create(&store, new_driver("d@example.com"))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        let moved = tx
            .transition_driver(driver.id, &[DriverStatus::Offline], DriverStatus::Online)
            .await
            .unwrap();
        assert!(moved.is_some());
        tx.rollback().await.unwrap();

        let reloaded = DriverRepository::find_by_id(&store, driver.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, DriverStatus::Offline);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        let driver = DriverRepository::create(&store, new_driver("d@example.com"))
            .await
            .unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.transition_driver(driver.id, &[DriverStatus::Offline], DriverStatus::Online)
                .await
                .unwrap();
        }

        let reloaded = DriverRepository::find_by_id(&store, driver.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, DriverStatus::Offline);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();
        let driver = DriverRepository::create(&store, new_driver("d@example.com"))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.transition_driver(driver.id, &[DriverStatus::Offline], DriverStatus::Online)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let reloaded = DriverRepository::find_by_id(&store, driver.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, DriverStatus::Online);
    }

    #[tokio::test]
    async fn test_conditional_transition_requires_matching_status() {
        let store = MemoryStore::new();
        let driver = DriverRepository::create(&store, new_driver("d@example.com"))
            .await
            .unwrap();

        let result = store
            .transition_status(driver.id, &[DriverStatus::Online], DriverStatus::Busy)
            .await
            .unwrap();
        assert!(result.is_none());

        let missing = store
            .transition_status(Uuid::new_v4(), &[DriverStatus::Offline], DriverStatus::Online)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_busy_driver_is_not_deleted() {
        let store = MemoryStore::new();
        let driver = DriverRepository::create(&store, new_driver("d@example.com"))
            .await
            .unwrap();
        store
            .transition_status(driver.id, &[DriverStatus::Offline], DriverStatus::Busy)
            .await
            .unwrap();

        assert!(!store.delete_if_idle(driver.id).await.unwrap());

        store
            .transition_status(driver.id, &[DriverStatus::Busy], DriverStatus::Online)
            .await
            .unwrap();
        assert!(store.delete_if_idle(driver.id).await.unwrap());
        assert!(DriverRepository::find_by_id(&store, driver.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_driver_with_rides_is_not_deleted() {
        let store = MemoryStore::new();
        let driver = DriverRepository::create(&store, new_driver("d@example.com"))
            .await
            .unwrap();
        let ride = RideRepository::create(
            &store,
            NewRide {
                rider_id: Uuid::new_v4(),
                pickup_location: "A".to_string(),
                dropoff_location: "B".to_string(),
                fare: 10.0,
            },
        )
        .await
        .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.transition_ride(
            ride.id,
            &[RideStatus::Requested],
            RideStatus::InProgress,
            Some(driver.id),
        )
        .await
        .unwrap();
        tx.transition_ride(ride.id, &[RideStatus::InProgress], RideStatus::Completed, None)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(!store.delete_if_idle(driver.id).await.unwrap());
        let ride = RideRepository::find_by_id(&store, ride.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ride.driver_id, Some(driver.id));
    }

    #[tokio::test]
    async fn test_rides_listed_newest_first() {
        let store = MemoryStore::new();
        let rider_id = Uuid::new_v4();

        let mut ids = Vec::new();
        for stop in ["A", "B", "C"] {
            let ride = RideRepository::create(
                &store,
                NewRide {
                    rider_id,
                    pickup_location: stop.to_string(),
                    dropoff_location: "Z".to_string(),
                    fare: 10.0,
                },
            )
            .await
            .unwrap();
            ids.push(ride.id);
        }
        RideRepository::create(
            &store,
            NewRide {
                rider_id: Uuid::new_v4(),
                pickup_location: "X".to_string(),
                dropoff_location: "Y".to_string(),
                fare: 10.0,
            },
        )
        .await
        .unwrap();

        let listed: Vec<Uuid> = store
            .list_by_rider(rider_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_rides_with_equal_timestamps_listed_by_insertion() {
        let store = MemoryStore::new();
        let rider_id = Uuid::new_v4();

        let mut ids = Vec::new();
        for stop in ["A", "B", "C"] {
            let ride = RideRepository::create(
                &store,
                NewRide {
                    rider_id,
                    pickup_location: stop.to_string(),
                    dropoff_location: "Z".to_string(),
                    fare: 10.0,
                },
            )
            .await
            .unwrap();
            ids.push(ride.id);
        }

        {
            let mut tables = store.tables.lock().await;
            let stamp = tables.rides[0].created_at;
            for ride in tables.rides.iter_mut() {
                ride.created_at = stamp;
            }
        }

        let listed: Vec<Uuid> = store
            .list_by_rider(rider_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }
}
