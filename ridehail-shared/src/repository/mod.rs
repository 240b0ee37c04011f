/// Repository traits for account, driver, and ride persistence.
///
/// Services depend on these traits instead of a connection pool so that the
/// ride workflow can run against PostgreSQL in production and against the
/// in-memory store in tests. Multi-row updates that must be atomic go through
/// [`TransactionManager::begin`], which hands out a [`RideTransaction`].

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    account::{Account, NewAccount},
    driver::{Driver, DriverProfileUpdate, DriverStatus, NewDriver},
    ride::{NewRide, Ride, RideStatus},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by repository implementations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique constraint rejected the write (e.g. duplicate email)
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Stored data could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence for rider and admin accounts
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts an account; duplicate emails fail with [`RepoError::UniqueViolation`]
    async fn create(&self, account: NewAccount) -> RepoResult<Account>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Account>>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>>;
}

/// Persistence for drivers
#[async_trait]
pub trait DriverRepository: Send + Sync {
    async fn create(&self, driver: NewDriver) -> RepoResult<Driver>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Driver>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Driver>>;

    /// Returns `None` if the driver does not exist
    async fn update_profile(
        &self,
        id: Uuid,
        update: DriverProfileUpdate,
    ) -> RepoResult<Option<Driver>>;

    /// Moves the driver to `to` only while its status is one of `from`
    async fn transition_status(
        &self,
        id: Uuid,
        from: &[DriverStatus],
        to: DriverStatus,
    ) -> RepoResult<Option<Driver>>;

    /// Deletes the driver unless busy or referenced by a ride; `false` if
    /// nothing was deleted
    async fn delete_if_idle(&self, id: Uuid) -> RepoResult<bool>;

    async fn count_by_status(&self, status: DriverStatus) -> RepoResult<i64>;
}

/// Persistence for rides outside of a transaction
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn create(&self, ride: NewRide) -> RepoResult<Ride>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Ride>>;

    /// All rides owned by the rider, newest first
    async fn list_by_rider(&self, rider_id: Uuid) -> RepoResult<Vec<Ride>>;
}

/// Opens transactions spanning rides and drivers
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn RideTransaction>>;

    /// Round-trips to the backing store
    async fn ping(&self) -> RepoResult<()>;
}

/// A single open transaction
///
/// Reads lock the rows they return until the transaction ends. Dropping the
/// transaction without calling [`RideTransaction::commit`] discards every
/// write made through it.
#[async_trait]
pub trait RideTransaction: Send {
    async fn lock_driver(&mut self, id: Uuid) -> RepoResult<Option<Driver>>;

    async fn lock_ride(&mut self, id: Uuid) -> RepoResult<Option<Ride>>;

    /// Conditional ride update, see [`Ride::transition`]
    async fn transition_ride(
        &mut self,
        id: Uuid,
        from: &[RideStatus],
        to: RideStatus,
        driver_id: Option<Uuid>,
    ) -> RepoResult<Option<Ride>>;

    /// Conditional driver status update, see [`Driver::transition_status`]
    async fn transition_driver(
        &mut self,
        id: Uuid,
        from: &[DriverStatus],
        to: DriverStatus,
    ) -> RepoResult<Option<Driver>>;

    async fn commit(self: Box<Self>) -> RepoResult<()>;

    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}

/// Bundle of repository handles shared by the services
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub drivers: Arc<dyn DriverRepository>,
    pub rides: Arc<dyn RideRepository>,
    pub transactions: Arc<dyn TransactionManager>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            accounts: store.clone(),
            drivers: store.clone(),
            rides: store.clone(),
            transactions: store,
        }
    }

    /// Process-local repositories, used by tests and local runs
    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    pub fn from_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            accounts: store.clone(),
            drivers: store.clone(),
            rides: store.clone(),
            transactions: store,
        }
    }
}
