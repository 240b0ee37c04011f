/// PostgreSQL implementation of the repository traits.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
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

/// Repositories backed by a connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations to [`RepoError::UniqueViolation`]
fn map_write_error(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return RepoError::UniqueViolation(constraint);
        }
    }
    map_read_error(err)
}

fn map_read_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::ColumnDecode { index, source } => {
            RepoError::Corrupt(format!("column {}: {}", index, source))
        }
        other => RepoError::Database(other),
    }
}

#[async_trait]
impl AccountRepository for PgStore {
    async fn create(&self, account: NewAccount) -> RepoResult<Account> {
        Account::create(&self.pool, account)
            .await
            .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Account>> {
        Account::find_by_id(&self.pool, id)
            .await
            .map_err(map_read_error)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        Account::find_by_email(&self.pool, email)
            .await
            .map_err(map_read_error)
    }
}

#[async_trait]
impl DriverRepository for PgStore {
    async fn create(&self, driver: NewDriver) -> RepoResult<Driver> {
        Driver::create(&self.pool, driver)
            .await
            .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Driver>> {
        Driver::find_by_id(&self.pool, id)
            .await
            .map_err(map_read_error)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Driver>> {
        Driver::find_by_email(&self.pool, email)
            .await
            .map_err(map_read_error)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: DriverProfileUpdate,
    ) -> RepoResult<Option<Driver>> {
        Driver::update_profile(&self.pool, id, update)
            .await
            .map_err(map_write_error)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: &[DriverStatus],
        to: DriverStatus,
    ) -> RepoResult<Option<Driver>> {
        Driver::transition_status(&self.pool, id, from, to)
            .await
            .map_err(map_read_error)
    }

    async fn delete_if_idle(&self, id: Uuid) -> RepoResult<bool> {
        match Driver::delete_if_idle(&self.pool, id).await {
            Ok(deleted) => Ok(deleted),
            // A ride committed between the check and the delete
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Ok(false),
            Err(err) => Err(map_read_error(err)),
        }
    }

    async fn count_by_status(&self, status: DriverStatus) -> RepoResult<i64> {
        Driver::count_by_status(&self.pool, status)
            .await
            .map_err(map_read_error)
    }
}

#[async_trait]
impl RideRepository for PgStore {
    async fn create(&self, ride: NewRide) -> RepoResult<Ride> {
        Ride::create(&self.pool, ride).await.map_err(map_write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Ride>> {
        Ride::find_by_id(&self.pool, id).await.map_err(map_read_error)
    }

    async fn list_by_rider(&self, rider_id: Uuid) -> RepoResult<Vec<Ride>> {
        Ride::list_by_rider(&self.pool, rider_id)
            .await
            .map_err(map_read_error)
    }
}

#[async_trait]
impl TransactionManager for PgStore {
    async fn begin(&self) -> RepoResult<Box<dyn RideTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgRideTransaction { tx }))
    }

    async fn ping(&self) -> RepoResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}

/// Open PostgreSQL transaction; rolled back by sqlx on drop if not committed
pub struct PgRideTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RideTransaction for PgRideTransaction {
    async fn lock_driver(&mut self, id: Uuid) -> RepoResult<Option<Driver>> {
        Driver::find_by_id_for_update(&mut *self.tx, id)
            .await
            .map_err(map_read_error)
    }

    async fn lock_ride(&mut self, id: Uuid) -> RepoResult<Option<Ride>> {
        Ride::find_by_id_for_update(&mut *self.tx, id)
            .await
            .map_err(map_read_error)
    }

    async fn transition_ride(
        &mut self,
        id: Uuid,
        from: &[RideStatus],
        to: RideStatus,
        driver_id: Option<Uuid>,
    ) -> RepoResult<Option<Ride>> {
        Ride::transition(&mut *self.tx, id, from, to, driver_id)
            .await
            .map_err(map_read_error)
    }

    async fn transition_driver(
        &mut self,
        id: Uuid,
        from: &[DriverStatus],
        to: DriverStatus,
    ) -> RepoResult<Option<Driver>> {
        Driver::transition_status(&mut *self.tx, id, from, to)
            .await
            .map_err(map_read_error)
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
