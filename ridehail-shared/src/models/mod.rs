/// Database models for the ride-hailing backend
///
/// Each model owns its SQL: static async functions that take any Postgres
/// executor, so the same query runs against the pool or inside a transaction.
///
/// # Models
///
/// - `account`: Rider and admin accounts
/// - `driver`: Drivers and their availability status
/// - `ride`: Ride requests and their lifecycle
///
/// # Example
///
/// ```no_run
/// use ridehail_shared::models::ride::{NewRide, Ride};
/// use ridehail_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let ride = Ride::create(&pool, NewRide {
///     rider_id: Uuid::new_v4(),
///     pickup_location: "Union Station".to_string(),
///     dropoff_location: "Airport".to_string(),
///     fare: 18.75,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod account;
pub mod driver;
pub mod ride;

/// A stored enum column held a value this build does not know
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: String) -> Self {
        Self { kind, value }
    }
}
