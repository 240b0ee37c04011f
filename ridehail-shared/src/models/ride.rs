/// Ride model and database operations
///
/// # State Machine
///
/// ```text
/// requested → in_progress → completed
/// requested → canceled
/// in_progress → canceled
/// ```
///
/// `completed` and `canceled` are terminal. Every status change goes through
/// [`Ride::transition`], which only touches the row while it is still in one of
/// the expected source states, so two concurrent writers can never both win.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE rides (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     rider_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     driver_id UUID REFERENCES drivers(id) ON DELETE RESTRICT,
///     pickup_location TEXT NOT NULL,
///     dropoff_location TEXT NOT NULL,
///     fare DOUBLE PRECISION NOT NULL CHECK (fare > 0),
///     status TEXT NOT NULL DEFAULT 'requested',
///     start_time TIMESTAMPTZ,
///     end_time TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     seq BIGINT GENERATED ALWAYS AS IDENTITY
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::UnknownVariant;

/// Ride lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Waiting for a driver
    Requested,

    /// A driver accepted and the trip is underway
    InProgress,

    /// Trip finished
    Completed,

    /// Canceled by the rider
    Canceled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Canceled)
    }

    /// Statuses from which a rider may cancel
    pub fn is_cancelable(&self) -> bool {
        matches!(self, RideStatus::Requested | RideStatus::InProgress)
    }

    pub fn can_transition_to(&self, target: RideStatus) -> bool {
        matches!(
            (self, target),
            (RideStatus::Requested, RideStatus::InProgress)
                | (RideStatus::Requested, RideStatus::Canceled)
                | (RideStatus::InProgress, RideStatus::Completed)
                | (RideStatus::InProgress, RideStatus::Canceled)
        )
    }
}

impl TryFrom<String> for RideStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "requested" => Ok(RideStatus::Requested),
            "in_progress" => Ok(RideStatus::InProgress),
            "completed" => Ok(RideStatus::Completed),
            "canceled" => Ok(RideStatus::Canceled),
            _ => Err(UnknownVariant::new("ride status", value)),
        }
    }
}

/// Ride record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ride {
    pub id: Uuid,

    /// Rider who requested (and owns) the ride
    pub rider_id: Uuid,

    /// Assigned driver, null until accepted
    pub driver_id: Option<Uuid>,

    pub pickup_location: String,
    pub dropoff_location: String,

    /// Estimated fare in currency units, rounded to cents
    pub fare: f64,

    #[sqlx(try_from = "String")]
    pub status: RideStatus,

    /// Set when a driver accepts
    pub start_time: Option<DateTime<Utc>>,

    /// Set when the ride completes or is canceled
    pub end_time: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a ride request
#[derive(Debug, Clone)]
pub struct NewRide {
    pub rider_id: Uuid,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub fare: f64,
}

impl Ride {
    /// Applies a status change to an in-memory copy with the same timestamp
    /// rules the database query uses
    pub fn apply_transition(&mut self, to: RideStatus, driver_id: Option<Uuid>, now: DateTime<Utc>) {
        self.status = to;
        if driver_id.is_some() {
            self.driver_id = driver_id;
        }
        match to {
            RideStatus::InProgress => self.start_time = Some(now),
            RideStatus::Completed | RideStatus::Canceled => self.end_time = Some(now),
            RideStatus::Requested => {}
        }
        self.updated_at = now;
    }

    pub async fn create<'e, E>(executor: E, data: NewRide) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Ride>(
            r#"
            INSERT INTO rides (rider_id, pickup_location, dropoff_location, fare)
            VALUES ($1, $2, $3, $4)
            RETURNING id, rider_id, driver_id, pickup_location, dropoff_location, fare,
                      status, start_time, end_time, created_at, updated_at
            "#,
        )
        .bind(data.rider_id)
        .bind(data.pickup_location)
        .bind(data.dropoff_location)
        .bind(data.fare)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Ride>(
            r#"
            SELECT id, rider_id, driver_id, pickup_location, dropoff_location, fare,
                   status, start_time, end_time, created_at, updated_at
            FROM rides
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Loads a ride and holds a row lock until the enclosing transaction ends
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Ride>(
            r#"
            SELECT id, rider_id, driver_id, pickup_location, dropoff_location, fare,
                   status, start_time, end_time, created_at, updated_at
            FROM rides
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a rider's rides, newest first; insertion order breaks ties
    pub async fn list_by_rider<'e, E>(executor: E, rider_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Ride>(
            r#"
            SELECT id, rider_id, driver_id, pickup_location, dropoff_location, fare,
                   status, start_time, end_time, created_at, updated_at
            FROM rides
            WHERE rider_id = $1
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .bind(rider_id)
        .fetch_all(executor)
        .await
    }

    /// Conditionally moves a ride to `to`
    ///
    /// The row is only updated while its status is one of `from`. When
    /// `driver_id` is given it is assigned in the same statement. Entering
    /// `in_progress` stamps `start_time`; entering a terminal status stamps
    /// `end_time`.
    ///
    /// Returns `None` when no row matched.
    pub async fn transition<'e, E>(
        executor: E,
        id: Uuid,
        from: &[RideStatus],
        to: RideStatus,
        driver_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        sqlx::query_as::<_, Ride>(
            r#"
            UPDATE rides
            SET status = $2,
                driver_id = COALESCE($3, driver_id),
                start_time = CASE WHEN $2 = 'in_progress' THEN NOW() ELSE start_time END,
                end_time = CASE WHEN $2 IN ('completed', 'canceled') THEN NOW() ELSE end_time END,
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($4)
            RETURNING id, rider_id, driver_id, pickup_location, dropoff_location, fare,
                      status, start_time, end_time, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(driver_id)
        .bind(from)
        .fetch_optional(executor)
        .await
    }
}
