/// Driver model and database operations
///
/// Drivers log in separately from riders and carry an availability status that
/// the ride workflow reads and mutates.
///
/// # Status Machine
///
/// ```text
/// offline ⇄ online        (login, explicit status updates)
/// online  → busy          (ride accepted)
/// busy    → online        (ride completed or canceled)
/// ```
///
/// `busy` is owned by the ride workflow: it is only entered by accepting a ride
/// and only left by finishing or canceling that ride.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE drivers (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     phone VARCHAR(32) NOT NULL,
///     license_number VARCHAR(64) NOT NULL,
///     password_hash TEXT NOT NULL,
///     status TEXT NOT NULL DEFAULT 'offline',
///     location TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::UnknownVariant;

/// Driver availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    /// Available to accept rides
    Online,

    /// Not accepting rides
    Offline,

    /// Assigned to an in-progress ride
    Busy,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Online => "online",
            DriverStatus::Offline => "offline",
            DriverStatus::Busy => "busy",
        }
    }

    /// Whether a driver may request this status directly
    pub fn is_self_selectable(&self) -> bool {
        matches!(self, DriverStatus::Online | DriverStatus::Offline)
    }
}

impl TryFrom<String> for DriverStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "online" => Ok(DriverStatus::Online),
            "offline" => Ok(DriverStatus::Offline),
            "busy" => Ok(DriverStatus::Busy),
            _ => Err(UnknownVariant::new("driver status", value)),
        }
    }
}

/// Driver record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,

    #[serde(skip_serializing, default)]
    pub password_hash: String,

    #[sqlx(try_from = "String")]
    pub status: DriverStatus,

    /// Free-text last known location
    pub location: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a driver
#[derive(Debug, Clone)]
pub struct NewDriver {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DriverProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub location: Option<String>,
}

impl DriverProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.license_number.is_none()
            && self.location.is_none()
    }
}

impl Driver {
    pub async fn create<'e, E>(executor: E, data: NewDriver) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (name, email, phone, license_number, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, phone, license_number, password_hash, status,
                      location, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.license_number)
        .bind(data.password_hash)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Driver>(
            r#"
            SELECT id, name, email, phone, license_number, password_hash, status,
                   location, created_at, updated_at
            FROM drivers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Loads a driver and holds a row lock until the enclosing transaction ends
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Driver>(
            r#"
            SELECT id, name, email, phone, license_number, password_hash, status,
                   location, created_at, updated_at
            FROM drivers
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Driver>(
            r#"
            SELECT id, name, email, phone, license_number, password_hash, status,
                   location, created_at, updated_at
            FROM drivers
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    pub async fn update_profile<'e, E>(
        executor: E,
        id: Uuid,
        update: DriverProfileUpdate,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                license_number = COALESCE($4, license_number),
                location = COALESCE($5, location),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, phone, license_number, password_hash, status,
                      location, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.phone)
        .bind(update.license_number)
        .bind(update.location)
        .fetch_optional(executor)
        .await
    }

    /// Moves a driver to `to` only if its current status is one of `from`
    ///
    /// Returns `None` when no row matched, either because the driver does not
    /// exist or because its status changed underneath the caller.
    pub async fn transition_status<'e, E>(
        executor: E,
        id: Uuid,
        from: &[DriverStatus],
        to: DriverStatus,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING id, name, email, phone, license_number, password_hash, status,
                      location, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(from)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a driver unless it is busy or any ride references it
    pub async fn delete_if_idle<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM drivers
            WHERE id = $1
              AND status <> 'busy'
              AND NOT EXISTS (SELECT 1 FROM rides WHERE driver_id = $1)
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_status<'e, E>(executor: E, status: DriverStatus) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM drivers WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(executor)
            .await
    }
}
