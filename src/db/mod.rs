use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::models::status_change::StatusChangeRecord;
use crate::models::trip::{RoutePoint, TripRecord};

pub mod queries;

pub type DbPool = Pool<Postgres>;

pub async fn init_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Append-only write capability handed to the loader. Each call is
/// all-or-nothing for its table; the loader sequences calls and logs
/// completions so a mid-load failure is reconcilable.
#[async_trait]
pub trait FeedSink: Send + Sync {
    async fn append_trips(&self, trips: &[TripRecord]) -> Result<()>;
    async fn append_route_points(&self, points: &[RoutePoint]) -> Result<()>;
    async fn append_status_changes(&self, records: &[StatusChangeRecord]) -> Result<()>;
}

pub struct PgFeedSink {
    pool: DbPool,
}

impl PgFeedSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedSink for PgFeedSink {
    async fn append_trips(&self, trips: &[TripRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for trip in trips {
            sqlx::query(queries::INSERT_TRIP)
                .bind(trip.provider_id)
                .bind(&trip.provider_name)
                .bind(trip.device_id)
                .bind(&trip.vehicle_id)
                .bind(trip.vehicle_type)
                .bind(&trip.propulsion_type)
                .bind(trip.trip_id)
                .bind(trip.trip_duration)
                .bind(trip.trip_distance)
                .bind(trip.accuracy)
                .bind(trip.start_time)
                .bind(trip.end_time)
                .bind(trip.parking_verification_url.as_deref())
                .bind(trip.standard_cost)
                .bind(trip.actual_cost)
                .bind(trip.route.to_ewkt())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn append_route_points(&self, points: &[RoutePoint]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for point in points {
            sqlx::query(queries::INSERT_TRIP_ROUTE_POINT)
                .bind(point.trip_id)
                .bind(point.time_update)
                .bind(point.geom.to_ewkt())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn append_status_changes(&self, records: &[StatusChangeRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(queries::INSERT_STATUS_CHANGE)
                .bind(record.provider_id)
                .bind(&record.provider_name)
                .bind(record.device_id)
                .bind(&record.vehicle_id)
                .bind(record.vehicle_type)
                .bind(&record.propulsion_type)
                .bind(record.event_type)
                .bind(record.event_type_reason)
                .bind(record.event_time)
                .bind(record.event_location.to_ewkt())
                .bind(record.battery_pct)
                .bind(record.associated_trips.as_deref())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
