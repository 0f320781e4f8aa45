//! One (provider, feed, window) unit of work: fetch, decode, normalize,
//! project, persist. Sequential, no internal retries; a failed invocation is
//! surfaced whole to the scheduler.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::db::FeedSink;
use crate::error::LoadError;
use crate::models::feed::{EventLocationShape, Feed};
use crate::normalize::{self, RawRecord};
use crate::project;
use crate::storage::{object_key, ObjectStore};

/// Each invocation covers a 24-hour window starting at the scheduled run time.
pub const WINDOW_SECONDS: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Fetching,
    Decoding,
    Normalizing,
    Projecting,
    Persisting,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Decoding => "decoding",
            Self::Normalizing => "normalizing",
            Self::Projecting => "projecting",
            Self::Persisting => "persisting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LoadError {
    /// The pipeline stage this error aborted.
    pub fn stage(&self) -> Stage {
        match self {
            Self::ObjectNotFound { .. } | Self::Storage(_) => Stage::Fetching,
            Self::Decode(_) => Stage::Decoding,
            Self::Geometry(_) => Stage::Normalizing,
            Self::ReferentialIntegrity { .. } => Stage::Projecting,
            Self::Sink { .. } => Stage::Persisting,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub provider_name: String,
    pub feed: Feed,
    /// Window start, epoch seconds. The scheduler's run timestamp.
    pub window_start: i64,
    pub event_location_shape: EventLocationShape,
}

/// Serializable so callers can log or export the result of a run.
#[derive(Debug, Default, Serialize)]
pub struct LoadSummary {
    pub key: String,
    pub stage: Stage,
    pub records_in: usize,
    pub records_skipped: usize,
    pub skip_reasons: Vec<String>,
    pub trips_dropped_short_route: usize,
    pub trips_written: usize,
    pub route_points_written: usize,
    pub status_changes_written: usize,
}

/// Runs one load with injected storage and sink capabilities. Holds no other
/// state; every invocation's data is owned by that invocation.
pub struct FeedLoader<S, K> {
    store: S,
    sink: K,
}

impl<S: ObjectStore, K: FeedSink> FeedLoader<S, K> {
    pub fn new(store: S, sink: K) -> Self {
        Self { store, sink }
    }

    pub async fn run(&self, request: &LoadRequest) -> Result<LoadSummary, LoadError> {
        let window_end = request.window_start + WINDOW_SECONDS;
        let key = object_key(
            request.window_start,
            window_end,
            &request.provider_name,
            request.feed,
        );

        info!(key = %key, feed = %request.feed, "fetching feed object");
        let bytes = self
            .store
            .fetch(&key)
            .await
            .map_err(LoadError::Storage)?
            .ok_or_else(|| LoadError::ObjectNotFound { key: key.clone() })?;

        let raw: Vec<RawRecord> = serde_json::from_slice(&bytes)?;
        info!(records = raw.len(), "decoded feed object");

        let mut summary = LoadSummary {
            key,
            records_in: raw.len(),
            ..LoadSummary::default()
        };

        if raw.is_empty() {
            info!("empty feed window, nothing to load");
            summary.stage = Stage::Done;
            return Ok(summary);
        }

        match request.feed {
            Feed::Trips => self.load_trips(&raw, &mut summary).await?,
            Feed::StatusChanges => {
                self.load_status_changes(&raw, request.event_location_shape, &mut summary)
                    .await?
            }
        }

        if summary.records_skipped > 0 {
            warn!(
                skipped = summary.records_skipped,
                reasons = ?summary.skip_reasons,
                "some records were malformed and skipped"
            );
        }

        summary.stage = Stage::Done;
        Ok(summary)
    }

    async fn load_trips(
        &self,
        raw: &[RawRecord],
        summary: &mut LoadSummary,
    ) -> Result<(), LoadError> {
        let batch = normalize::normalize_trips(raw);
        summary.records_skipped = batch.skipped.len();
        summary.skip_reasons = batch.skipped.iter().map(ToString::to_string).collect();
        summary.trips_dropped_short_route = batch.dropped_short_routes;

        let tables = project::project_trips(batch.trips, batch.route_points)?;

        // Trips land before their route points so a mid-load failure leaves
        // orphaned trip rows rather than dangling route rows.
        self.sink
            .append_trips(&tables.trips)
            .await
            .map_err(|e| LoadError::Sink {
                table: "trips",
                source: e,
            })?;
        summary.trips_written = tables.trips.len();
        info!(rows = tables.trips.len(), "committed trips");

        self.sink
            .append_route_points(&tables.routes)
            .await
            .map_err(|e| LoadError::Sink {
                table: "trip_routes",
                source: e,
            })?;
        summary.route_points_written = tables.routes.len();
        info!(rows = tables.routes.len(), "committed trip routes");

        Ok(())
    }

    async fn load_status_changes(
        &self,
        raw: &[RawRecord],
        shape: EventLocationShape,
        summary: &mut LoadSummary,
    ) -> Result<(), LoadError> {
        let batch = normalize::normalize_status_changes(raw, shape);
        summary.records_skipped = batch.skipped.len();
        summary.skip_reasons = batch.skipped.iter().map(ToString::to_string).collect();

        let rows = project::project_status_changes(batch.records);

        self.sink
            .append_status_changes(&rows)
            .await
            .map_err(|e| LoadError::Sink {
                table: "status_changes",
                source: e,
            })?;
        summary.status_changes_written = rows.len();
        info!(rows = rows.len(), "committed status changes");

        Ok(())
    }
}
