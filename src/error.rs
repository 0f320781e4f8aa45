use thiserror::Error;
use uuid::Uuid;

/// Defect-class geometry failures. These indicate a bug in normalization or
/// projection rather than bad provider input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("cannot build a line from zero points")]
    EmptyGeometry,
    #[error("invalid coordinate pair: {0}")]
    InvalidCoordinate(String),
}

/// A single raw feed record that could not be coerced to its target shape.
/// Skipped and aggregated per batch; never aborts the surrounding load.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("malformed record field `{field}`: {reason}")]
pub struct MalformedRecord {
    pub field: &'static str,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Invocation-fatal failures, surfaced to the scheduler for its own
/// retry/alert policy. The loader never retries internally.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("object `{key}` not found in storage")]
    ObjectNotFound { key: String },

    #[error("failed to decode feed object as a JSON array: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("route point references trip {trip_id} missing from the batch")]
    ReferentialIntegrity { trip_id: Uuid },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("storage fetch failed: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("append to `{table}` failed: {source}")]
    Sink {
        table: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
