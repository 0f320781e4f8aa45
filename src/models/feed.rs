use std::fmt;

/// Which provider feed a load invocation covers. Selects the
/// normalizer/projector pair; the two pipelines share only geometry building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Trips,
    StatusChanges,
}

impl Feed {
    /// Feed name as it appears in storage object keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trips => "trips",
            Self::StatusChanges => "status_changes",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `event_location` is shaped in a status_changes dump. Supplied by the
/// caller per invocation; mixed-shape batches are a caller error, so the
/// normalizer never sniffs the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLocationShape {
    /// A bare GeoJSON geometry object.
    Bare,
    /// A full GeoJSON Feature with the geometry under a `geometry` key.
    Feature,
}
