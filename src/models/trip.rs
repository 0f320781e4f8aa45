use uuid::Uuid;

use crate::geometry::Geom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
pub enum VehicleType {
    Bicycle,
    Scooter,
}

impl VehicleType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bicycle" => Some(Self::Bicycle),
            "scooter" => Some(Self::Scooter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bicycle => "bicycle",
            Self::Scooter => "scooter",
        }
    }
}

/// One row of the `trips` table. `route` is the simplified line built from
/// the feed's route point sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub provider_id: Uuid,
    pub provider_name: String,
    pub device_id: Uuid,
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub propulsion_type: String,
    pub trip_id: Uuid,
    pub trip_duration: i64,
    pub trip_distance: i64,
    pub accuracy: i32,
    pub start_time: i64,
    pub end_time: i64,
    pub parking_verification_url: Option<String>,
    pub standard_cost: Option<f64>,
    pub actual_cost: Option<f64>,
    pub route: Geom,
}

/// One row of the `trip_routes` table: a single location ping of one trip.
/// Rows are emitted in source order, which also defines the trip's line.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePoint {
    pub trip_id: Uuid,
    pub time_update: i64,
    pub geom: Geom,
}
