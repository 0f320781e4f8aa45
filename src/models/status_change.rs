use uuid::Uuid;

use crate::geometry::Geom;
use crate::models::trip::VehicleType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "snake_case")]
pub enum EventType {
    Available,
    Reserved,
    Unavailable,
    Removed,
}

impl EventType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "reserved" => Some(Self::Reserved),
            "unavailable" => Some(Self::Unavailable),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Unavailable => "unavailable",
            Self::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "reason", rename_all = "snake_case")]
pub enum EventTypeReason {
    ServiceStart,
    UserDropOff,
    RebalanceDropOff,
    MaintenanceDropOff,
    UserPickUp,
    Maintenance,
    LowBattery,
    ServiceEnd,
    RebalancePickUp,
    MaintenancePickUp,
}

impl EventTypeReason {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "service_start" => Some(Self::ServiceStart),
            "user_drop_off" => Some(Self::UserDropOff),
            "rebalance_drop_off" => Some(Self::RebalanceDropOff),
            "maintenance_drop_off" => Some(Self::MaintenanceDropOff),
            "user_pick_up" => Some(Self::UserPickUp),
            "maintenance" => Some(Self::Maintenance),
            "low_battery" => Some(Self::LowBattery),
            "service_end" => Some(Self::ServiceEnd),
            "rebalance_pick_up" => Some(Self::RebalancePickUp),
            "maintenance_pick_up" => Some(Self::MaintenancePickUp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceStart => "service_start",
            Self::UserDropOff => "user_drop_off",
            Self::RebalanceDropOff => "rebalance_drop_off",
            Self::MaintenanceDropOff => "maintenance_drop_off",
            Self::UserPickUp => "user_pick_up",
            Self::Maintenance => "maintenance",
            Self::LowBattery => "low_battery",
            Self::ServiceEnd => "service_end",
            Self::RebalancePickUp => "rebalance_pick_up",
            Self::MaintenancePickUp => "maintenance_pick_up",
        }
    }
}

/// One row of the `status_changes` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChangeRecord {
    pub provider_id: Uuid,
    pub provider_name: String,
    pub device_id: Uuid,
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub propulsion_type: String,
    pub event_type: EventType,
    pub event_type_reason: EventTypeReason,
    pub event_time: i64,
    pub event_location: Geom,
    /// Charge level in `[0, 1]` by provider convention; not range-checked.
    pub battery_pct: Option<f64>,
    /// String-encoded list of trip ids, persisted verbatim.
    pub associated_trips: Option<String>,
}
