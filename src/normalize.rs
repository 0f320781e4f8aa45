//! Coerces raw feed records into typed rows.
//!
//! Raw records are dynamic JSON objects; everything past this module is a
//! typed `TripRecord` / `StatusChangeRecord` or a structured error. A single
//! malformed record is skipped and reported, never fatal to its batch.

use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MalformedRecord;
use crate::geometry::{build_line, to_point, Geom};
use crate::models::feed::EventLocationShape;
use crate::models::status_change::{EventType, EventTypeReason, StatusChangeRecord};
use crate::models::trip::{RoutePoint, TripRecord, VehicleType};

/// An untyped feed record as decoded from the storage object.
pub type RawRecord = Map<String, Value>;

/// Outcome of normalizing one `trips` dump. `trips` and `route_points` stay
/// index-aligned with the source feature order within each trip.
#[derive(Debug, Default)]
pub struct TripBatch {
    pub trips: Vec<TripRecord>,
    pub route_points: Vec<RoutePoint>,
    pub skipped: Vec<MalformedRecord>,
    pub dropped_short_routes: usize,
}

#[derive(Debug, Default)]
pub struct StatusChangeBatch {
    pub records: Vec<StatusChangeRecord>,
    pub skipped: Vec<MalformedRecord>,
}

/// Normalizes a `trips` dump, skipping malformed records and dropping trips
/// whose route carries fewer than two point features.
pub fn normalize_trips(raw: &[RawRecord]) -> TripBatch {
    let mut batch = TripBatch::default();

    for record in raw {
        if route_feature_count(record).is_some_and(|n| n < 2) {
            debug!("dropping trip with fewer than two route points");
            batch.dropped_short_routes += 1;
            continue;
        }
        match normalize_trip(record) {
            Ok((trip, points)) => {
                batch.trips.push(trip);
                batch.route_points.extend(points);
            }
            Err(e) => {
                warn!(field = e.field, reason = %e.reason, "skipping malformed trip record");
                batch.skipped.push(e);
            }
        }
    }

    batch
}

/// Normalizes a `status_changes` dump. `shape` selects how `event_location`
/// is extracted; it is never inferred from the payload.
pub fn normalize_status_changes(raw: &[RawRecord], shape: EventLocationShape) -> StatusChangeBatch {
    let mut batch = StatusChangeBatch::default();

    for record in raw {
        match normalize_status_change(record, shape) {
            Ok(rec) => batch.records.push(rec),
            Err(e) => {
                warn!(field = e.field, reason = %e.reason, "skipping malformed status change record");
                batch.skipped.push(e);
            }
        }
    }

    batch
}

/// Coerces one raw trip record, returning the trip row plus one route row
/// per point feature, in source order.
pub fn normalize_trip(raw: &RawRecord) -> Result<(TripRecord, Vec<RoutePoint>), MalformedRecord> {
    let trip_id = req_uuid(raw, "trip_id")?;
    let (route, route_points) = extract_route(raw, trip_id)?;

    let trip = TripRecord {
        provider_id: req_uuid(raw, "provider_id")?,
        provider_name: req_string(raw, "provider_name")?,
        device_id: req_uuid(raw, "device_id")?,
        vehicle_id: req_string(raw, "vehicle_id")?,
        vehicle_type: req_vehicle_type(raw)?,
        propulsion_type: req_string(raw, "propulsion_type")?,
        trip_id,
        trip_duration: req_i64(raw, "trip_duration")?,
        trip_distance: req_i64(raw, "trip_distance")?,
        accuracy: i32::try_from(req_i64(raw, "accuracy")?)
            .map_err(|_| MalformedRecord::new("accuracy", "out of range"))?,
        start_time: req_i64(raw, "start_time")?,
        end_time: req_i64(raw, "end_time")?,
        parking_verification_url: opt_string(raw, "parking_verification_url"),
        standard_cost: opt_f64(raw, "standard_cost")?,
        actual_cost: opt_f64(raw, "actual_cost")?,
        route,
    };

    Ok((trip, route_points))
}

/// Coerces one raw status change record.
pub fn normalize_status_change(
    raw: &RawRecord,
    shape: EventLocationShape,
) -> Result<StatusChangeRecord, MalformedRecord> {
    let event_type_str = req_string(raw, "event_type")?;
    let event_type = EventType::parse(&event_type_str).ok_or_else(|| {
        MalformedRecord::new("event_type", format!("unknown event type `{event_type_str}`"))
    })?;

    let reason_str = req_string(raw, "event_type_reason")?;
    let event_type_reason = EventTypeReason::parse(&reason_str).ok_or_else(|| {
        MalformedRecord::new(
            "event_type_reason",
            format!("unknown event type reason `{reason_str}`"),
        )
    })?;

    Ok(StatusChangeRecord {
        provider_id: req_uuid(raw, "provider_id")?,
        provider_name: req_string(raw, "provider_name")?,
        device_id: req_uuid(raw, "device_id")?,
        vehicle_id: req_string(raw, "vehicle_id")?,
        vehicle_type: req_vehicle_type(raw)?,
        propulsion_type: req_string(raw, "propulsion_type")?,
        event_type,
        event_type_reason,
        event_time: req_i64(raw, "event_time")?,
        event_location: extract_event_location(raw, shape)?,
        battery_pct: opt_f64(raw, "battery_pct")?,
        associated_trips: raw.get("associated_trips").map(stringify),
    })
}

/// Walks the GeoJSON feature collection under `route`, producing the trip's
/// simplified line and the aligned per-point rows.
fn extract_route(raw: &RawRecord, trip_id: Uuid) -> Result<(Geom, Vec<RoutePoint>), MalformedRecord> {
    let value = req(raw, "route")?;
    let collection = geojson::FeatureCollection::try_from(value.clone())
        .map_err(|e| MalformedRecord::new("route", format!("not a feature collection: {e}")))?;

    if collection.features.is_empty() {
        return Err(MalformedRecord::new("route", "no point features"));
    }

    let mut vertices = Vec::with_capacity(collection.features.len());
    let mut points = Vec::with_capacity(collection.features.len());

    for feature in &collection.features {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| MalformedRecord::new("route", "feature missing geometry"))?;
        let coords = match &geometry.value {
            geojson::Value::Point(pos) => pos,
            other => {
                return Err(MalformedRecord::new(
                    "route",
                    format!("expected Point features, got {}", other.type_name()),
                ))
            }
        };
        let geom = to_point(coords).map_err(|e| MalformedRecord::new("route", e.to_string()))?;

        let timestamp = feature
            .property("timestamp")
            .ok_or_else(|| MalformedRecord::new("route", "feature missing timestamp property"))?;
        let time_update = coerce_i64(timestamp).map_err(|reason| MalformedRecord::new("route", reason))?;

        vertices.push((coords[0], coords[1]));
        points.push(RoutePoint {
            trip_id,
            time_update,
            geom,
        });
    }

    let line = build_line(&vertices).map_err(|e| MalformedRecord::new("route", e.to_string()))?;
    Ok((line, points))
}

fn extract_event_location(
    raw: &RawRecord,
    shape: EventLocationShape,
) -> Result<Geom, MalformedRecord> {
    let value = req(raw, "event_location")?;
    let geometry_value = match shape {
        EventLocationShape::Bare => value,
        EventLocationShape::Feature => value
            .get("geometry")
            .ok_or_else(|| MalformedRecord::new("event_location", "feature missing geometry key"))?,
    };

    let geometry = geojson::Geometry::try_from(geometry_value.clone())
        .map_err(|e| MalformedRecord::new("event_location", format!("not a geometry: {e}")))?;
    match geometry.value {
        geojson::Value::Point(pos) => {
            to_point(&pos).map_err(|e| MalformedRecord::new("event_location", e.to_string()))
        }
        other => Err(MalformedRecord::new(
            "event_location",
            format!("expected a Point geometry, got {}", other.type_name()),
        )),
    }
}

/// `None` when the record has no parseable feature list at all; such records
/// fall through to normalization and fail there with a field-level error.
fn route_feature_count(raw: &RawRecord) -> Option<usize> {
    raw.get("route")?
        .get("features")?
        .as_array()
        .map(Vec::len)
}

fn req<'a>(raw: &'a RawRecord, field: &'static str) -> Result<&'a Value, MalformedRecord> {
    raw.get(field)
        .ok_or_else(|| MalformedRecord::new(field, "missing"))
}

fn req_string(raw: &RawRecord, field: &'static str) -> Result<String, MalformedRecord> {
    match req(raw, field)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(MalformedRecord::new(
            field,
            format!("expected a string, got {other}"),
        )),
    }
}

fn req_uuid(raw: &RawRecord, field: &'static str) -> Result<Uuid, MalformedRecord> {
    let s = req_string(raw, field)?;
    Uuid::parse_str(&s).map_err(|_| MalformedRecord::new(field, format!("`{s}` is not a UUID")))
}

fn req_i64(raw: &RawRecord, field: &'static str) -> Result<i64, MalformedRecord> {
    coerce_i64(req(raw, field)?).map_err(|reason| MalformedRecord::new(field, reason))
}

fn req_vehicle_type(raw: &RawRecord) -> Result<VehicleType, MalformedRecord> {
    let s = req_string(raw, "vehicle_type")?;
    VehicleType::parse(&s)
        .ok_or_else(|| MalformedRecord::new("vehicle_type", format!("unknown vehicle type `{s}`")))
}

fn opt_string(raw: &RawRecord, field: &'static str) -> Option<String> {
    match raw.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
        None => None,
    }
}

fn opt_f64(raw: &RawRecord, field: &'static str) -> Result<Option<f64>, MalformedRecord> {
    match raw.get(field) {
        Some(value) => coerce_f64(value)
            .map(Some)
            .map_err(|reason| MalformedRecord::new(field, reason)),
        None => Ok(None),
    }
}

/// Accepts a JSON number or a numeric string, the way provider dumps mix
/// the two. Mirrors the lenient coercion the feeds require.
fn coerce_i64(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| format!("`{n}` is not an integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("`{s}` is not an integer")),
        other => Err(format!("expected an integer, got {other}")),
    }
}

fn coerce_f64(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("`{n}` is not a number")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("`{s}` is not a number")),
        other => Err(format!("expected a number, got {other}")),
    }
}

/// `associated_trips` arrives as a JSON list; it is persisted as text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        value.as_object().unwrap().clone()
    }

    fn route_feature(lon: f64, lat: f64, ts: i64) -> Value {
        json!({
            "type": "Feature",
            "properties": { "timestamp": ts },
            "geometry": { "type": "Point", "coordinates": [lon, lat] }
        })
    }

    fn trip_json() -> Value {
        json!({
            "provider_id": "a5f7a24c-5302-4a06-9d84-e0f13ef4db02",
            "provider_name": "lemon",
            "device_id": "3e5c63b1-4c5e-4a29-97ac-f1fbbf4cbb31",
            "vehicle_id": "v-100",
            "vehicle_type": "scooter",
            "propulsion_type": "electric",
            "trip_id": "9a2f8c3d-0c7b-4e2a-91a4-2e9a3c0a6d11",
            "trip_duration": 360,
            "trip_distance": 1200,
            "accuracy": 5,
            "start_time": 1_565_000_000,
            "end_time": 1_565_000_360,
            "route": {
                "type": "FeatureCollection",
                "features": [
                    route_feature(-118.25, 34.05, 1_565_000_000),
                    route_feature(-118.26, 34.06, 1_565_000_180),
                    route_feature(-118.27, 34.07, 1_565_000_360)
                ]
            }
        })
    }

    fn status_change_json() -> Value {
        json!({
            "provider_id": "a5f7a24c-5302-4a06-9d84-e0f13ef4db02",
            "provider_name": "lemon",
            "device_id": "3e5c63b1-4c5e-4a29-97ac-f1fbbf4cbb31",
            "vehicle_id": "v-100",
            "vehicle_type": "bicycle",
            "propulsion_type": "human",
            "event_type": "available",
            "event_type_reason": "service_start",
            "event_time": 1_565_000_000,
            "event_location": { "type": "Point", "coordinates": [-118.25, 34.05] }
        })
    }

    #[test]
    fn trip_route_stays_index_aligned() {
        let (trip, points) = normalize_trip(&raw(trip_json())).unwrap();

        assert_eq!(
            trip.route.vertices(),
            vec![(-118.25, 34.05), (-118.26, 34.06), (-118.27, 34.07)]
        );
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].time_update, 1_565_000_180);
        assert_eq!(points[2].geom.vertices(), vec![(-118.27, 34.07)]);
        assert!(points.iter().all(|p| p.trip_id == trip.trip_id));
    }

    #[test]
    fn missing_mandatory_field_is_malformed() {
        let mut record = raw(trip_json());
        record.remove("trip_id");

        let err = normalize_trip(&record).unwrap_err();
        assert_eq!(err.field, "trip_id");
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let mut record = raw(trip_json());
        record.insert("trip_duration".into(), json!("360"));
        record.insert("standard_cost".into(), json!("2.50"));

        let (trip, _) = normalize_trip(&record).unwrap();
        assert_eq!(trip.trip_duration, 360);
        assert_eq!(trip.standard_cost, Some(2.5));
    }

    #[test]
    fn non_numeric_string_is_malformed() {
        let mut record = raw(trip_json());
        record.insert("trip_distance".into(), json!("far"));

        let err = normalize_trip(&record).unwrap_err();
        assert_eq!(err.field, "trip_distance");
    }

    #[test]
    fn absent_optional_fields_stay_absent() {
        let (trip, _) = normalize_trip(&raw(trip_json())).unwrap();
        assert_eq!(trip.parking_verification_url, None);
        assert_eq!(trip.standard_cost, None);
        assert_eq!(trip.actual_cost, None);
    }

    #[test]
    fn actual_cost_is_parsed_from_its_own_field() {
        let mut record = raw(trip_json());
        record.insert("standard_cost".into(), json!(2.0));
        record.insert("actual_cost".into(), json!(3.5));

        let (trip, _) = normalize_trip(&record).unwrap();
        assert_eq!(trip.standard_cost, Some(2.0));
        assert_eq!(trip.actual_cost, Some(3.5));
    }

    #[test]
    fn malformed_record_does_not_abort_the_batch() {
        let mut bad = raw(trip_json());
        bad.insert("provider_id".into(), json!("not-a-uuid"));
        let batch = normalize_trips(&[bad, raw(trip_json())]);

        assert_eq!(batch.trips.len(), 1);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].field, "provider_id");
    }

    #[test]
    fn short_routes_are_dropped() {
        let mut short = trip_json();
        short["route"]["features"] = json!([route_feature(-118.25, 34.05, 1_565_000_000)]);
        let batch = normalize_trips(&[raw(short), raw(trip_json())]);

        assert_eq!(batch.trips.len(), 1);
        assert_eq!(batch.dropped_short_routes, 1);
        assert!(batch.skipped.is_empty());
    }

    #[test]
    fn bare_and_feature_location_shapes_agree() {
        let bare = normalize_status_change(&raw(status_change_json()), EventLocationShape::Bare)
            .unwrap();

        let mut wrapped = status_change_json();
        wrapped["event_location"] = json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Point", "coordinates": [-118.25, 34.05] }
        });
        let featured =
            normalize_status_change(&raw(wrapped), EventLocationShape::Feature).unwrap();

        assert_eq!(bare.event_location, featured.event_location);
        assert_eq!(
            bare.event_location,
            crate::geometry::to_point(&[-118.25, 34.05]).unwrap()
        );
    }

    #[test]
    fn unknown_event_type_is_malformed() {
        let mut record = raw(status_change_json());
        record.insert("event_type".into(), json!("parked"));

        let err = normalize_status_change(&record, EventLocationShape::Bare).unwrap_err();
        assert_eq!(err.field, "event_type");
    }

    #[test]
    fn unknown_event_type_reason_is_malformed() {
        let mut record = raw(status_change_json());
        record.insert("event_type_reason".into(), json!("vibes"));

        let err = normalize_status_change(&record, EventLocationShape::Bare).unwrap_err();
        assert_eq!(err.field, "event_type_reason");
    }

    #[test]
    fn associated_trips_list_is_stringified() {
        let mut record = raw(status_change_json());
        record.insert("battery_pct".into(), json!(0.87));
        record.insert(
            "associated_trips".into(),
            json!(["9a2f8c3d-0c7b-4e2a-91a4-2e9a3c0a6d11"]),
        );

        let rec = normalize_status_change(&record, EventLocationShape::Bare).unwrap();
        assert_eq!(rec.battery_pct, Some(0.87));
        assert_eq!(
            rec.associated_trips.as_deref(),
            Some(r#"["9a2f8c3d-0c7b-4e2a-91a4-2e9a3c0a6d11"]"#)
        );
    }
}
