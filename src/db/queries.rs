pub const INSERT_TRIP: &str = r#"
INSERT INTO trips (
    provider_id, provider_name, device_id, vehicle_id, vehicle_type, propulsion_type,
    trip_id, trip_duration, trip_distance, accuracy, start_time, end_time,
    parking_verification_url, standard_cost, actual_cost, route
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, ST_GeomFromEWKT($16));
"#;

pub const INSERT_TRIP_ROUTE_POINT: &str = r#"
INSERT INTO trip_routes (trip_id, time_update, geom)
VALUES ($1, $2, ST_GeomFromEWKT($3));
"#;

pub const INSERT_STATUS_CHANGE: &str = r#"
INSERT INTO status_changes (
    provider_id, provider_name, device_id, vehicle_id, vehicle_type, propulsion_type,
    event_type, event_type_reason, event_time, event_location, battery_pct, associated_trips
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, ST_GeomFromEWKT($10), $11, $12);
"#;
