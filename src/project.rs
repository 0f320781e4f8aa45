//! Shapes normalized record streams into the immutable row batches that get
//! appended to the store.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::LoadError;
use crate::models::status_change::StatusChangeRecord;
use crate::models::trip::{RoutePoint, TripRecord};

/// The two aligned row sets produced from one `trips` dump.
#[derive(Debug)]
pub struct TripTables {
    pub trips: Vec<TripRecord>,
    pub routes: Vec<RoutePoint>,
}

/// Checks that every route row references a trip in the same batch before
/// handing both row sets to persistence. A violation means the normalizer
/// misbehaved, not that the input was bad.
pub fn project_trips(
    trips: Vec<TripRecord>,
    routes: Vec<RoutePoint>,
) -> Result<TripTables, LoadError> {
    let trip_ids: HashSet<Uuid> = trips.iter().map(|t| t.trip_id).collect();
    if let Some(orphan) = routes.iter().find(|p| !trip_ids.contains(&p.trip_id)) {
        return Err(LoadError::ReferentialIntegrity {
            trip_id: orphan.trip_id,
        });
    }
    Ok(TripTables { trips, routes })
}

/// Identity projection today; a named step so derived columns have a home.
pub fn project_status_changes(records: Vec<StatusChangeRecord>) -> Vec<StatusChangeRecord> {
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::to_point;

    fn point(trip_id: Uuid) -> RoutePoint {
        RoutePoint {
            trip_id,
            time_update: 0,
            geom: to_point(&[0.0, 0.0]).unwrap(),
        }
    }

    #[test]
    fn orphaned_route_point_is_a_referential_violation() {
        let orphan = Uuid::new_v4();
        let err = project_trips(vec![], vec![point(orphan)]).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ReferentialIntegrity { trip_id } if trip_id == orphan
        ));
    }
}
