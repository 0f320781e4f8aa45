//! Point and line construction for persisted geometries.
//!
//! Every geometry produced here carries SRID 4326 (WGS84) from construction;
//! nothing downstream infers or defaults the spatial reference.

use geo_types::{Coord, LineString, Point};

use crate::error::GeometryError;

pub const SRID_WGS84: u32 = 4326;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point<f64>),
    Line(LineString<f64>),
}

/// A geometry value tagged with its spatial reference, encodable as EWKT
/// for server-side conversion via `ST_GeomFromEWKT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Geom {
    shape: Shape,
    srid: u32,
}

impl Geom {
    pub fn srid(&self) -> u32 {
        self.srid
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Vertex sequence in construction order. A point yields one vertex.
    pub fn vertices(&self) -> Vec<(f64, f64)> {
        match &self.shape {
            Shape::Point(p) => vec![(p.x(), p.y())],
            Shape::Line(line) => line.coords().map(|c| (c.x, c.y)).collect(),
        }
    }

    pub fn to_ewkt(&self) -> String {
        match &self.shape {
            Shape::Point(p) => format!("SRID={};POINT({} {})", self.srid, p.x(), p.y()),
            Shape::Line(line) => {
                let body = line
                    .coords()
                    .map(|c| format!("{} {}", c.x, c.y))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("SRID={};LINESTRING({})", self.srid, body)
            }
        }
    }
}

/// Builds a line whose vertex sequence is exactly `coords` in input order.
///
/// Callers enforce any minimum-length policy beyond non-empty; a 1-point
/// line is degenerate and should be rejected upstream.
pub fn build_line(coords: &[(f64, f64)]) -> Result<Geom, GeometryError> {
    if coords.is_empty() {
        return Err(GeometryError::EmptyGeometry);
    }
    let line = LineString::from(
        coords
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect::<Vec<_>>(),
    );
    Ok(Geom {
        shape: Shape::Line(line),
        srid: SRID_WGS84,
    })
}

/// Builds a point from a `(longitude, latitude)` pair.
pub fn to_point(pair: &[f64]) -> Result<Geom, GeometryError> {
    match pair {
        [lon, lat] if lon.is_finite() && lat.is_finite() => Ok(Geom {
            shape: Shape::Point(Point::new(*lon, *lat)),
            srid: SRID_WGS84,
        }),
        _ => Err(GeometryError::InvalidCoordinate(format!(
            "expected exactly two finite numbers, got {pair:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_preserves_vertex_order() {
        let geom = build_line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]).unwrap();
        assert_eq!(geom.vertices(), vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(geom.srid(), SRID_WGS84);
    }

    #[test]
    fn empty_line_is_rejected() {
        assert_eq!(build_line(&[]), Err(GeometryError::EmptyGeometry));
    }

    #[test]
    fn point_requires_two_finite_numbers() {
        assert!(to_point(&[-118.25, 34.05]).is_ok());
        assert!(matches!(
            to_point(&[-118.25]),
            Err(GeometryError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            to_point(&[-118.25, 34.05, 12.0]),
            Err(GeometryError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            to_point(&[f64::NAN, 34.05]),
            Err(GeometryError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn ewkt_encoding() {
        let point = to_point(&[-118.25, 34.05]).unwrap();
        assert_eq!(point.to_ewkt(), "SRID=4326;POINT(-118.25 34.05)");

        let line = build_line(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert_eq!(line.to_ewkt(), "SRID=4326;LINESTRING(0 0,1 1)");
    }
}
