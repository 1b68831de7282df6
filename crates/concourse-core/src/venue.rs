//! Venue boundary polygon
//!
//! The default answer to "is this point inside the venue" is a
//! point-in-polygon test against the venue outline.

use geo::{Intersects, LineString, Polygon};

use crate::geometry::MapPoint;
use crate::traits::VenueMembership;

/// Venue outline
#[derive(Debug, Clone)]
pub struct VenueBoundary {
    polygon: Polygon<f64>,
}

impl VenueBoundary {
    /// Build a boundary from its exterior ring
    ///
    /// The ring is closed automatically.
    pub fn new(exterior: impl IntoIterator<Item = MapPoint>) -> Self {
        let ring: LineString<f64> = exterior
            .into_iter()
            .map(geo::Coord::from)
            .collect::<Vec<_>>()
            .into();
        Self {
            polygon: Polygon::new(ring, vec![]),
        }
    }

    /// Axis-aligned rectangular venue
    pub fn rectangle(min: MapPoint, max: MapPoint) -> Self {
        Self::new([
            min,
            MapPoint::new(max.x, min.y),
            max,
            MapPoint::new(min.x, max.y),
        ])
    }

    /// Build a boundary from an existing polygon (holes are courtyards)
    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self { polygon }
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Whether the point lies inside or on the outline
    pub fn contains(&self, point: MapPoint) -> bool {
        self.polygon.intersects(&geo::Point::from(point))
    }
}

impl VenueMembership for VenueBoundary {
    fn is_inside_venue(&self, point: MapPoint) -> bool {
        self.contains(point)
    }
}
