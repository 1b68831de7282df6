//! Planar map geometry
//!
//! Positions live in a projected map space measured in meters, so distances
//! are plain Euclidean distances.

use serde::{Deserialize, Serialize};

/// A point in projected map space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    /// Create a new map point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in meters
    pub fn distance_to(&self, other: &MapPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for MapPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<MapPoint> for geo::Coord<f64> {
    fn from(point: MapPoint) -> Self {
        geo::Coord {
            x: point.x,
            y: point.y,
        }
    }
}

impl From<geo::Coord<f64>> for MapPoint {
    fn from(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.x, coord.y)
    }
}

impl From<MapPoint> for geo::Point<f64> {
    fn from(point: MapPoint) -> Self {
        geo::Point::new(point.x, point.y)
    }
}

/// Axis-aligned rectangle in map space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRect {
    pub min: MapPoint,
    pub max: MapPoint,
}

impl MapRect {
    /// Smallest rectangle containing every point, or `None` for no points
    pub fn bounding(points: &[MapPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut rect = MapRect {
            min: *first,
            max: *first,
        };
        for p in rest {
            rect.min.x = rect.min.x.min(p.x);
            rect.min.y = rect.min.y.min(p.y);
            rect.max.x = rect.max.x.max(p.x);
            rect.max.y = rect.max.y.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Smallest rectangle containing both rectangles
    pub fn union(&self, other: &MapRect) -> MapRect {
        MapRect {
            min: MapPoint::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: MapPoint::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}
