//! Collaborator traits
//!
//! The routing core never computes paths, reads sensors, or draws anything by
//! itself. These traits are the narrow seams through which the host plugs
//! those services in.
//!
//! ## Key Traits
//!
//! - [`IndoorNavigator`]: Indoor path computation
//! - [`OutdoorNavigator`]: Outdoor (turn-by-turn) path computation
//! - [`VenueMembership`]: Default inside-the-venue test
//! - [`VenueHintOverride`]: Per-point override of that test
//! - [`UserLocationSource`]: Live user location
//! - [`RouteOverlay`]: Rendering sink for completed segments

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::geometry::MapPoint;
use crate::location::Location;
use crate::request::TransportType;
use crate::segment::{RouteSegment, Step};

/// Result of an indoor path computation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndoorPath {
    pub steps: Vec<Step>,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub time: f64,
}

/// Result of an outdoor path computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutdoorPath {
    pub steps: Vec<Step>,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub time: f64,
    /// Where the outdoor path meets the venue boundary
    pub venue_crossing_point: Location,
}

/// Indoor path computation
///
/// Implementations are expected to apply their own timeouts and report them
/// as [`RouteError::Generic`].
#[async_trait]
pub trait IndoorNavigator: Send + Sync {
    /// Compute a path between two venue locations using a navigation profile
    async fn compute_indoor_path(
        &self,
        from: &Location,
        to: &Location,
        navigation_index: u32,
    ) -> Result<IndoorPath, RouteError>;

    /// Check that navigation data exists for a navigation profile
    fn supports_navigation_index(&self, _navigation_index: u32) -> bool {
        true
    }
}

/// Outdoor path computation
#[async_trait]
pub trait OutdoorNavigator: Send + Sync {
    /// Compute a path between two locations, at least one of them outside the venue
    async fn compute_outdoor_path(
        &self,
        from: &Location,
        to: &Location,
        transport_type: TransportType,
    ) -> Result<OutdoorPath, RouteError>;
}

/// Default inside-the-venue test
pub trait VenueMembership: Send + Sync {
    fn is_inside_venue(&self, point: MapPoint) -> bool;
}

/// Per-point override of the inside-the-venue test
pub trait VenueHintOverride: Send + Sync {
    /// Decide whether `point` is treated as inside
    ///
    /// `hint` is the default answer; `is_destination` tells whether the point
    /// ends the leg being calculated.
    fn classify(&self, point: MapPoint, is_destination: bool, hint: bool) -> bool;
}

/// Live user location
pub trait UserLocationSource: Send + Sync {
    /// Current user location, `None` while unavailable
    fn current_user_location(&self) -> Option<Location>;
}

/// Rendering sink for route segments
pub trait RouteOverlay: Send + Sync {
    /// Draw a completed segment of a route
    fn display_segment(&self, route_id: &str, segment: &RouteSegment);

    /// Remove everything drawn for a route
    fn clear_route(&self, route_id: &str);
}

impl<F> VenueHintOverride for F
where
    F: Fn(MapPoint, bool, bool) -> bool + Send + Sync,
{
    fn classify(&self, point: MapPoint, is_destination: bool, hint: bool) -> bool {
        self(point, is_destination, hint)
    }
}
