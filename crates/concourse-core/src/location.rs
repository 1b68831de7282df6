//! Venue locations
//!
//! A [`Location`] is a map point tagged with the floor (ordinal) it lies on.
//! Route requests refer to locations through [`RouteLocation`], which can also
//! stand for the user's live location that is only resolved when a route is
//! calculated.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::geometry::MapPoint;

/// Raw ordinal value hosts use to mean "no floor"
///
/// Only used when importing raw values; inside the crate an unspecified
/// ordinal is `None`.
pub const INVALID_ORDINAL_VALUE: i32 = -100_000;

/// Identifier of a venue feature in an external feature registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "feature#{}", self.0)
    }
}

/// A point on a venue floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    position: MapPoint,
    ordinal: Option<i32>,
    title: Option<String>,
    subtitle: Option<String>,
    feature: Option<FeatureId>,
}

impl Location {
    /// Create a location on a given floor
    pub fn new(position: impl Into<MapPoint>, ordinal: i32) -> Self {
        Self::with_ordinal(position, Some(ordinal))
    }

    /// Create a location whose floor is not known
    pub fn unspecified(position: impl Into<MapPoint>) -> Self {
        Self::with_ordinal(position, None)
    }

    /// Create a location from a raw ordinal value
    ///
    /// [`INVALID_ORDINAL_VALUE`] maps to an unspecified ordinal.
    pub fn from_raw_ordinal(position: impl Into<MapPoint>, ordinal: i32) -> Self {
        let ordinal = (ordinal != INVALID_ORDINAL_VALUE).then_some(ordinal);
        Self::with_ordinal(position, ordinal)
    }

    fn with_ordinal(position: impl Into<MapPoint>, ordinal: Option<i32>) -> Self {
        Self {
            position: position.into(),
            ordinal,
            title: None,
            subtitle: None,
            feature: None,
        }
    }

    /// Attach a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a subtitle
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Associate the location with a venue feature
    pub fn with_feature(mut self, feature: FeatureId) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn position(&self) -> MapPoint {
        self.position
    }

    pub fn ordinal(&self) -> Option<i32> {
        self.ordinal
    }

    /// Raw ordinal, with [`INVALID_ORDINAL_VALUE`] for an unspecified floor
    pub fn raw_ordinal(&self) -> i32 {
        self.ordinal.unwrap_or(INVALID_ORDINAL_VALUE)
    }

    /// Correct the floor after construction
    pub fn set_ordinal(&mut self, ordinal: Option<i32>) {
        self.ordinal = ordinal;
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn feature(&self) -> Option<FeatureId> {
        self.feature
    }

    /// Distance to another location, in meters
    ///
    /// Floors are ignored: floor transitions are part of the path, not of
    /// the distance metric.
    pub fn distance_to(&self, other: &Location) -> f64 {
        self.position.distance_to(&other.position)
    }

    /// Whether both locations denote the same spot on the same floor
    pub fn same_place(&self, other: &Location) -> bool {
        self.position == other.position && self.ordinal == other.ordinal
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ordinal {
            Some(ordinal) => write!(f, "({}, {})@{}", self.position.x, self.position.y, ordinal),
            None => write!(f, "({}, {})@?", self.position.x, self.position.y),
        }
    }
}

/// A location as written in a route request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteLocation {
    /// A fixed location
    Fixed(Location),
    /// The user's location at calculation time
    UserLocation,
}

impl RouteLocation {
    pub fn is_user_location(&self) -> bool {
        matches!(self, Self::UserLocation)
    }

    /// Get the fixed location, if any
    pub fn as_fixed(&self) -> Option<&Location> {
        match self {
            Self::Fixed(location) => Some(location),
            Self::UserLocation => None,
        }
    }

    /// Whether this waypoint can lie on floor `ordinal`
    ///
    /// The user and unspecified locations can be on any floor.
    pub fn may_be_on(&self, ordinal: i32) -> bool {
        match self {
            Self::Fixed(location) => location.ordinal().is_none_or(|o| o == ordinal),
            Self::UserLocation => true,
        }
    }
}

impl From<Location> for RouteLocation {
    fn from(location: Location) -> Self {
        Self::Fixed(location)
    }
}

impl Display for RouteLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(location) => write!(f, "{}", location),
            Self::UserLocation => write!(f, "<user location>"),
        }
    }
}
