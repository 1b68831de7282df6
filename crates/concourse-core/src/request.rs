//! Route requests
//!
//! A request describes routing intent only. Two kinds exist:
//!
//! - [`SimpleRouteRequest`]: a single leg from `start_location` to `end_location`
//! - [`TspRouteRequest`]: a start followed by prioritized destinations, visited
//!   highest priority first and, within a priority, nearest first
//!
//! Both share the fields of [`RequestHeader`] and are unified by [`RouteRequest`].

use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::location::RouteLocation;

/// Preferred way of travelling outside the venue
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
pub enum TransportType {
    #[display("automobile")]
    Automobile,
    #[display("walking")]
    Walking,
    #[display("transit")]
    Transit,
    /// Let the outdoor router choose
    #[default]
    #[display("any")]
    Any,
}

/// Fields shared by every request kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Unique route identifier, handed to the created route
    pub identifier: String,
    /// Where the route starts
    pub start_location: RouteLocation,
    /// Outdoor transport preference
    pub transport_type: TransportType,
    /// Navigation profile, e.g. 0 for normal and 1 for wheelchair
    pub navigation_index: u32,
}

impl RequestHeader {
    fn new(identifier: impl Into<String>) -> Result<Self, RequestError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(RequestError::EmptyIdentifier);
        }
        Ok(Self {
            identifier,
            start_location: RouteLocation::UserLocation,
            transport_type: TransportType::default(),
            navigation_index: 0,
        })
    }
}

/// Two-point request: a single segment from start to end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleRouteRequest {
    pub header: RequestHeader,
    /// Where the route ends
    pub end_location: RouteLocation,
}

impl SimpleRouteRequest {
    /// Create a request; start and end default to the user location
    pub fn new(identifier: impl Into<String>) -> Result<Self, RequestError> {
        Ok(Self {
            header: RequestHeader::new(identifier)?,
            end_location: RouteLocation::UserLocation,
        })
    }

    pub fn with_start(mut self, start: impl Into<RouteLocation>) -> Self {
        self.header.start_location = start.into();
        self
    }

    pub fn with_end(mut self, end: impl Into<RouteLocation>) -> Self {
        self.end_location = end.into();
        self
    }

    pub fn with_transport_type(mut self, transport_type: TransportType) -> Self {
        self.header.transport_type = transport_type;
        self
    }

    pub fn with_navigation_index(mut self, navigation_index: u32) -> Self {
        self.header.navigation_index = navigation_index;
        self
    }
}

/// A destination of a [`TspRouteRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub location: RouteLocation,
    /// Tag assigned to the segment that reaches this destination
    pub identifier: Option<String>,
    /// Higher values are visited sooner
    pub priority: i64,
}

/// Multi-stop request visiting destinations by priority, then proximity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TspRouteRequest {
    pub header: RequestHeader,
    destinations: Vec<Destination>,
}

impl TspRouteRequest {
    /// Create a request with no destinations; start defaults to the user location
    pub fn new(identifier: impl Into<String>) -> Result<Self, RequestError> {
        Ok(Self {
            header: RequestHeader::new(identifier)?,
            destinations: Vec::new(),
        })
    }

    pub fn with_start(mut self, start: impl Into<RouteLocation>) -> Self {
        self.header.start_location = start.into();
        self
    }

    pub fn with_transport_type(mut self, transport_type: TransportType) -> Self {
        self.header.transport_type = transport_type;
        self
    }

    pub fn with_navigation_index(mut self, navigation_index: u32) -> Self {
        self.header.navigation_index = navigation_index;
        self
    }

    /// Append a destination of the given priority
    pub fn add_location(
        &mut self,
        location: impl Into<RouteLocation>,
        identifier: Option<String>,
        priority: i64,
    ) {
        self.destinations.push(Destination {
            location: location.into(),
            identifier,
            priority,
        });
    }

    /// Builder form of [`add_location`](Self::add_location)
    pub fn with_location(
        mut self,
        location: impl Into<RouteLocation>,
        identifier: Option<&str>,
        priority: i64,
    ) -> Self {
        self.add_location(location, identifier.map(str::to_string), priority);
        self
    }

    /// Destinations in insertion order
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }
}

/// Any route request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteRequest {
    Simple(SimpleRouteRequest),
    Tsp(TspRouteRequest),
}

impl RouteRequest {
    pub fn header(&self) -> &RequestHeader {
        match self {
            Self::Simple(r) => &r.header,
            Self::Tsp(r) => &r.header,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.header().identifier
    }

    pub fn start_location(&self) -> &RouteLocation {
        &self.header().start_location
    }

    pub fn transport_type(&self) -> TransportType {
        self.header().transport_type
    }

    pub fn navigation_index(&self) -> u32 {
        self.header().navigation_index
    }

    /// Re-check creation-time validation
    ///
    /// Fields are public, so a request can be edited after construction.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.identifier().is_empty() {
            return Err(RequestError::EmptyIdentifier);
        }
        Ok(())
    }

    /// Start location followed by every stop
    pub fn waypoints(&self) -> impl Iterator<Item = &RouteLocation> {
        let (end, destinations) = match self {
            Self::Simple(r) => (Some(&r.end_location), &[][..]),
            Self::Tsp(r) => (None, r.destinations.as_slice()),
        };
        std::iter::once(self.start_location())
            .chain(end)
            .chain(destinations.iter().map(|d| &d.location))
    }

    /// Whether any waypoint stands for the user location
    pub fn depends_on_user_location(&self) -> bool {
        self.waypoints().any(RouteLocation::is_user_location)
    }

    /// Whether a floor change to `ordinal` can affect this request
    pub fn involves_ordinal(&self, ordinal: i32) -> bool {
        self.waypoints().any(|w| w.may_be_on(ordinal))
    }
}

impl From<SimpleRouteRequest> for RouteRequest {
    fn from(request: SimpleRouteRequest) -> Self {
        Self::Simple(request)
    }
}

impl From<TspRouteRequest> for RouteRequest {
    fn from(request: TspRouteRequest) -> Self {
        Self::Tsp(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;

    #[test]
    fn test_empty_identifier_rejected() {
        assert_eq!(
            SimpleRouteRequest::new("").unwrap_err(),
            RequestError::EmptyIdentifier
        );
        assert_eq!(
            TspRouteRequest::new(String::new()).unwrap_err(),
            RequestError::EmptyIdentifier
        );
    }

    #[test]
    fn test_simple_defaults() {
        let request = SimpleRouteRequest::new("r1").unwrap();
        assert_eq!(request.header.identifier, "r1");
        assert!(request.header.start_location.is_user_location());
        assert!(request.end_location.is_user_location());
        assert_eq!(request.header.transport_type, TransportType::Any);
        assert_eq!(request.header.navigation_index, 0);
    }

    #[test]
    fn test_simple_builder() {
        let request: RouteRequest = SimpleRouteRequest::new("r1")
            .unwrap()
            .with_start(Location::new((0.0, 0.0), 0))
            .with_end(Location::new((5.0, 0.0), 1))
            .with_transport_type(TransportType::Walking)
            .with_navigation_index(1)
            .into();

        assert_eq!(request.identifier(), "r1");
        assert_eq!(request.transport_type(), TransportType::Walking);
        assert_eq!(request.navigation_index(), 1);
        assert!(!request.depends_on_user_location());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_tsp_keeps_insertion_order() {
        let mut request = TspRouteRequest::new("tour").unwrap();
        request.add_location(Location::new((10.0, 0.0), 0), Some("far".into()), 1);
        request.add_location(Location::new((1.0, 0.0), 0), None, 5);

        let destinations = request.destinations();
        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations[0].identifier.as_deref(), Some("far"));
        assert_eq!(destinations[0].priority, 1);
        assert_eq!(destinations[1].identifier, None);
        assert_eq!(destinations[1].priority, 5);
    }

    #[test]
    fn test_depends_on_user_location() {
        let fixed = Location::new((0.0, 0.0), 0);

        let simple: RouteRequest = SimpleRouteRequest::new("a")
            .unwrap()
            .with_start(fixed.clone())
            .into();
        assert!(simple.depends_on_user_location());

        let tsp: RouteRequest = TspRouteRequest::new("b")
            .unwrap()
            .with_start(fixed.clone())
            .with_location(fixed.clone(), None, 0)
            .into();
        assert!(!tsp.depends_on_user_location());

        let tsp: RouteRequest = TspRouteRequest::new("c")
            .unwrap()
            .with_start(fixed)
            .with_location(RouteLocation::UserLocation, Some("me"), 0)
            .into();
        assert!(tsp.depends_on_user_location());
    }

    #[test]
    fn test_involves_ordinal() {
        let request: RouteRequest = SimpleRouteRequest::new("stairs")
            .unwrap()
            .with_start(Location::new((0.0, 0.0), 0))
            .with_end(Location::new((5.0, 0.0), 2))
            .into();
        assert!(request.involves_ordinal(0));
        assert!(request.involves_ordinal(2));
        assert!(!request.involves_ordinal(1));

        let tsp: RouteRequest = TspRouteRequest::new("tour")
            .unwrap()
            .with_start(Location::new((0.0, 0.0), 0))
            .with_location(Location::unspecified((3.0, 3.0)), None, 0)
            .into();
        assert!(tsp.involves_ordinal(7));

        // The user may be on any floor
        let live: RouteRequest = SimpleRouteRequest::new("live")
            .unwrap()
            .with_end(Location::new((5.0, 0.0), 0))
            .into();
        assert!(live.involves_ordinal(4));
    }

    #[test]
    fn test_validate_catches_edited_identifier() {
        let mut request = SimpleRouteRequest::new("ok").unwrap();
        request.header.identifier.clear();
        let request: RouteRequest = request.into();
        assert_eq!(request.validate(), Err(RequestError::EmptyIdentifier));
    }

    #[test]
    fn test_transport_display() {
        assert_eq!(TransportType::Walking.to_string(), "walking");
        assert_eq!(TransportType::default().to_string(), "any");
    }
}
