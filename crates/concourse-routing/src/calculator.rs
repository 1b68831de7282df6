//! Route calculation
//!
//! Turns a request into its segments: validate the navigation profile,
//! resolve user-location waypoints, order the destinations, then build the
//! segments one after the other. The first failing segment aborts the rest.

use std::sync::Arc;

use concourse_core::{
    Location, RouteError, RouteLocation, RouteRequest, RouteSegment, UserLocationSource,
};
use tracing::{debug, instrument, warn};

use crate::builder::{Leg, SegmentBuilder};
use crate::planner::{ResolvedDestination, order_destinations};

/// Calculates the segments of a route request
#[derive(Clone)]
pub struct RouteCalculator {
    builder: SegmentBuilder,
    user_location: Arc<dyn UserLocationSource>,
}

impl RouteCalculator {
    pub fn new(builder: SegmentBuilder, user_location: Arc<dyn UserLocationSource>) -> Self {
        Self {
            builder,
            user_location,
        }
    }

    pub fn builder(&self) -> &SegmentBuilder {
        &self.builder
    }

    /// Resolve a request location against the live user location
    pub fn resolve(&self, location: &RouteLocation) -> Result<Location, RouteError> {
        match location {
            RouteLocation::Fixed(location) => Ok(location.clone()),
            RouteLocation::UserLocation => self
                .user_location
                .current_user_location()
                .ok_or(RouteError::NoUserLocation),
        }
    }

    /// Waypoints after the start, in visit order
    pub fn waypoints(
        &self,
        request: &RouteRequest,
        start: &Location,
    ) -> Result<Vec<ResolvedDestination>, RouteError> {
        match request {
            RouteRequest::Simple(simple) => {
                let end = self.resolve(&simple.end_location)?;
                Ok(vec![ResolvedDestination::new(end, None, 0)])
            }
            RouteRequest::Tsp(tsp) => {
                let destinations = tsp
                    .destinations()
                    .iter()
                    .map(|d| {
                        self.resolve(&d.location)
                            .map(|loc| ResolvedDestination::new(loc, d.identifier.clone(), d.priority))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(order_destinations(start, destinations))
            }
        }
    }

    /// Calculate every segment of a request
    ///
    /// `navigation_index` overrides the request's own, since a route's
    /// profile can be switched after creation.
    #[instrument(skip(self, request), fields(route_id = %request.identifier()))]
    pub async fn calculate(
        &self,
        request: &RouteRequest,
        navigation_index: u32,
    ) -> Result<Vec<RouteSegment>, RouteError> {
        if !self.builder.indoor().supports_navigation_index(navigation_index) {
            warn!(navigation_index, "Unknown navigation index");
            return Err(RouteError::BadNavigationIndex(navigation_index));
        }

        let start = self.resolve(request.start_location())?;
        let waypoints = self.waypoints(request, &start)?;
        debug!(waypoints = waypoints.len(), "Visit order planned");

        let mut segments = Vec::with_capacity(waypoints.len());
        let mut from = &start;
        for (index, waypoint) in waypoints.iter().enumerate() {
            let leg = Leg {
                index,
                from,
                to: &waypoint.location,
                identifier: waypoint.identifier.as_deref(),
                navigation_index,
                transport_type: request.transport_type(),
            };
            match self.builder.build_segment(leg).await {
                Ok(segment) => segments.push(segment),
                Err(failure) => {
                    warn!(index, error = %failure.error, "Route calculation aborted");
                    return Err(failure.error);
                }
            }
            from = &waypoint.location;
        }

        Ok(segments)
    }
}

impl std::fmt::Debug for RouteCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteCalculator")
            .field("builder", &self.builder)
            .finish()
    }
}
