//! # Concourse Routing
//!
//! Routing layer for Concourse indoor venues.
//!
//! This crate turns route requests into calculated segments and keeps them
//! current as the world around them changes. Path computation itself is left
//! to the indoor and outdoor navigation services plugged in through
//! [`concourse_core`] traits.
//!
//! ## Core Components
//!
//! - [`RouteManager`]: Registry of live routes and recalculation triggers
//! - [`Route`]: Lifecycle state machine with last-started-wins generations
//! - [`RouteCalculator`]: Resolves waypoints and drives segment building
//! - [`SegmentBuilder`]: Combines indoor and outdoor sub-paths per leg
//! - [`VenueClassifier`]: Inside/outside decisions with optional overrides
//! - [`plan_visit_order`]: Priority-banded nearest-neighbour ordering
//!
//! ## Calculation
//!
//! 1. **VALIDATE**: The navigation index must be known to the indoor service
//! 2. **RESOLVE**: User-location waypoints take the live user location
//! 3. **ORDER**: Multi-stop destinations are visited by priority, then proximity
//! 4. **BUILD**: Segments are computed one after the other; the first failure
//!    fails the route
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use concourse_routing::{NavigationServices, RouteManager, RoutingConfig};
//! use concourse_core::{Location, TspRouteRequest};
//!
//! let services = NavigationServices::new(indoor, outdoor, venue, user_location);
//! let manager = RouteManager::new(services, RoutingConfig::default());
//! let mut events = manager.subscribe();
//!
//! let request = TspRouteRequest::new("tour")?
//!     .with_start(Location::new((0.0, 0.0), 0))
//!     .with_location(Location::new((10.0, 0.0), 0), Some("gate-a"), 1)
//!     .with_location(Location::new((5.0, 0.0), 0), Some("lounge"), 5);
//! let route = manager.make_route(request)?;
//!
//! while let Ok(event) = events.recv().await {
//!     if event.state.is_terminal_result() {
//!         break;
//!     }
//! }
//! println!("{} segments", route.segments().len());
//! ```

pub mod builder;
pub mod calculator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod manager;
pub mod planner;
pub mod route;

// Re-export main types
pub use builder::{Leg, LegKind, SegmentBuilder};
pub use calculator::RouteCalculator;
pub use classifier::VenueClassifier;
pub use config::RoutingConfig;
pub use error::{RoutingResult, SegmentFailure};
pub use manager::{NavigationServices, RouteManager};
pub use planner::{ResolvedDestination, order_destinations, plan_visit_order};
pub use route::{Route, RouteDelegate, Transition};

// Re-export core routing types for convenience
pub use concourse_core::{RouteError, RouteEvent, RouteState};
