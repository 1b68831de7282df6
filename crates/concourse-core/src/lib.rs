//! # Concourse Core
//!
//! Core types, traits, and errors for Concourse indoor-venue routing.
//!
//! This crate holds everything the routing subsystem shares with its
//! collaborators: the value types that describe a route request and its
//! calculated segments, the error taxonomy, and the narrow traits through
//! which indoor/outdoor navigation services, the user location source, the
//! route delegate, and the map overlay are plugged in.
//!
//! ## Key Traits
//!
//! - [`IndoorNavigator`]: Indoor path computation for a navigation profile
//! - [`OutdoorNavigator`]: Turn-by-turn outdoor path computation
//! - [`VenueMembership`] / [`VenueHintOverride`]: Inside-the-venue test and its override
//! - [`UserLocationSource`]: Live user location snapshot
//! - [`RouteOverlay`]: Rendering sink for completed segments
//!
//! ## Key Types
//!
//! - [`Location`]: A map point tagged with a floor ordinal
//! - [`RouteRequest`]: Simple (start → end) or TSP (prioritized destinations) request
//! - [`RouteSegment`]: One calculated leg of a route, made of [`Step`]s
//! - [`RouteState`] / [`RouteEvent`]: Route lifecycle and its event stream entries

pub mod error;
pub mod event;
pub mod geometry;
pub mod location;
pub mod request;
pub mod segment;
pub mod traits;
pub mod venue;

// Re-export main types
pub use error::*;
pub use event::*;
pub use geometry::*;
pub use location::*;
pub use request::*;
pub use segment::*;
pub use traits::*;
pub use venue::*;
