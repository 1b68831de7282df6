//! Error types for Concourse routing

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for Concourse
#[derive(Debug, Error)]
pub enum ConcourseError {
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Manager error: {0}")]
    Manager(#[from] ManagerError),
}

/// Stable numeric codes of the route error domain
///
/// Hosts that bridge errors into another error domain rely on these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum RouteErrorCode {
    /// Unclassified failure
    Generic = 0,
    /// No user location was available
    NoUserLocation = 1,
    /// The navigation profile does not exist
    BadNavigationIndex = 2,
}

/// Why a route could not be calculated
///
/// This is what a route in [`RouteState::Failed`](crate::RouteState::Failed) carries. Navigation
/// services report their own failures (including their timeouts) with the same
/// type, so the first error encountered is surfaced unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RouteError {
    /// Unclassified failure from a navigation sub-call
    #[error("Route calculation failed: {0}")]
    Generic(String),

    /// A waypoint resolves to the user location but none is available
    #[error("Unable to calculate the route: no user location is currently available")]
    NoUserLocation,

    /// The requested navigation profile does not exist for this venue
    #[error("Unable to calculate the route: no navigation data for navigation index {0}")]
    BadNavigationIndex(u32),
}

impl RouteError {
    /// Create a generic error from any displayable cause
    pub fn generic(cause: impl std::fmt::Display) -> Self {
        Self::Generic(cause.to_string())
    }

    /// Get the stable error code
    pub fn code(&self) -> RouteErrorCode {
        match self {
            Self::Generic(_) => RouteErrorCode::Generic,
            Self::NoUserLocation => RouteErrorCode::NoUserLocation,
            Self::BadNavigationIndex(_) => RouteErrorCode::BadNavigationIndex,
        }
    }
}

/// Errors raised while building a route request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Route request identifier must not be empty")]
    EmptyIdentifier,
}

/// Errors raised by the route manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    #[error("A live route with identifier '{0}' already exists")]
    DuplicateIdentifier(String),

    #[error("Invalid route request: {0}")]
    InvalidRequest(#[from] RequestError),
}

/// Result type alias for Concourse operations
pub type ConcourseResult<T> = Result<T, ConcourseError>;
