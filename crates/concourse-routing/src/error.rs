//! Routing error types
//!
//! Re-exports the core error taxonomy and adds segment-level failures.

use concourse_core::RouteSegment;
use thiserror::Error;

pub use concourse_core::{ManagerError, RouteError, RouteErrorCode};

/// A leg whose calculation failed
///
/// `segment` carries the failure sentinels; `error` is the first error hit.
#[derive(Debug, Error)]
#[error("segment {index} failed: {error}", index = .segment.index)]
pub struct SegmentFailure {
    pub segment: RouteSegment,
    #[source]
    pub error: RouteError,
}

impl From<SegmentFailure> for RouteError {
    fn from(failure: SegmentFailure) -> Self {
        failure.error
    }
}

/// Result type for manager operations
pub type RoutingResult<T> = Result<T, ManagerError>;
