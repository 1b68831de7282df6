//! Route lifecycle states and events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a route
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
pub enum RouteState {
    /// Just created or reset by an external event; data is invalid
    #[default]
    #[display("idle")]
    Idle,
    /// Being calculated; data is invalid
    #[display("calculating")]
    Calculating,
    /// Fully calculated; segments are valid
    #[display("completed")]
    Completed,
    /// Calculation failed; see the route error
    #[display("failed")]
    Failed,
    /// Detached from its manager; terminal
    #[display("removed")]
    Removed,
}

impl RouteState {
    /// Completed or Failed
    pub fn is_terminal_result(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// A state transition of a route, as published on the manager's event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEvent {
    /// Route identifier
    pub identifier: String,
    /// State the route entered
    pub state: RouteState,
    /// Calculation generation the transition belongs to
    pub generation: u64,
    pub timestamp: DateTime<Utc>,
}

impl RouteEvent {
    pub fn new(identifier: impl Into<String>, state: RouteState, generation: u64) -> Self {
        Self {
            identifier: identifier.into(),
            state,
            generation,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(RouteState::Idle.to_string(), "idle");
        assert_eq!(RouteState::Calculating.to_string(), "calculating");
        assert_eq!(RouteState::Removed.to_string(), "removed");
    }

    #[test]
    fn test_state_predicates() {
        assert!(RouteState::Completed.is_terminal_result());
        assert!(RouteState::Failed.is_terminal_result());
        assert!(!RouteState::Calculating.is_terminal_result());
        assert!(!RouteState::Removed.is_terminal_result());
        assert!(RouteState::Removed.is_removed());
        assert_eq!(RouteState::default(), RouteState::Idle);
    }

    #[test]
    fn test_event_serde() {
        let event = RouteEvent::new("r1", RouteState::Completed, 3);
        let json = serde_json::to_string(&event).unwrap();
        let back: RouteEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
