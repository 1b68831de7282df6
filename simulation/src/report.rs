//! Scenario results

use std::fmt;

use concourse_core::{RouteErrorCode, RouteSegment, RouteState};
use concourse_routing::Route;
use serde::Serialize;

use crate::venue::OverlayTally;

/// One calculated segment
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub index: usize,
    pub identifier: Option<String>,
    pub from: String,
    pub to: String,
    pub steps: usize,
    pub distance: f64,
    pub time: f64,
    pub failed: bool,
}

impl From<&RouteSegment> for SegmentSummary {
    fn from(segment: &RouteSegment) -> Self {
        Self {
            index: segment.index,
            identifier: segment.identifier.clone(),
            from: segment.start_location.to_string(),
            to: segment.end_location.to_string(),
            steps: segment.steps.len(),
            distance: segment.total_distance,
            time: segment.total_time,
            failed: segment.is_failed(),
        }
    }
}

/// Snapshot of a route
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub identifier: String,
    pub state: RouteState,
    pub generation: u64,
    pub navigation_index: u32,
    pub segments: Vec<SegmentSummary>,
    pub total_distance: f64,
    pub total_time: f64,
    pub error: Option<String>,
    pub error_code: Option<RouteErrorCode>,
}

impl From<&Route> for RouteSummary {
    fn from(route: &Route) -> Self {
        let error = route.error();
        Self {
            identifier: route.identifier().to_string(),
            state: route.state(),
            generation: route.generation(),
            navigation_index: route.navigation_index(),
            segments: route.segments().iter().map(SegmentSummary::from).collect(),
            total_distance: route.total_distance(),
            total_time: route.total_time(),
            error_code: error.as_ref().map(|e| e.code()),
            error: error.map(|e| e.to_string()),
        }
    }
}

/// Everything a scenario observed
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub routes: Vec<RouteSummary>,
    /// Events received on the manager's stream
    pub events: usize,
    /// Delegate notifications
    pub notifications: usize,
    pub indoor_calls: usize,
    pub outdoor_calls: usize,
    pub overlay: OverlayTally,
    pub notes: Vec<String>,
}

impl ScenarioReport {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            ..Default::default()
        }
    }

    pub fn route(&self, identifier: &str) -> Option<&RouteSummary> {
        self.routes.iter().find(|r| r.identifier == identifier)
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.scenario)?;
        for route in &self.routes {
            write!(
                f,
                "route {} [{}] gen {} profile {}",
                route.identifier, route.state, route.generation, route.navigation_index
            )?;
            match &route.error {
                Some(error) => writeln!(f, ": {error}")?,
                None => writeln!(
                    f,
                    ": {:.0} m, {:.0} s",
                    route.total_distance, route.total_time
                )?,
            }
            for segment in &route.segments {
                let tag = segment.identifier.as_deref().unwrap_or("-");
                if segment.failed {
                    writeln!(f, "  #{} {} -> {} ({tag}) failed", segment.index, segment.from, segment.to)?;
                } else {
                    writeln!(
                        f,
                        "  #{} {} -> {} ({tag}) {:.0} m, {:.0} s, {} steps",
                        segment.index,
                        segment.from,
                        segment.to,
                        segment.distance,
                        segment.time,
                        segment.steps
                    )?;
                }
            }
        }
        writeln!(
            f,
            "events {} | notifications {} | indoor calls {} | outdoor calls {}",
            self.events, self.notifications, self.indoor_calls, self.outdoor_calls
        )?;
        writeln!(
            f,
            "overlay: {} drawn, {} cleared, {} routes on map",
            self.overlay.drawn,
            self.overlay.cleared,
            self.overlay.on_map.len()
        )?;
        for note in &self.notes {
            writeln!(f, "* {note}")?;
        }
        Ok(())
    }
}
