//! # Concourse Simulation
//!
//! Drives the Concourse route manager against a simulated airport terminal.
//!
//! ## Overview
//!
//! The terminal is a two-floor, 200 x 100 meter building with two doors.
//! Its navigation services are in-memory stand-ins with configurable latency:
//!
//! - **Indoor**: straight walks, floors joined by escalators (profile 0) or
//!   an elevator (profile 1)
//! - **Outdoor**: enters and leaves through the nearest door, can be taken offline
//! - **User location**: moved by the scenarios
//! - **Overlay**: counts what would be drawn
//!
//! ## Architecture
//!
//! - **Venue** (`venue.rs`): Simulated services and named places
//! - **Scenarios** (`scenarios.rs`): Pre-built runs over a [`Harness`]
//! - **Report** (`report.rs`): What a run observed, printable or as JSON
//!
//! ## Example
//!
//! ```rust,ignore
//! use concourse_simulation::*;
//!
//! let report = run_tsp_scenario(&SimOptions::default()).await?;
//! println!("{report}");
//! ```

pub mod report;
pub mod scenarios;
pub mod venue;

pub use report::{RouteSummary, ScenarioReport, SegmentSummary};
pub use scenarios::{
    Harness, SimOptions, run_all, run_churn_scenario, run_failure_scenario, run_mixed_scenario,
    run_simple_scenario, run_tsp_scenario,
};
pub use venue::{NarratingDelegate, SimVenue, TallyOverlay, place};
