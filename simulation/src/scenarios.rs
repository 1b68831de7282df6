//! Pre-defined scenarios for the simulated terminal
//!
//! Every scenario builds a fresh [`Harness`], drives the route manager the way
//! a map host would, and returns what it observed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use concourse_core::{
    Location, RouteEvent, RouteLocation, RouteRequest, RouteState, SimpleRouteRequest,
    TransportType, TspRouteRequest,
};
use concourse_routing::{Route, RouteManager, RoutingConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{info, warn};

use crate::report::{RouteSummary, ScenarioReport};
use crate::venue::{self, NarratingDelegate, PLACES, SimVenue};

/// How long a route may take to reach a result
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs shared by all scenarios
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Delay of every navigation service call
    pub latency: Duration,
    /// Routes created by the churn scenario
    pub routes: usize,
    /// Seed for the churn scenario's endpoints
    pub seed: u64,
    pub routing: RoutingConfig,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(5),
            routes: 50,
            seed: 7,
            routing: RoutingConfig::default(),
        }
    }
}

/// A route manager wired to the simulated terminal
pub struct Harness {
    pub venue: SimVenue,
    pub manager: RouteManager,
    pub delegate: Arc<NarratingDelegate>,
    events: broadcast::Receiver<RouteEvent>,
    events_seen: usize,
}

impl Harness {
    pub fn new(options: &SimOptions) -> Self {
        let venue = SimVenue::new(options.latency);
        let manager = RouteManager::new(venue.services(), options.routing.clone())
            .with_overlay(venue.overlay.clone());
        let events = manager.subscribe();
        Self {
            venue,
            manager,
            delegate: Arc::new(NarratingDelegate::default()),
            events,
            events_seen: 0,
        }
    }

    /// Register a route narrated by the harness delegate
    pub fn route(&self, request: impl Into<RouteRequest>) -> anyhow::Result<Arc<Route>> {
        Ok(self
            .manager
            .make_route_with_delegate(request, &self.delegate)?)
    }

    /// Wait until the route has a result or is removed
    pub async fn settle(&mut self, route: &Route) -> anyhow::Result<RouteState> {
        let events = &mut self.events;
        let seen = &mut self.events_seen;
        let waited = tokio::time::timeout(SETTLE_TIMEOUT, async {
            loop {
                let state = route.state();
                if state.is_terminal_result() || state.is_removed() {
                    return Ok(state);
                }
                match events.recv().await {
                    Ok(_) => *seen += 1,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event stream lagged");
                        *seen += skipped as usize;
                    }
                    Err(RecvError::Closed) => bail!("route event stream closed"),
                }
            }
        })
        .await;
        waited.map_err(|_| anyhow!("route {} did not settle", route.identifier()))?
    }

    /// Wait for every live route
    pub async fn settle_all(&mut self) -> anyhow::Result<()> {
        for route in self.manager.routes() {
            self.settle(&route).await?;
        }
        Ok(())
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(_) => self.events_seen += 1,
                Err(TryRecvError::Lagged(skipped)) => self.events_seen += skipped as usize,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Summarize the live routes and everything observed so far
    pub fn report(&mut self, scenario: &str) -> ScenarioReport {
        self.drain_events();
        let mut routes: Vec<RouteSummary> = self
            .manager
            .routes()
            .iter()
            .map(|r| RouteSummary::from(r.as_ref()))
            .collect();
        routes.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        ScenarioReport {
            scenario: scenario.to_string(),
            routes,
            events: self.events_seen,
            notifications: self.delegate.seen().len(),
            indoor_calls: self.venue.indoor.calls(),
            outdoor_calls: self.venue.outdoor.calls(),
            overlay: self.venue.overlay.tally(),
            notes: Vec::new(),
        }
    }
}

fn place(name: &str) -> anyhow::Result<Location> {
    venue::place(name).with_context(|| format!("unknown place {name}"))
}

fn visit_order(route: &Route) -> String {
    route
        .segments()
        .iter()
        .map(|s| s.identifier.as_deref().unwrap_or("?"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errands before boarding: a multi-stop route from the traveller's position
pub async fn run_tsp_scenario(options: &SimOptions) -> anyhow::Result<ScenarioReport> {
    info!("=== Running TSP Scenario ===");
    let mut harness = Harness::new(options);
    harness.venue.user.walk_to(Some(place("check-in")?));

    let request = TspRouteRequest::new("errands")?
        .with_location(place("gate-b2")?, Some("boarding"), 0)
        .with_location(place("coffee")?, Some("coffee"), 1)
        .with_location(place("pharmacy")?, Some("pharmacy"), 1)
        .with_location(place("lounge")?, Some("lounge"), 2);
    let route = harness.route(request)?;
    let state = harness.settle(&route).await?;
    info!(%state, order = %visit_order(&route), "Errands planned");

    let mut report = harness.report("tsp");
    report.note(format!("visit order: {}", visit_order(&route)));
    Ok(report)
}

/// Point to point routes covering every kind of leg
pub async fn run_simple_scenario(options: &SimOptions) -> anyhow::Result<ScenarioReport> {
    info!("=== Running Simple Scenario ===");
    let mut harness = Harness::new(options);

    let requests = [
        SimpleRouteRequest::new("arrival")?
            .with_start(place("parking")?)
            .with_end(place("gate-a2")?),
        SimpleRouteRequest::new("pickup")?
            .with_start(place("gate-b1")?)
            .with_end(place("rental-cars")?)
            .with_transport_type(TransportType::Automobile),
        SimpleRouteRequest::new("step-free")?
            .with_start(place("coffee")?)
            .with_end(place("gate-b1")?)
            .with_navigation_index(1),
        SimpleRouteRequest::new("transfer")?
            .with_start(place("apron")?)
            .with_end(place("rental-cars")?)
            .with_transport_type(TransportType::Transit),
        SimpleRouteRequest::new("stay")?
            .with_start(place("coffee")?)
            .with_end(place("coffee")?),
    ];
    for request in requests {
        harness.route(request)?;
    }
    harness.settle_all().await?;

    let mut report = harness.report("simple");
    let curb = Location::new(venue::CURBSIDE_DOOR, 0);
    report.note(format!(
        "curbside door counts as inside: {}",
        harness.manager.is_location_inside_venue(&curb)
    ));
    Ok(report)
}

/// A traveller on the move while the map changes under the routes
pub async fn run_mixed_scenario(options: &SimOptions) -> anyhow::Result<ScenarioReport> {
    info!("=== Running Mixed Scenario ===");
    let mut harness = Harness::new(options);
    harness.venue.user.walk_to(Some(place("security")?));

    let tour = harness.route(
        TspRouteRequest::new("tour")?
            .with_location(place("gate-a1")?, Some("boarding"), 0)
            .with_location(place("coffee")?, Some("coffee"), 1)
            .with_location(RouteLocation::UserLocation, Some("back"), 2),
    )?;
    let shuttle = harness.route(
        SimpleRouteRequest::new("shuttle")?
            .with_start(place("parking")?)
            .with_end(place("check-in")?)
            .with_transport_type(TransportType::Automobile),
    )?;
    harness.settle_all().await?;
    let mut notes = vec![format!(
        "tour via escalators: {:.0} s, order {}",
        tour.total_time(),
        visit_order(&tour)
    )];

    // Only the route depending on the user follows the user
    let shuttle_generation = shuttle.generation();
    harness.venue.user.walk_to(Some(place("pharmacy")?));
    harness.manager.user_location_did_change();
    harness.settle_all().await?;
    notes.push(format!(
        "user moved: tour generation {}, shuttle recalculated {}",
        tour.generation(),
        shuttle.generation() != shuttle_generation
    ));

    harness.manager.set_navigation_index("tour", 1);
    harness.settle(&tour).await?;
    notes.push(format!("tour via elevator: {:.0} s", tour.total_time()));

    harness.manager.set_navigation_index("tour", 7);
    harness.settle(&tour).await?;
    notes.push(format!(
        "unknown profile: {} ({:?})",
        tour.state(),
        tour.error().map(|e| e.code())
    ));

    harness.manager.set_navigation_index("tour", 0);
    harness.manager.ordinal_did_change(1);
    harness.manager.map_layer_did_change();
    harness.settle_all().await?;
    notes.push(format!(
        "after floor and layer switch: shuttle generation {}",
        shuttle.generation()
    ));

    let mut report = harness.report("mixed");
    report.notes = notes;
    Ok(report)
}

/// Many routes, invalidated and removed while they calculate
pub async fn run_churn_scenario(options: &SimOptions) -> anyhow::Result<ScenarioReport> {
    info!(routes = options.routes, "=== Running Churn Scenario ===");
    let mut harness = Harness::new(options);
    let indoor: Vec<Location> = PLACES
        .iter()
        .filter_map(|(name, ..)| venue::place(name))
        .filter(|l| harness.manager.is_location_inside_venue(l))
        .collect();
    if indoor.len() < 2 {
        bail!("terminal has too few indoor places");
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut created = Vec::with_capacity(options.routes);
    for i in 0..options.routes {
        let from = indoor[rng.random_range(0..indoor.len())].clone();
        let to = indoor[rng.random_range(0..indoor.len())].clone();
        let request = SimpleRouteRequest::new(format!("churn-{i:04}"))?
            .with_start(from)
            .with_end(to)
            .with_navigation_index((i % 2) as u32);
        created.push(harness.route(request)?);
        if i % 10 == 9 {
            harness.manager.navigation_data_did_change();
            tokio::task::yield_now().await;
        }
    }

    let mut removed = 0;
    for route in created.iter().step_by(3) {
        harness.manager.remove_route(route);
        removed += 1;
    }
    harness.settle_all().await?;

    let stale = created
        .iter()
        .filter(|r| r.is_removed() && !r.segments().is_empty())
        .count();
    if stale > 0 {
        bail!("{stale} removed routes still carry segments");
    }

    let completed = harness
        .manager
        .routes()
        .iter()
        .filter(|r| r.state() == RouteState::Completed)
        .count();
    let mut report = harness.report("churn");
    report.note(format!(
        "{} created, {removed} removed, {completed} completed",
        created.len()
    ));
    Ok(report)
}

/// Recovering from a missing user location and an outdoor outage
pub async fn run_failure_scenario(options: &SimOptions) -> anyhow::Result<ScenarioReport> {
    info!("=== Running Failure Scenario ===");
    let mut harness = Harness::new(options);
    let mut notes = Vec::new();

    let to_gate = harness.route(SimpleRouteRequest::new("to-gate")?.with_end(place("gate-a1")?))?;
    harness.settle(&to_gate).await?;
    notes.push(format!("without a fix: {} ({:?})", to_gate.state(), to_gate.error()));

    harness.venue.user.walk_to(Some(place("check-in")?));
    harness.manager.user_location_did_change();
    harness.settle(&to_gate).await?;
    notes.push(format!("with a fix: {}", to_gate.state()));

    harness.venue.outdoor.set_online(false);
    let arrival = harness.route(
        SimpleRouteRequest::new("from-parking")?
            .with_start(place("parking")?)
            .with_end(place("security")?),
    )?;
    harness.settle(&arrival).await?;
    notes.push(format!("outdoor offline: {} ({:?})", arrival.state(), arrival.error()));

    harness.venue.outdoor.set_online(true);
    harness.manager.recalculate("from-parking");
    harness.settle(&arrival).await?;
    notes.push(format!("outdoor back: {}", arrival.state()));

    harness.manager.remove_route_with_identifier("to-gate");
    notes.push(format!(
        "to-gate notifications: {:?}",
        harness.delegate.states_of("to-gate")
    ));

    let mut report = harness.report("failure");
    report.notes = notes;
    Ok(report)
}

/// Run every scenario in turn
pub async fn run_all(options: &SimOptions) -> anyhow::Result<Vec<ScenarioReport>> {
    Ok(vec![
        run_tsp_scenario(options).await?,
        run_simple_scenario(options).await?,
        run_mixed_scenario(options).await?,
        run_churn_scenario(options).await?,
        run_failure_scenario(options).await?,
    ])
}
