//! Simulated airport terminal
//!
//! A two-floor terminal of 200 x 100 meters. Floors are joined by an
//! escalator bank (navigation profile 0) and an elevator (profile 1, step
//! free). Outside, the curbside door at (200, 50) and the airside door at
//! (0, 50) are the only ways in.
//!
//! ```text
//!  (0,100) +-----------------------------+ (200,100)
//!          |  A1   A2        B1     B2   |
//!  airside D        [esc]  [elv]          D curbside
//!          |  check-in   coffee   lounge |
//!    (0,0) +-----------------------------+ (200,0)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use concourse_core::{
    IndoorNavigator, IndoorPath, Location, MapPoint, OutdoorNavigator, OutdoorPath, RouteError,
    RouteOverlay, RouteSegment, RouteState, Step, TransportType, UserLocationSource,
    VenueBoundary,
};
use concourse_routing::{NavigationServices, Route, RouteDelegate};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

pub const CURBSIDE_DOOR: MapPoint = MapPoint { x: 200.0, y: 50.0 };
pub const AIRSIDE_DOOR: MapPoint = MapPoint { x: 0.0, y: 50.0 };

const ESCALATORS: MapPoint = MapPoint { x: 90.0, y: 50.0 };
const ELEVATOR: MapPoint = MapPoint { x: 110.0, y: 50.0 };

/// Meters per second
const WALKING_SPEED: f64 = 1.4;
/// Meters of travel added per floor change
const FLOOR_HEIGHT: f64 = 6.0;
const ESCALATOR_SECONDS_PER_FLOOR: f64 = 20.0;
const ELEVATOR_SECONDS_PER_FLOOR: f64 = 45.0;

/// Navigation profiles with indoor data
pub const PROFILE_COUNT: u32 = 2;

/// Named places of the terminal
pub const PLACES: &[(&str, f64, f64, i32)] = &[
    ("check-in", 160.0, 20.0, 0),
    ("security", 130.0, 50.0, 0),
    ("coffee", 100.0, 20.0, 0),
    ("pharmacy", 60.0, 30.0, 0),
    ("lounge", 170.0, 20.0, 1),
    ("gate-a1", 20.0, 90.0, 1),
    ("gate-a2", 50.0, 90.0, 1),
    ("gate-b1", 140.0, 90.0, 1),
    ("gate-b2", 180.0, 90.0, 1),
    ("parking", 320.0, 40.0, 0),
    ("rental-cars", 400.0, -80.0, 0),
    ("apron", -150.0, 50.0, 0),
];

/// Look up a named place
pub fn place(name: &str) -> Option<Location> {
    PLACES
        .iter()
        .find(|(n, ..)| *n == name)
        .map(|(n, x, y, ordinal)| Location::new((*x, *y), *ordinal).with_title(*n))
}

/// Terminal footprint
pub fn boundary() -> VenueBoundary {
    VenueBoundary::rectangle(MapPoint::new(0.0, 0.0), MapPoint::new(200.0, 100.0))
}

/// Indoor service walking straight lines, changing floors at the escalators
/// or the elevator
pub struct SimIndoor {
    latency: Duration,
    calls: AtomicUsize,
}

impl SimIndoor {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IndoorNavigator for SimIndoor {
    async fn compute_indoor_path(
        &self,
        from: &Location,
        to: &Location,
        navigation_index: u32,
    ) -> Result<IndoorPath, RouteError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.latency).await;

        let from_floor = from.ordinal().unwrap_or(0);
        let to_floor = to.ordinal().unwrap_or(0);
        if from_floor == to_floor {
            let distance = from.distance_to(to);
            return Ok(IndoorPath {
                steps: vec![Step::new(vec![from.position(), to.position()], Some(to_floor))],
                distance,
                time: distance / WALKING_SPEED,
            });
        }

        let (connector, per_floor, name) = match navigation_index {
            0 => (ESCALATORS, ESCALATOR_SECONDS_PER_FLOOR, "escalators"),
            1 => (ELEVATOR, ELEVATOR_SECONDS_PER_FLOOR, "elevator"),
            other => return Err(RouteError::BadNavigationIndex(other)),
        };
        let floors = f64::from((to_floor - from_floor).abs());
        let walk = from.position().distance_to(&connector) + connector.distance_to(&to.position());
        Ok(IndoorPath {
            steps: vec![
                Step::new(vec![from.position(), connector], Some(from_floor))
                    .with_instructions(format!("Walk to the {name}")),
                Step::new(vec![connector, to.position()], Some(to_floor))
                    .with_instructions(format!("Take the {name} to floor {to_floor}")),
            ],
            distance: walk + floors * FLOOR_HEIGHT,
            time: walk / WALKING_SPEED + floors * per_floor,
        })
    }

    fn supports_navigation_index(&self, navigation_index: u32) -> bool {
        navigation_index < PROFILE_COUNT
    }
}

/// Outdoor service entering and leaving through the nearest door
///
/// Can be taken offline to simulate a directions outage.
pub struct SimOutdoor {
    latency: Duration,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl SimOutdoor {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

/// Meters per second
fn speed(transport_type: TransportType) -> f64 {
    match transport_type {
        TransportType::Automobile => 11.0,
        TransportType::Transit => 7.0,
        TransportType::Walking | TransportType::Any => WALKING_SPEED,
    }
}

fn nearest_door(point: MapPoint) -> MapPoint {
    if point.distance_to(&CURBSIDE_DOOR) <= point.distance_to(&AIRSIDE_DOOR) {
        CURBSIDE_DOOR
    } else {
        AIRSIDE_DOOR
    }
}

#[async_trait]
impl OutdoorNavigator for SimOutdoor {
    async fn compute_outdoor_path(
        &self,
        from: &Location,
        to: &Location,
        transport_type: TransportType,
    ) -> Result<OutdoorPath, RouteError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.latency).await;
        if !self.online.load(Ordering::SeqCst) {
            return Err(RouteError::generic("outdoor directions service is offline"));
        }

        let venue = boundary();
        let from_inside = venue.contains(from.position());
        let to_inside = venue.contains(to.position());
        let (start, end, door) = match (from_inside, to_inside) {
            (true, false) => {
                let door = nearest_door(to.position());
                (door, to.position(), door)
            }
            (false, true) => {
                let door = nearest_door(from.position());
                (from.position(), door, door)
            }
            _ => (from.position(), to.position(), nearest_door(from.position())),
        };

        let distance = start.distance_to(&end);
        Ok(OutdoorPath {
            steps: vec![
                Step::new(vec![start, end], None)
                    .with_instructions(format!("Travel by {transport_type}")),
            ],
            distance,
            time: distance / speed(transport_type),
            venue_crossing_point: Location::new(door, 0),
        })
    }
}

/// The traveller's device position
#[derive(Default)]
pub struct SimUser {
    location: Mutex<Option<Location>>,
}

impl SimUser {
    pub fn walk_to(&self, location: Option<Location>) {
        *self.location.lock() = location;
    }
}

impl UserLocationSource for SimUser {
    fn current_user_location(&self) -> Option<Location> {
        self.location.lock().clone()
    }
}

/// Draw and clear counts kept by [`TallyOverlay`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayTally {
    pub drawn: usize,
    pub cleared: usize,
    /// Segments currently on the map, per route
    pub on_map: HashMap<String, usize>,
}

/// Overlay that counts what would be drawn
#[derive(Default)]
pub struct TallyOverlay {
    tally: Mutex<OverlayTally>,
}

impl TallyOverlay {
    pub fn tally(&self) -> OverlayTally {
        self.tally.lock().clone()
    }
}

impl RouteOverlay for TallyOverlay {
    fn display_segment(&self, route_id: &str, segment: &RouteSegment) {
        debug!(route_id, index = segment.index, "Drawing segment");
        let mut tally = self.tally.lock();
        tally.drawn += 1;
        *tally.on_map.entry(route_id.to_string()).or_default() += 1;
    }

    fn clear_route(&self, route_id: &str) {
        let mut tally = self.tally.lock();
        tally.cleared += 1;
        tally.on_map.remove(route_id);
    }
}

/// Delegate narrating every state change of the routes it watches
#[derive(Default)]
pub struct NarratingDelegate {
    seen: Mutex<Vec<(String, RouteState)>>,
}

impl NarratingDelegate {
    /// Notifications received so far, in order
    pub fn seen(&self) -> Vec<(String, RouteState)> {
        self.seen.lock().clone()
    }

    /// States seen for one route, in order
    pub fn states_of(&self, route_id: &str) -> Vec<RouteState> {
        self.seen
            .lock()
            .iter()
            .filter(|(id, _)| id == route_id)
            .map(|(_, state)| *state)
            .collect()
    }
}

impl RouteDelegate for NarratingDelegate {
    fn route_did_change_state(&self, route: &Route) {
        let state = route.state();
        match state {
            RouteState::Completed => info!(
                route_id = route.identifier(),
                segments = route.segments().len(),
                distance = route.total_distance(),
                time = route.total_time(),
                "Route ready"
            ),
            RouteState::Failed => info!(
                route_id = route.identifier(),
                error = ?route.error(),
                "Route failed"
            ),
            _ => debug!(route_id = route.identifier(), %state, "Route changed state"),
        }
        self.seen.lock().push((route.identifier().to_string(), state));
    }
}

/// All simulated services of the terminal
pub struct SimVenue {
    pub indoor: Arc<SimIndoor>,
    pub outdoor: Arc<SimOutdoor>,
    pub user: Arc<SimUser>,
    pub overlay: Arc<TallyOverlay>,
}

impl SimVenue {
    /// Create the venue with the same latency on every service call
    pub fn new(latency: Duration) -> Self {
        Self {
            indoor: Arc::new(SimIndoor::new(latency)),
            outdoor: Arc::new(SimOutdoor::new(latency)),
            user: Arc::new(SimUser::default()),
            overlay: Arc::new(TallyOverlay::default()),
        }
    }

    /// Services to hand to a route manager
    ///
    /// Destinations outside the terminal but within 5 meters of a door are
    /// treated as inside.
    pub fn services(&self) -> NavigationServices {
        NavigationServices::new(
            self.indoor.clone(),
            self.outdoor.clone(),
            Arc::new(boundary()),
            self.user.clone(),
        )
        .with_hint_override(Arc::new(
            |point: MapPoint, is_destination: bool, hint: bool| {
                hint || (is_destination
                    && (point.distance_to(&CURBSIDE_DOOR) <= 5.0
                        || point.distance_to(&AIRSIDE_DOOR) <= 5.0))
            },
        ))
    }
}
