//! Route registry and recalculation triggers
//!
//! The [`RouteManager`] owns every live [`Route`], starts their calculations
//! on spawned tokio tasks and reacts to external changes (user location,
//! floor, map layer, navigation data) by invalidating and recalculating the
//! affected routes.
//!
//! Each transition is published three ways, in this order:
//!
//! 1. the [`RouteOverlay`] is cleared or handed the completed segments
//! 2. a [`RouteEvent`] goes out on the broadcast stream
//! 3. the route's [`RouteDelegate`] is called
//!
//! A route's notifications are delivered one at a time in transition order,
//! after every lock on the route is released. Observers may call back into
//! the manager, including for other routes.
//!
//! [`make_route`](RouteManager::make_route) returns an `Idle` route. The
//! calculation starts on a spawned task, so the first notification the
//! caller sees is `Calculating`.

use std::sync::Arc;

use concourse_core::{
    IndoorNavigator, Location, ManagerError, OutdoorNavigator, RouteEvent, RouteOverlay,
    RouteRequest, RouteState, UserLocationSource, VenueHintOverride, VenueMembership,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace, warn};

use crate::builder::SegmentBuilder;
use crate::calculator::RouteCalculator;
use crate::classifier::VenueClassifier;
use crate::config::RoutingConfig;
use crate::error::RoutingResult;
use crate::route::{Route, RouteDelegate, Transition};

/// External services the manager calculates with
#[derive(Clone)]
pub struct NavigationServices {
    pub indoor: Arc<dyn IndoorNavigator>,
    pub outdoor: Arc<dyn OutdoorNavigator>,
    pub venue: Arc<dyn VenueMembership>,
    pub user_location: Arc<dyn UserLocationSource>,
    pub hint_override: Option<Arc<dyn VenueHintOverride>>,
}

impl NavigationServices {
    pub fn new(
        indoor: Arc<dyn IndoorNavigator>,
        outdoor: Arc<dyn OutdoorNavigator>,
        venue: Arc<dyn VenueMembership>,
        user_location: Arc<dyn UserLocationSource>,
    ) -> Self {
        Self {
            indoor,
            outdoor,
            venue,
            user_location,
            hint_override: None,
        }
    }

    /// Override the inside-the-venue test per point
    pub fn with_hint_override(mut self, hint_override: Arc<dyn VenueHintOverride>) -> Self {
        self.hint_override = Some(hint_override);
        self
    }
}

/// Applies transitions and fans them out
#[derive(Clone)]
struct Notifier {
    events: broadcast::Sender<RouteEvent>,
    overlay: Option<Arc<dyn RouteOverlay>>,
}

impl Notifier {
    /// Run one transition, then publish whatever the route has queued
    fn apply(
        &self,
        route: &Route,
        transition: impl FnOnce(&Route) -> Option<Transition>,
    ) -> Option<Transition> {
        let applied = transition(route)?;
        route.drain_notifications(|queued| self.publish(route, queued));
        Some(applied)
    }

    fn publish(&self, route: &Route, transition: Transition) {
        let id = route.identifier();
        match transition.to {
            RouteState::Completed => info!(
                route_id = id,
                generation = transition.generation,
                segments = route.segments().len(),
                distance = route.total_distance(),
                "Route completed"
            ),
            RouteState::Failed => warn!(
                route_id = id,
                generation = transition.generation,
                error = ?route.error(),
                "Route failed"
            ),
            state => debug!(
                route_id = id,
                from = %transition.from,
                to = %state,
                generation = transition.generation,
                "Route state changed"
            ),
        }

        let delegate = route.delegate();

        if let Some(overlay) = &self.overlay {
            if transition.from == RouteState::Completed || transition.to == RouteState::Removed {
                overlay.clear_route(id);
            }
            if transition.to == RouteState::Completed {
                for mut segment in route.segments() {
                    if let Some(delegate) = &delegate {
                        delegate.will_display_segment(route, &mut segment);
                    }
                    overlay.display_segment(id, &segment);
                }
            }
        }

        // No receivers is fine
        let _ = self
            .events
            .send(RouteEvent::new(id, transition.to, transition.generation));

        if let Some(delegate) = delegate {
            delegate.route_did_change_state(route);
        }
    }
}

/// Registry of live routes
///
/// Route creation and the recalculation triggers spawn tokio tasks, so they
/// must be called from within a tokio runtime.
pub struct RouteManager {
    routes: DashMap<String, Arc<Route>>,
    calculator: RouteCalculator,
    notifier: Notifier,
    config: RoutingConfig,
}

impl RouteManager {
    /// Create a manager calculating with the given services
    pub fn new(services: NavigationServices, config: RoutingConfig) -> Self {
        let mut classifier = VenueClassifier::new(services.venue);
        if let Some(hint_override) = services.hint_override {
            classifier = classifier.with_override(hint_override);
        }
        let builder = SegmentBuilder::new(services.indoor, services.outdoor, classifier)
            .with_styles(config.styles.clone());
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));

        Self {
            routes: DashMap::new(),
            calculator: RouteCalculator::new(builder, services.user_location),
            notifier: Notifier {
                events,
                overlay: None,
            },
            config,
        }
    }

    /// Hand completed segments to a rendering overlay
    pub fn with_overlay(mut self, overlay: Arc<dyn RouteOverlay>) -> Self {
        self.notifier.overlay = Some(overlay);
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Subscribe to route state transitions
    pub fn subscribe(&self) -> broadcast::Receiver<RouteEvent> {
        self.notifier.events.subscribe()
    }

    /// Register a route for `request` and schedule its calculation
    ///
    /// The returned route is still `Idle`.
    pub fn make_route(&self, request: impl Into<RouteRequest>) -> RoutingResult<Arc<Route>> {
        let request = request.into();
        request.validate()?;
        self.register(Route::new(request))
    }

    /// Like [`make_route`](Self::make_route), observed by `delegate`
    ///
    /// The delegate is held weakly and sees every transition, starting with
    /// `Calculating` once the spawned calculation begins.
    pub fn make_route_with_delegate<D: RouteDelegate + 'static>(
        &self,
        request: impl Into<RouteRequest>,
        delegate: &Arc<D>,
    ) -> RoutingResult<Arc<Route>> {
        let request = request.into();
        request.validate()?;
        let route = Route::new(request);
        route.set_delegate(delegate);
        self.register(route)
    }

    fn register(&self, route: Route) -> RoutingResult<Arc<Route>> {
        let route = Arc::new(route);
        match self.routes.entry(route.identifier().to_string()) {
            Entry::Occupied(entry) => {
                warn!(route_id = entry.key().as_str(), "Duplicate route identifier");
                return Err(ManagerError::DuplicateIdentifier(entry.key().clone()));
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&route));
            }
        }
        debug!(route_id = route.identifier(), "Route registered");

        self.restart(&route);
        Ok(route)
    }

    pub fn route_for_identifier(&self, identifier: &str) -> Option<Arc<Route>> {
        self.routes.get(identifier).map(|r| Arc::clone(r.value()))
    }

    /// All live routes
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.routes.iter().map(|r| Arc::clone(r.value())).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Remove a route; no-op if it is not registered here
    pub fn remove_route(&self, route: &Route) {
        let removed = self
            .routes
            .remove_if(route.identifier(), |_, live| std::ptr::eq(Arc::as_ptr(live), route));
        match removed {
            Some((_, route)) => {
                self.notifier.apply(&route, Route::mark_removed);
            }
            None => trace!(route_id = route.identifier(), "Route not registered"),
        }
    }

    /// Remove the route registered under `identifier`
    ///
    /// Returns whether a route was removed.
    pub fn remove_route_with_identifier(&self, identifier: &str) -> bool {
        match self.routes.remove(identifier) {
            Some((_, route)) => {
                self.notifier.apply(&route, Route::mark_removed);
                true
            }
            None => false,
        }
    }

    pub fn remove_all_routes(&self) {
        let identifiers: Vec<String> = self.routes.iter().map(|r| r.key().clone()).collect();
        for identifier in identifiers {
            self.remove_route_with_identifier(&identifier);
        }
    }

    /// Recalculate routes that start or stop at the user location
    #[instrument(skip(self))]
    pub fn user_location_did_change(&self) {
        for route in self.routes() {
            if route.request().depends_on_user_location() {
                self.restart(&route);
            }
        }
    }

    /// Recalculate routes that reach floor `ordinal`
    ///
    /// A route is affected when a waypoint may lie on that floor or its
    /// calculated segments pass through it.
    #[instrument(skip(self))]
    pub fn ordinal_did_change(&self, ordinal: i32) {
        for route in self.routes() {
            if route.involves_ordinal(ordinal) {
                self.restart(&route);
            } else {
                trace!(route_id = route.identifier(), "Route not on changed floor");
            }
        }
    }

    /// Recalculate all routes after the map layer switched
    #[instrument(skip(self))]
    pub fn map_layer_did_change(&self) {
        self.restart_all();
    }

    /// Recalculate all routes after navigation data was reloaded
    #[instrument(skip(self))]
    pub fn navigation_data_did_change(&self) {
        self.restart_all();
    }

    /// Switch a route's navigation profile
    ///
    /// Recalculates only if the profile actually changes; returns whether it did.
    pub fn set_navigation_index(&self, identifier: &str, navigation_index: u32) -> bool {
        let Some(route) = self.route_for_identifier(identifier) else {
            return false;
        };
        if !route.set_navigation_index(navigation_index) {
            return false;
        }
        debug!(route_id = identifier, navigation_index, "Navigation index changed");
        self.restart(&route);
        true
    }

    /// Explicitly recalculate a route; returns false for unknown identifiers
    pub fn recalculate(&self, identifier: &str) -> bool {
        match self.route_for_identifier(identifier) {
            Some(route) => {
                self.restart(&route);
                true
            }
            None => false,
        }
    }

    /// Whether a location lies inside the venue, honouring any hint override
    pub fn is_location_inside_venue(&self, location: &Location) -> bool {
        self.calculator
            .builder()
            .classifier()
            .is_inside(location.position(), false)
    }

    fn restart_all(&self) {
        for route in self.routes() {
            self.restart(&route);
        }
    }

    /// Drop a route's data now and schedule a new calculation generation
    ///
    /// Restarts issued before the scheduled task runs share one generation.
    fn restart(&self, route: &Arc<Route>) {
        self.notifier.apply(route, Route::invalidate);

        let calculator = self.calculator.clone();
        let notifier = self.notifier.clone();
        let route = Arc::clone(route);
        tokio::spawn(async move {
            match notifier.apply(&route, Route::begin_calculation) {
                Some(started) => {
                    spawn_calculation(calculator, notifier, route, started.generation)
                }
                None => trace!(route_id = route.identifier(), "Calculation already scheduled"),
            }
        });
    }
}

fn spawn_calculation(
    calculator: RouteCalculator,
    notifier: Notifier,
    route: Arc<Route>,
    generation: u64,
) {
    let navigation_index = route.navigation_index();
    let task_route = Arc::clone(&route);

    let handle = tokio::spawn(async move {
        let result = calculator
            .calculate(task_route.request(), navigation_index)
            .await;
        let applied = notifier.apply(&task_route, |r| r.finish(generation, result));
        if applied.is_none() {
            trace!(route_id = task_route.identifier(), generation, "Discarded stale calculation");
        }
    });

    // Aborted right away if the route moved on before this runs
    route.attach_task(generation, handle.abort_handle());
}

impl std::fmt::Debug for RouteManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteManager")
            .field("routes", &self.routes.len())
            .field("calculator", &self.calculator)
            .field("config", &self.config)
            .finish()
    }
}
