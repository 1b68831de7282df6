//! Route lifecycle state machine
//!
//! A [`Route`] is created by the [`RouteManager`](crate::RouteManager) and
//! moves through:
//!
//! ```text
//! Idle ──> Calculating ──> Completed
//!  ^            │    └───> Failed
//!  └────────────┴──────────┘ (invalidation)
//!
//! any ──> Removed (terminal)
//! ```
//!
//! Every calculation start bumps a generation counter. A completion carrying
//! an older generation is stale and is dropped without touching the route,
//! so the last started calculation always wins.
//!
//! Transitions are queued on the route in the order they happen. Whoever
//! applied one drains the queue afterwards with no lock held, so observers
//! may call back into the manager, and a transition raised from inside a
//! callback is delivered by the drain already running.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use concourse_core::{MapRect, RouteError, RouteRequest, RouteSegment, RouteState};
use parking_lot::{Mutex, RwLock};
use tokio::task::AbortHandle;

/// Observer of a single route
///
/// Routes hold their delegate weakly; dropping the delegate silently stops
/// notifications.
pub trait RouteDelegate: Send + Sync {
    /// Called once per state transition, after state and data are consistent
    fn route_did_change_state(&self, route: &Route);

    /// Restyle a segment before it is handed to the overlay
    ///
    /// Only the overlay's copy is affected; [`Route::segments`] keeps the
    /// calculated styles.
    fn will_display_segment(&self, _route: &Route, _segment: &mut RouteSegment) {}
}

/// A state change applied to a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RouteState,
    pub to: RouteState,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct RouteInner {
    state: RouteState,
    segments: Vec<RouteSegment>,
    error: Option<RouteError>,
    navigation_index: u32,
    generation: u64,
    task: Option<AbortHandle>,
}

impl RouteInner {
    fn enter(&mut self, to: RouteState) -> Transition {
        let from = self.state;
        self.state = to;
        Transition {
            from,
            to,
            generation: self.generation,
        }
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Transitions waiting to be published
#[derive(Debug, Default)]
struct Outbox {
    pending: VecDeque<Transition>,
    draining: bool,
}

impl Outbox {
    fn claim(&mut self) -> bool {
        !std::mem::replace(&mut self.draining, true)
    }

    /// Pop the next transition, releasing the claim once empty
    fn next(&mut self) -> Option<Transition> {
        let next = self.pending.pop_front();
        if next.is_none() {
            self.draining = false;
        }
        next
    }
}

/// A calculated (or calculating) route
pub struct Route {
    identifier: String,
    request: RouteRequest,
    inner: RwLock<RouteInner>,
    delegate: RwLock<Option<Weak<dyn RouteDelegate>>>,
    outbox: Mutex<Outbox>,
}

impl Route {
    pub(crate) fn new(request: RouteRequest) -> Self {
        let inner = RouteInner {
            navigation_index: request.navigation_index(),
            ..RouteInner::default()
        };
        Self {
            identifier: request.identifier().to_string(),
            request,
            inner: RwLock::new(inner),
            delegate: RwLock::new(None),
            outbox: Mutex::new(Outbox::default()),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The request this route was created from
    pub fn request(&self) -> &RouteRequest {
        &self.request
    }

    pub fn state(&self) -> RouteState {
        self.inner.read().state
    }

    pub fn is_removed(&self) -> bool {
        self.state().is_removed()
    }

    /// Calculated segments; empty unless the route is `Completed`
    pub fn segments(&self) -> Vec<RouteSegment> {
        self.inner.read().segments.clone()
    }

    /// Error of the last calculation; set only while `Failed`
    pub fn error(&self) -> Option<RouteError> {
        self.inner.read().error.clone()
    }

    /// Navigation profile used for the next calculation
    pub fn navigation_index(&self) -> u32 {
        self.inner.read().navigation_index
    }

    /// Number of calculations started so far
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Sum of segment distances in meters
    pub fn total_distance(&self) -> f64 {
        self.inner.read().segments.iter().map(|s| s.total_distance).sum()
    }

    /// Sum of segment times in seconds
    pub fn total_time(&self) -> f64 {
        self.inner.read().segments.iter().map(|s| s.total_time).sum()
    }

    /// Rectangle enclosing every segment's geometry
    pub fn visible_rect(&self) -> Option<MapRect> {
        self.inner
            .read()
            .segments
            .iter()
            .filter_map(RouteSegment::visible_rect)
            .reduce(|a, b| a.union(&b))
    }

    pub fn delegate(&self) -> Option<Arc<dyn RouteDelegate>> {
        self.delegate.read().as_ref().and_then(Weak::upgrade)
    }

    /// Observe this route; only a weak reference is kept
    pub fn set_delegate<D: RouteDelegate + 'static>(&self, delegate: &Arc<D>) {
        let weak: Weak<D> = Arc::downgrade(delegate);
        *self.delegate.write() = Some(weak);
    }

    pub fn clear_delegate(&self) {
        *self.delegate.write() = None;
    }

    /// Whether this route's geometry or waypoints touch `ordinal`
    pub fn involves_ordinal(&self, ordinal: i32) -> bool {
        self.request.involves_ordinal(ordinal)
            || self
                .inner
                .read()
                .segments
                .iter()
                .any(|s| s.ordinals().contains(&ordinal))
    }

    /// Move to `to` and queue the transition while `inner` is still held
    fn enter(&self, inner: &mut RouteInner, to: RouteState) -> Transition {
        let transition = inner.enter(to);
        self.outbox.lock().pending.push_back(transition);
        transition
    }

    /// Hand queued transitions to `deliver`, oldest first, with no lock held
    ///
    /// Returns at once if another caller is already draining; that caller
    /// picks up whatever was queued meanwhile.
    pub(crate) fn drain_notifications(&self, mut deliver: impl FnMut(Transition)) {
        if !self.outbox.lock().claim() {
            return;
        }
        loop {
            let next = self.outbox.lock().next();
            match next {
                Some(transition) => deliver(transition),
                None => return,
            }
        }
    }

    /// Returns whether the profile changed
    pub(crate) fn set_navigation_index(&self, navigation_index: u32) -> bool {
        let mut inner = self.inner.write();
        if inner.state.is_removed() || inner.navigation_index == navigation_index {
            return false;
        }
        inner.navigation_index = navigation_index;
        true
    }

    /// Drop calculated data after an external change
    ///
    /// No-op for routes that are already `Idle` or `Removed`.
    pub(crate) fn invalidate(&self) -> Option<Transition> {
        let mut inner = self.inner.write();
        match inner.state {
            RouteState::Calculating | RouteState::Completed | RouteState::Failed => {
                inner.abort_task();
                inner.segments.clear();
                inner.error = None;
                Some(self.enter(&mut inner, RouteState::Idle))
            }
            RouteState::Idle | RouteState::Removed => None,
        }
    }

    /// Start a new calculation generation from `Idle`
    pub(crate) fn begin_calculation(&self) -> Option<Transition> {
        let mut inner = self.inner.write();
        if inner.state != RouteState::Idle {
            return None;
        }
        inner.generation += 1;
        inner.segments.clear();
        inner.error = None;
        Some(self.enter(&mut inner, RouteState::Calculating))
    }

    /// Remember the task computing `generation` so it can be aborted
    pub(crate) fn attach_task(&self, generation: u64, task: AbortHandle) {
        let mut inner = self.inner.write();
        if inner.state == RouteState::Calculating && inner.generation == generation {
            inner.task = Some(task);
        } else {
            task.abort();
        }
    }

    /// Apply a calculation result
    ///
    /// Returns `None` when the result is stale: the route moved on to a newer
    /// generation, was invalidated, or was removed.
    pub(crate) fn finish(
        &self,
        generation: u64,
        result: Result<Vec<RouteSegment>, RouteError>,
    ) -> Option<Transition> {
        let mut inner = self.inner.write();
        if inner.state != RouteState::Calculating || inner.generation != generation {
            return None;
        }
        inner.task = None;
        match result {
            Ok(segments) => {
                inner.segments = segments;
                Some(self.enter(&mut inner, RouteState::Completed))
            }
            Err(error) => {
                inner.segments.clear();
                inner.error = Some(error);
                Some(self.enter(&mut inner, RouteState::Failed))
            }
        }
    }

    /// Enter the terminal state; `None` if already removed
    pub(crate) fn mark_removed(&self) -> Option<Transition> {
        let mut inner = self.inner.write();
        if inner.state.is_removed() {
            return None;
        }
        inner.abort_task();
        inner.segments.clear();
        inner.error = None;
        Some(self.enter(&mut inner, RouteState::Removed))
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Route")
            .field("identifier", &self.identifier)
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .field("segments", &inner.segments.len())
            .field("error", &inner.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concourse_core::{Location, MapPoint, SegmentStyles, SimpleRouteRequest, Step};
    use parking_lot::Mutex;

    fn route() -> Route {
        let request = SimpleRouteRequest::new("r1")
            .unwrap()
            .with_start(Location::new((0.0, 0.0), 0))
            .with_end(Location::new((10.0, 0.0), 0))
            .with_navigation_index(1);
        Route::new(request.into())
    }

    fn segment(index: usize, length: f64) -> RouteSegment {
        let start = Location::new((0.0, 0.0), 0);
        let end = Location::new((length, 0.0), 0);
        RouteSegment {
            steps: vec![Step::new(vec![start.position(), end.position()], Some(0))],
            styles: SegmentStyles::default(),
            total_time: length,
            total_distance: length,
            start_location: start,
            end_location: end,
            identifier: None,
            index,
        }
    }

    #[test]
    fn test_new_route_is_idle() {
        let route = route();
        assert_eq!(route.identifier(), "r1");
        assert_eq!(route.state(), RouteState::Idle);
        assert_eq!(route.generation(), 0);
        assert_eq!(route.navigation_index(), 1);
        assert!(route.segments().is_empty());
        assert!(route.error().is_none());
    }

    #[test]
    fn test_complete_cycle() {
        let route = route();
        let t = route.begin_calculation().unwrap();
        assert_eq!((t.from, t.to, t.generation), (RouteState::Idle, RouteState::Calculating, 1));

        let t = route
            .finish(1, Ok(vec![segment(0, 3.0), segment(1, 4.0)]))
            .unwrap();
        assert_eq!(t.to, RouteState::Completed);
        assert_eq!(route.segments().len(), 2);
        assert_eq!(route.total_distance(), 7.0);
        assert_eq!(route.total_time(), 7.0);
        assert!(route.visible_rect().is_some());
    }

    #[test]
    fn test_failure_clears_segments() {
        let route = route();
        route.begin_calculation().unwrap();
        let t = route.finish(1, Err(RouteError::NoUserLocation)).unwrap();
        assert_eq!(t.to, RouteState::Failed);
        assert!(route.segments().is_empty());
        assert_eq!(route.error(), Some(RouteError::NoUserLocation));
    }

    #[test]
    fn test_stale_generation_discarded() {
        let route = route();
        route.begin_calculation().unwrap();
        route.invalidate().unwrap();
        route.begin_calculation().unwrap();
        assert_eq!(route.generation(), 2);

        assert!(route.finish(1, Ok(vec![segment(0, 1.0)])).is_none());
        assert_eq!(route.state(), RouteState::Calculating);
        assert!(route.segments().is_empty());

        assert!(route.finish(2, Ok(vec![segment(0, 2.0)])).is_some());
        assert_eq!(route.total_distance(), 2.0);
    }

    #[test]
    fn test_invalidate_clears_data() {
        let route = route();
        route.begin_calculation().unwrap();
        route.finish(1, Err(RouteError::generic("x"))).unwrap();

        let t = route.invalidate().unwrap();
        assert_eq!((t.from, t.to), (RouteState::Failed, RouteState::Idle));
        assert!(route.error().is_none());

        // Already idle
        assert!(route.invalidate().is_none());
    }

    #[test]
    fn test_begin_requires_idle() {
        let route = route();
        route.begin_calculation().unwrap();
        assert!(route.begin_calculation().is_none());
        assert_eq!(route.generation(), 1);
    }

    #[test]
    fn test_removed_is_terminal() {
        let route = route();
        route.begin_calculation().unwrap();
        let t = route.mark_removed().unwrap();
        assert_eq!((t.from, t.to), (RouteState::Calculating, RouteState::Removed));

        assert!(route.mark_removed().is_none());
        assert!(route.invalidate().is_none());
        assert!(route.begin_calculation().is_none());
        assert!(route.finish(1, Ok(vec![segment(0, 1.0)])).is_none());
        assert!(!route.set_navigation_index(0));
        assert!(route.is_removed());
    }

    #[test]
    fn test_removal_drops_failure() {
        let route = route();
        route.begin_calculation().unwrap();
        route.finish(1, Err(RouteError::NoUserLocation)).unwrap();

        route.mark_removed().unwrap();
        assert!(route.error().is_none());
        assert!(route.segments().is_empty());
    }

    #[test]
    fn test_notifications_drain_in_order() {
        let route = route();
        route.begin_calculation().unwrap();
        route.finish(1, Ok(vec![segment(0, 1.0)])).unwrap();
        route.invalidate().unwrap();

        let mut seen = Vec::new();
        route.drain_notifications(|t| seen.push((t.from, t.to)));
        assert_eq!(
            seen,
            vec![
                (RouteState::Idle, RouteState::Calculating),
                (RouteState::Calculating, RouteState::Completed),
                (RouteState::Completed, RouteState::Idle),
            ]
        );

        seen.clear();
        route.drain_notifications(|t| seen.push((t.from, t.to)));
        assert!(seen.is_empty());
    }

    #[test]
    fn test_transition_raised_while_draining_is_delivered_after() {
        let route = route();
        route.begin_calculation().unwrap();

        let mut seen = Vec::new();
        route.drain_notifications(|t| {
            seen.push(t.to);
            if t.to == RouteState::Calculating {
                route.mark_removed().unwrap();
                // Nested drains defer to the one already running
                route.drain_notifications(|_| panic!("nested delivery"));
            }
        });
        assert_eq!(seen, vec![RouteState::Calculating, RouteState::Removed]);
    }

    #[test]
    fn test_involves_ordinal() {
        let request = SimpleRouteRequest::new("floors")
            .unwrap()
            .with_start(Location::new((0.0, 0.0), 0))
            .with_end(Location::new((10.0, 0.0), 0));
        let route = Route::new(request.into());
        assert!(route.involves_ordinal(0));
        assert!(!route.involves_ordinal(2));

        let mut upstairs = segment(0, 5.0);
        upstairs.steps.push(Step::new(vec![MapPoint::new(5.0, 0.0)], Some(2)));
        route.begin_calculation().unwrap();
        route.finish(1, Ok(vec![upstairs])).unwrap();
        assert!(route.involves_ordinal(2));
        assert!(!route.involves_ordinal(1));
    }

    #[test]
    fn test_navigation_index_change_detection() {
        let route = route();
        assert!(!route.set_navigation_index(1));
        assert!(route.set_navigation_index(0));
        assert_eq!(route.navigation_index(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_aborts_task() {
        let route = route();
        let t = route.begin_calculation().unwrap();
        let handle = tokio::spawn(std::future::pending::<()>());
        route.attach_task(t.generation, handle.abort_handle());

        route.invalidate().unwrap();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_attach_stale_task_aborts_it() {
        let route = route();
        route.begin_calculation().unwrap();
        route.invalidate().unwrap();
        route.begin_calculation().unwrap();

        let handle = tokio::spawn(std::future::pending::<()>());
        route.attach_task(1, handle.abort_handle());
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<RouteState>>,
    }

    impl RouteDelegate for Recorder {
        fn route_did_change_state(&self, route: &Route) {
            self.seen.lock().push(route.state());
        }
    }

    #[test]
    fn test_delegate_is_weak() {
        let route = route();
        let recorder = Arc::new(Recorder::default());
        route.set_delegate(&recorder);

        route
            .delegate()
            .unwrap()
            .route_did_change_state(&route);
        assert_eq!(recorder.seen.lock().as_slice(), &[RouteState::Idle]);

        drop(recorder);
        assert!(route.delegate().is_none());
    }
}
