//! Inside/outside venue classification
//!
//! The default hint comes from a [`VenueMembership`] test (normally the
//! venue polygon). An optional [`VenueHintOverride`] may force the opposite
//! answer per point.

use std::sync::Arc;

use concourse_core::{MapPoint, VenueHintOverride, VenueMembership};
use tracing::trace;

/// Decides whether waypoints are inside the venue
#[derive(Clone)]
pub struct VenueClassifier {
    membership: Arc<dyn VenueMembership>,
    hint_override: Option<Arc<dyn VenueHintOverride>>,
}

impl VenueClassifier {
    pub fn new(membership: Arc<dyn VenueMembership>) -> Self {
        Self {
            membership,
            hint_override: None,
        }
    }

    /// Install an override consulted after the default test
    pub fn with_override(mut self, hint_override: Arc<dyn VenueHintOverride>) -> Self {
        self.hint_override = Some(hint_override);
        self
    }

    pub fn is_inside(&self, point: MapPoint, is_destination: bool) -> bool {
        let hint = self.membership.is_inside_venue(point);
        match &self.hint_override {
            Some(hint_override) => {
                let decided = hint_override.classify(point, is_destination, hint);
                if decided != hint {
                    trace!(x = point.x, y = point.y, hint, decided, "Venue hint overridden");
                }
                decided
            }
            None => hint,
        }
    }
}

impl std::fmt::Debug for VenueClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueClassifier")
            .field("has_override", &self.hint_override.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concourse_core::VenueBoundary;

    fn terminal() -> Arc<VenueBoundary> {
        Arc::new(VenueBoundary::rectangle(
            MapPoint::new(0.0, 0.0),
            MapPoint::new(100.0, 100.0),
        ))
    }

    #[test]
    fn test_default_hint() {
        let classifier = VenueClassifier::new(terminal());
        assert!(classifier.is_inside(MapPoint::new(50.0, 50.0), false));
        assert!(!classifier.is_inside(MapPoint::new(150.0, 50.0), true));
    }

    #[test]
    fn test_override_forces_opposite() {
        // Treat the parking lot east of the terminal as inside, destinations only
        let parking = |p: MapPoint, is_destination: bool, hint: bool| {
            hint || (is_destination && p.x > 100.0 && p.x < 120.0)
        };
        let classifier = VenueClassifier::new(terminal()).with_override(Arc::new(parking));

        assert!(classifier.is_inside(MapPoint::new(110.0, 10.0), true));
        assert!(!classifier.is_inside(MapPoint::new(110.0, 10.0), false));
        assert!(classifier.is_inside(MapPoint::new(10.0, 10.0), false));
    }

    #[test]
    fn test_override_can_exclude() {
        let never = |_: MapPoint, _: bool, _: bool| false;
        let classifier = VenueClassifier::new(terminal()).with_override(Arc::new(never));
        assert!(!classifier.is_inside(MapPoint::new(50.0, 50.0), false));
    }
}
