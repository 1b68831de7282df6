//! Segment building across indoor and outdoor domains
//!
//! Each leg between two consecutive waypoints becomes one [`RouteSegment`].
//! Which services are asked depends on where the endpoints are:
//!
//! | from    | to      | services                                           |
//! |---------|---------|----------------------------------------------------|
//! | inside  | inside  | indoor `from → to`                                 |
//! | outside | inside  | outdoor `from → to` gives crossing C, indoor `C → to` |
//! | inside  | outside | outdoor `from → to` gives crossing C, indoor `from → C` |
//! | outside | outside | outdoor `from → to`                                |
//!
//! Time and distance are the sums of the contributing calculations. Any
//! failing sub-calculation fails the whole segment.

use std::sync::Arc;

use concourse_core::{
    IndoorNavigator, Location, OutdoorNavigator, RouteError, RouteSegment, SegmentStyles, Step,
    TransportType,
};
use tracing::{debug, trace};

use crate::classifier::VenueClassifier;
use crate::error::SegmentFailure;

/// Which domains a leg crosses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    /// Both endpoints are the same place; nothing to compute
    Trivial,
    /// Both endpoints inside the venue
    Indoor,
    /// Arriving at the venue from outside
    Inbound,
    /// Leaving the venue
    Outbound,
    /// Both endpoints outside the venue
    Outdoor,
}

/// Input for one leg
#[derive(Debug, Clone, Copy)]
pub struct Leg<'a> {
    /// Index of the resulting segment in its route
    pub index: usize,
    pub from: &'a Location,
    pub to: &'a Location,
    /// Tag of the destination reached by this leg
    pub identifier: Option<&'a str>,
    pub navigation_index: u32,
    pub transport_type: TransportType,
}

/// Merged output of the services asked for one leg
struct LegPath {
    steps: Vec<Step>,
    distance: f64,
    time: f64,
}

/// Builds route segments from navigation service results
#[derive(Clone)]
pub struct SegmentBuilder {
    indoor: Arc<dyn IndoorNavigator>,
    outdoor: Arc<dyn OutdoorNavigator>,
    classifier: VenueClassifier,
    styles: SegmentStyles,
}

impl SegmentBuilder {
    pub fn new(
        indoor: Arc<dyn IndoorNavigator>,
        outdoor: Arc<dyn OutdoorNavigator>,
        classifier: VenueClassifier,
    ) -> Self {
        Self {
            indoor,
            outdoor,
            classifier,
            styles: SegmentStyles::default(),
        }
    }

    /// Styles given to every built segment
    pub fn with_styles(mut self, styles: SegmentStyles) -> Self {
        self.styles = styles;
        self
    }

    pub fn indoor(&self) -> &Arc<dyn IndoorNavigator> {
        &self.indoor
    }

    pub fn classifier(&self) -> &VenueClassifier {
        &self.classifier
    }

    /// Decide which services a leg needs
    pub fn classify_leg(&self, from: &Location, to: &Location) -> LegKind {
        if from.same_place(to) {
            return LegKind::Trivial;
        }
        let from_inside = self.classifier.is_inside(from.position(), false);
        let to_inside = self.classifier.is_inside(to.position(), true);
        match (from_inside, to_inside) {
            (true, true) => LegKind::Indoor,
            (false, true) => LegKind::Inbound,
            (true, false) => LegKind::Outbound,
            (false, false) => LegKind::Outdoor,
        }
    }

    /// Calculate one segment
    pub async fn build_segment(&self, leg: Leg<'_>) -> Result<RouteSegment, SegmentFailure> {
        let kind = self.classify_leg(leg.from, leg.to);
        trace!(index = leg.index, from = %leg.from, to = %leg.to, ?kind, "Building segment");

        match self.compute(kind, &leg).await {
            Ok(path) => {
                debug!(
                    index = leg.index,
                    ?kind,
                    steps = path.steps.len(),
                    distance = path.distance,
                    time = path.time,
                    "Segment built"
                );
                Ok(RouteSegment {
                    steps: path.steps,
                    styles: self.styles.clone(),
                    total_time: path.time,
                    total_distance: path.distance,
                    start_location: leg.from.clone(),
                    end_location: leg.to.clone(),
                    identifier: leg.identifier.map(str::to_string),
                    index: leg.index,
                })
            }
            Err(error) => {
                debug!(index = leg.index, ?kind, %error, "Segment failed");
                Err(SegmentFailure {
                    segment: RouteSegment::failed(
                        leg.index,
                        leg.from.clone(),
                        leg.to.clone(),
                        leg.identifier.map(str::to_string),
                        self.styles.clone(),
                    ),
                    error,
                })
            }
        }
    }

    async fn compute(&self, kind: LegKind, leg: &Leg<'_>) -> Result<LegPath, RouteError> {
        match kind {
            LegKind::Trivial => Ok(LegPath {
                steps: Vec::new(),
                distance: 0.0,
                time: 0.0,
            }),
            LegKind::Indoor => {
                let indoor = self
                    .indoor
                    .compute_indoor_path(leg.from, leg.to, leg.navigation_index)
                    .await?;
                Ok(LegPath {
                    steps: indoor.steps,
                    distance: indoor.distance,
                    time: indoor.time,
                })
            }
            LegKind::Inbound => {
                let outdoor = self
                    .outdoor
                    .compute_outdoor_path(leg.from, leg.to, leg.transport_type)
                    .await?;
                let indoor = self
                    .indoor
                    .compute_indoor_path(&outdoor.venue_crossing_point, leg.to, leg.navigation_index)
                    .await?;
                let mut steps = outdoor.steps;
                steps.extend(indoor.steps);
                Ok(LegPath {
                    steps,
                    distance: outdoor.distance + indoor.distance,
                    time: outdoor.time + indoor.time,
                })
            }
            LegKind::Outbound => {
                let outdoor = self
                    .outdoor
                    .compute_outdoor_path(leg.from, leg.to, leg.transport_type)
                    .await?;
                let indoor = self
                    .indoor
                    .compute_indoor_path(leg.from, &outdoor.venue_crossing_point, leg.navigation_index)
                    .await?;
                let mut steps = indoor.steps;
                steps.extend(outdoor.steps);
                Ok(LegPath {
                    steps,
                    distance: indoor.distance + outdoor.distance,
                    time: indoor.time + outdoor.time,
                })
            }
            LegKind::Outdoor => {
                let outdoor = self
                    .outdoor
                    .compute_outdoor_path(leg.from, leg.to, leg.transport_type)
                    .await?;
                Ok(LegPath {
                    steps: outdoor.steps,
                    distance: outdoor.distance,
                    time: outdoor.time,
                })
            }
        }
    }
}

impl std::fmt::Debug for SegmentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentBuilder")
            .field("classifier", &self.classifier)
            .field("styles", &self.styles)
            .finish()
    }
}
