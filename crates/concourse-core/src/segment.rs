//! Calculated route segments
//!
//! A [`RouteSegment`] is one leg of a route between two consecutive
//! waypoints. It is made of [`Step`]s, each lying on a single floor, and
//! carries the line styles used to draw its indoor and outdoor parts.

use serde::{Deserialize, Serialize};

use crate::geometry::{MapPoint, MapRect};
use crate::location::Location;

/// Sentinel stored in `total_time`/`total_distance` of a failed segment
pub const FAILED_SENTINEL: f64 = -1.0;

/// One part of a segment, on one floor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    /// Written instructions for following this step
    pub instructions: Option<String>,
    /// Step geometry
    pub geometry: Vec<MapPoint>,
    /// Floor ordinal
    pub ordinal: Option<i32>,
}

impl Step {
    pub fn new(geometry: Vec<MapPoint>, ordinal: Option<i32>) -> Self {
        Self {
            instructions: None,
            geometry,
            ordinal,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Bounding rectangle of the geometry, `None` when empty
    pub fn visible_rect(&self) -> Option<MapRect> {
        MapRect::bounding(&self.geometry)
    }

    /// Length of the polyline, in meters
    pub fn length(&self) -> f64 {
        self.geometry
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }
}

/// RGBA color, each channel in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

/// Dash pattern of a stroked line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LineDash {
    #[default]
    Solid,
    /// Alternating painted/unpainted lengths
    Pattern(Vec<f64>),
}

/// How a line is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub stroke_color: Option<Color>,
    pub stroke_width: f64,
    pub stroke_dash: LineDash,
    pub fill_color: Option<Color>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            stroke_color: None,
            stroke_width: 1.0,
            stroke_dash: LineDash::Solid,
            fill_color: None,
        }
    }
}

impl LineStyle {
    /// Solid stroke of the given color and width
    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            stroke_color: Some(color),
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn with_dash(mut self, dash: LineDash) -> Self {
        self.stroke_dash = dash;
        self
    }

    /// Whether drawing with this style would paint anything
    pub fn is_drawable(&self) -> bool {
        let stroked = self.stroke_color.is_some_and(|c| c.a > 0.0) && self.stroke_width > 0.0;
        let filled = self.fill_color.is_some_and(|c| c.a > 0.0);
        stroked || filled
    }
}

/// Line styles of a segment's indoor and outdoor sub-paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStyles {
    pub indoor: LineStyle,
    pub outdoor: LineStyle,
}

impl Default for SegmentStyles {
    fn default() -> Self {
        Self {
            indoor: LineStyle::stroke(Color::rgb(0.0, 0.48, 1.0), 4.0),
            outdoor: LineStyle::stroke(Color::rgb(0.0, 0.48, 1.0), 4.0)
                .with_dash(LineDash::Pattern(vec![6.0, 4.0])),
        }
    }
}

/// One calculated leg of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Steps in travel order
    pub steps: Vec<Step>,
    /// Appearance of the indoor and outdoor parts
    pub styles: SegmentStyles,
    /// Approximate travel time in seconds; negative on error
    pub total_time: f64,
    /// Travel distance in meters; negative on error
    pub total_distance: f64,
    pub start_location: Location,
    pub end_location: Location,
    /// Tag of the destination this segment reaches
    pub identifier: Option<String>,
    /// Position of this segment in its route
    pub index: usize,
}

impl RouteSegment {
    /// A segment whose sub-calculation failed
    pub fn failed(
        index: usize,
        start_location: Location,
        end_location: Location,
        identifier: Option<String>,
        styles: SegmentStyles,
    ) -> Self {
        Self {
            steps: Vec::new(),
            styles,
            total_time: FAILED_SENTINEL,
            total_distance: FAILED_SENTINEL,
            start_location,
            end_location,
            identifier,
            index,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.total_time < 0.0 || self.total_distance < 0.0
    }

    /// Bounding rectangle over all step geometry
    pub fn visible_rect(&self) -> Option<MapRect> {
        self.steps
            .iter()
            .filter_map(Step::visible_rect)
            .reduce(|a, b| a.union(&b))
    }

    /// Floors this segment passes through, in travel order, without repeats
    pub fn ordinals(&self) -> Vec<i32> {
        let mut ordinals: Vec<i32> = Vec::new();
        for ordinal in self.steps.iter().filter_map(|s| s.ordinal) {
            if ordinals.last() != Some(&ordinal) {
                ordinals.push(ordinal);
            }
        }
        ordinals
    }
}
