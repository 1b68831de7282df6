//! Configuration for the route manager

use concourse_core::SegmentStyles;
use serde::{Deserialize, Serialize};

/// Configuration for a [`RouteManager`](crate::RouteManager)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Route event broadcast channel capacity
    pub event_channel_capacity: usize,
    /// Styles given to newly calculated segments
    pub styles: SegmentStyles,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: 1024,
            styles: SegmentStyles::default(),
        }
    }
}

impl RoutingConfig {
    /// Set the event channel capacity
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Set the segment styles
    pub fn with_styles(mut self, styles: SegmentStyles) -> Self {
        self.styles = styles;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concourse_core::{Color, LineStyle};

    #[test]
    fn test_defaults() {
        let config = RoutingConfig::default();
        assert_eq!(config.event_channel_capacity, 1024);
        assert_eq!(config.styles, SegmentStyles::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RoutingConfig =
            serde_json::from_str(r#"{ "event_channel_capacity": 16 }"#).unwrap();
        assert_eq!(config.event_channel_capacity, 16);
        assert_eq!(config.styles, SegmentStyles::default());
    }

    #[test]
    fn test_builders() {
        let styles = SegmentStyles {
            indoor: LineStyle::stroke(Color::rgb(1.0, 0.0, 0.0), 2.0),
            ..SegmentStyles::default()
        };
        let config = RoutingConfig::default()
            .with_event_channel_capacity(8)
            .with_styles(styles.clone());
        assert_eq!(config.event_channel_capacity, 8);
        assert_eq!(config.styles, styles);
    }
}
