//! Visit order planning for multi-stop requests
//!
//! The planner is a greedy nearest-neighbour heuristic constrained by
//! priority bands:
//!
//! 1. Take the highest priority among the remaining destinations
//! 2. Within that priority pick the destination nearest to the current waypoint
//!    (ties keep insertion order)
//! 3. Visit it, make it the current waypoint, repeat
//!
//! Priority order is always respected exactly; total path length is not
//! minimised.

use concourse_core::Location;

/// A destination whose location has been resolved for calculation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDestination {
    pub location: Location,
    pub identifier: Option<String>,
    pub priority: i64,
}

impl ResolvedDestination {
    pub fn new(location: Location, identifier: Option<String>, priority: i64) -> Self {
        Self {
            location,
            identifier,
            priority,
        }
    }
}

/// Compute the visit order as indices into `destinations`
pub fn plan_visit_order(start: &Location, destinations: &[ResolvedDestination]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..destinations.len()).collect();
    let mut order = Vec::with_capacity(destinations.len());
    let mut current = start;

    while let Some(top_priority) = remaining.iter().map(|&i| destinations[i].priority).max() {
        let mut best: Option<(usize, f64)> = None;

        for (slot, &i) in remaining.iter().enumerate() {
            if destinations[i].priority != top_priority {
                continue;
            }
            let distance = current.distance_to(&destinations[i].location);
            let better = match best {
                None => true,
                Some((_, best_distance)) => {
                    distance < best_distance || (best_distance.is_nan() && !distance.is_nan())
                }
            };
            if better {
                best = Some((slot, distance));
            }
        }

        // top_priority came from `remaining`, so a candidate always exists
        let Some((slot, _)) = best else { break };
        let chosen = remaining.remove(slot);
        order.push(chosen);
        current = &destinations[chosen].location;
    }

    order
}

/// Reorder destinations into visit order
pub fn order_destinations(
    start: &Location,
    destinations: Vec<ResolvedDestination>,
) -> Vec<ResolvedDestination> {
    let order = plan_visit_order(start, &destinations);
    let mut slots: Vec<Option<ResolvedDestination>> = destinations.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}
