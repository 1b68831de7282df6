//! Scenario runs against the simulated terminal

use std::time::Duration;

use concourse_core::{RouteErrorCode, RouteState, SimpleRouteRequest};
use concourse_simulation::{Harness, SimOptions, place, scenarios};
use tokio_test::assert_ok;

fn fast() -> SimOptions {
    SimOptions {
        latency: Duration::from_millis(1),
        routes: 30,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_tsp_respects_priorities() {
    let report = assert_ok!(scenarios::run_tsp_scenario(&fast()).await);
    let errands = report.route("errands").unwrap();
    assert_eq!(errands.state, RouteState::Completed);

    let order: Vec<_> = errands
        .segments
        .iter()
        .map(|s| s.identifier.as_deref().unwrap())
        .collect();
    assert_eq!(order, vec!["lounge", "coffee", "pharmacy", "boarding"]);
    assert_eq!(report.overlay.on_map.get("errands"), Some(&4));
}

#[tokio::test]
async fn test_simple_covers_every_leg_kind() {
    let report = assert_ok!(scenarios::run_simple_scenario(&fast()).await);
    assert_eq!(report.routes.len(), 5);
    for route in &report.routes {
        assert_eq!(route.state, RouteState::Completed, "{}", route.identifier);
        assert_eq!(route.segments.len(), 1);
    }

    let stay = report.route("stay").unwrap();
    assert_eq!(stay.total_distance, 0.0);
    assert_eq!(stay.segments[0].steps, 0);

    // Outdoor leg to the curb, then escalators up to the gate
    let arrival = report.route("arrival").unwrap();
    assert_eq!(arrival.segments[0].steps, 3);
    assert!(arrival.total_distance > 120.0 + 150.0);
}

#[tokio::test]
async fn test_mixed_user_move_spares_fixed_routes() {
    let report = assert_ok!(scenarios::run_mixed_scenario(&fast()).await);
    assert!(
        report
            .notes
            .iter()
            .any(|n| n.ends_with("shuttle recalculated false"))
    );
    assert!(report.notes.iter().any(|n| n.contains("unknown profile: failed")));

    let tour = report.route("tour").unwrap();
    assert_eq!(tour.state, RouteState::Completed);
    assert_eq!(tour.navigation_index, 0);
    assert_eq!(report.route("shuttle").unwrap().state, RouteState::Completed);
}

#[tokio::test]
async fn test_churn_leaves_only_live_routes() {
    let report = assert_ok!(scenarios::run_churn_scenario(&fast()).await);
    assert_eq!(report.routes.len(), 20);
    assert!(report.routes.iter().all(|r| r.state == RouteState::Completed));
    assert_eq!(report.notes, vec!["30 created, 10 removed, 20 completed"]);
}

#[tokio::test]
async fn test_failure_recovers() {
    let report = assert_ok!(scenarios::run_failure_scenario(&fast()).await);
    assert!(report.route("to-gate").is_none());
    assert_eq!(report.route("from-parking").unwrap().state, RouteState::Completed);
    assert!(report.notes.iter().any(|n| n.contains("NoUserLocation")));
}

#[tokio::test]
async fn test_harness_narrates_recovery() {
    let mut harness = Harness::new(&fast());
    let route = harness
        .route(
            SimpleRouteRequest::new("to-gate")
                .unwrap()
                .with_end(place("gate-a1").unwrap()),
        )
        .unwrap();
    assert_eq!(harness.settle(&route).await.unwrap(), RouteState::Failed);
    assert_eq!(route.error().unwrap().code(), RouteErrorCode::NoUserLocation);

    harness.venue.user.walk_to(place("check-in"));
    harness.manager.user_location_did_change();
    assert_eq!(harness.settle(&route).await.unwrap(), RouteState::Completed);

    harness.manager.remove_route(&route);
    assert_eq!(
        harness.delegate.states_of("to-gate"),
        vec![
            RouteState::Calculating,
            RouteState::Failed,
            RouteState::Idle,
            RouteState::Calculating,
            RouteState::Completed,
            RouteState::Removed,
        ]
    );

    let report = harness.report("narration");
    assert!(report.routes.is_empty());
    assert_eq!(report.events, 6);
    assert_eq!(report.overlay.cleared, 1);
}

#[tokio::test]
async fn test_run_all() {
    let reports = assert_ok!(scenarios::run_all(&fast()).await);
    let names: Vec<_> = reports.iter().map(|r| r.scenario.as_str()).collect();
    assert_eq!(names, vec!["tsp", "simple", "mixed", "churn", "failure"]);
    assert!(serde_json::to_string(&reports).is_ok());
}
