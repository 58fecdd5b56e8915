//! End-to-end scenarios over the whole engine: storage reads, route
//! planning, flag write-back, and failure behavior.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chemin_engine::{
    Coord, Geometry, JobConfig, JobError, OptimalRouteJob, RouteStore, RunControl, Segment,
    SegmentId, StoreError, Waypoint, plan_route,
};

// ---------------------------------------------------------------------------
// Stub store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StubStore {
    segments: Vec<Segment>,
    waypoints: Vec<Waypoint>,
    flags_reset: usize,
    marked: Vec<Vec<SegmentId>>,
    fail_on_mark: bool,
}

impl StubStore {
    fn new(segments: Vec<Segment>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            segments,
            waypoints,
            ..Self::default()
        }
    }
}

impl RouteStore for StubStore {
    fn load_segments(&mut self) -> Result<Vec<Segment>, StoreError> {
        Ok(self.segments.clone())
    }

    fn load_waypoints(&mut self) -> Result<Vec<Waypoint>, StoreError> {
        Ok(self.waypoints.clone())
    }

    fn reset_route_flags(&mut self) -> Result<(), StoreError> {
        self.flags_reset += 1;
        Ok(())
    }

    fn mark_on_route(&mut self, ids: &[SegmentId]) -> Result<(), StoreError> {
        if self.fail_on_mark {
            return Err(StoreError::Backend("mark rejected".into()));
        }
        self.marked.push(ids.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn seg(id: &str, pairs: &[(f64, f64)]) -> Segment {
    Segment::new(
        id,
        Geometry::Flat(pairs.iter().map(|&(lon, lat)| Coord::new(lon, lat)).collect()),
    )
}

fn ids(names: &[&str]) -> Vec<SegmentId> {
    names.iter().map(|&n| SegmentId::from(n)).collect()
}

/// Five segments along one street, endpoints shared pairwise.
fn street() -> Vec<Segment> {
    vec![
        seg("r1", &[(2.500, 48.800), (2.501, 48.800)]),
        seg("r2", &[(2.501, 48.800), (2.502, 48.800)]),
        seg("r3", &[(2.502, 48.800), (2.503, 48.800)]),
        seg("r4", &[(2.503, 48.800), (2.504, 48.800)]),
        seg("r5", &[(2.504, 48.800), (2.505, 48.800)]),
    ]
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn waypoints_on_a_street_produce_a_connected_route() {
    let waypoints = vec![
        Waypoint::new("w1", "r1"),
        Waypoint::new("w2", "r3"),
        Waypoint::new("w3", "r5"),
    ];
    let mut store = StubStore::new(street(), waypoints);
    let job = OptimalRouteJob::new(JobConfig::default());
    let outcome = job.run(&mut store).unwrap();

    // Greedy walk from r1: nearest host r3 (bridging r2), then r5 (bridging r4).
    assert_eq!(outcome.route, ids(&["r1", "r2", "r3", "r4", "r5"]));
    assert!(outcome.report.is_clean());
    assert!(outcome.report.adjacency_violations.is_empty());
    assert_eq!(outcome.report.waypoint_vertices, 3);
    assert_eq!(store.flags_reset, 1);
    assert_eq!(store.marked, vec![ids(&["r1", "r2", "r3", "r4", "r5"])]);
}

#[test]
fn disjoint_islands_degrade_to_a_partial_route() {
    let mut segments = street();
    segments.push(seg("far1", &[(9.000, 40.000), (9.001, 40.000)]));
    segments.push(seg("far2", &[(9.001, 40.000), (9.002, 40.000)]));
    let waypoints = vec![
        Waypoint::new("w1", "r1"),
        Waypoint::new("w2", "r3"),
        Waypoint::new("w3", "far1"),
    ];
    let mut store = StubStore::new(segments, waypoints);
    let outcome = OptimalRouteJob::new(JobConfig::default())
        .run(&mut store)
        .unwrap();

    assert_eq!(outcome.route, ids(&["r1", "r2", "r3"]));
    assert_eq!(outcome.report.disconnected, ids(&["far1"]));
    assert_eq!(outcome.report.no_path_pairs, 2);
    assert!(outcome.report.adjacency_violations.is_empty());
    // The partial route is still written.
    assert_eq!(store.marked.len(), 1);
}

#[test]
fn malformed_host_is_reported_and_skipped() {
    let mut segments = street();
    segments.push(Segment::new("broken", Geometry::Unknown));
    let waypoints = vec![
        Waypoint::new("w1", "r1"),
        Waypoint::new("w2", "broken"),
        Waypoint::new("w3", "nowhere"),
    ];
    let mut store = StubStore::new(segments, waypoints);
    let outcome = OptimalRouteJob::new(JobConfig::default())
        .run(&mut store)
        .unwrap();

    assert_eq!(outcome.route, ids(&["r1"]));
    assert_eq!(outcome.report.malformed_geometry, ids(&["broken"]));
    assert_eq!(outcome.report.unknown_hosts, ids(&["nowhere"]));
    assert_eq!(outcome.report.waypoint_vertices, 1);
}

#[test]
fn rerun_on_the_same_data_yields_the_same_route() {
    let waypoints = vec![
        Waypoint::new("w1", "r2"),
        Waypoint::new("w2", "r5"),
        Waypoint::new("w3", "r1"),
    ];
    let config = JobConfig::default();
    let first = plan_route(
        &street(),
        &waypoints,
        &config,
        &RunControl::unbounded(),
        |_| {},
    )
    .unwrap();
    let second = plan_route(
        &street(),
        &waypoints,
        &config,
        &RunControl::unbounded(),
        |_| {},
    )
    .unwrap();
    assert_eq!(first.route, second.route);
    assert_eq!(first.report, second.report);
}

#[test]
fn dry_run_never_writes() {
    let waypoints = vec![Waypoint::new("w1", "r1"), Waypoint::new("w2", "r2")];
    let mut store = StubStore::new(street(), waypoints);
    let config = JobConfig {
        dry_run: true,
        ..JobConfig::default()
    };
    let outcome = OptimalRouteJob::new(config).run(&mut store).unwrap();
    assert!(!outcome.route.is_empty());
    assert_eq!(store.flags_reset, 0);
    assert!(store.marked.is_empty());
}

#[test]
fn storage_failure_during_mark_is_fatal() {
    let waypoints = vec![Waypoint::new("w1", "r1"), Waypoint::new("w2", "r2")];
    let mut store = StubStore::new(street(), waypoints);
    store.fail_on_mark = true;
    let err = OptimalRouteJob::new(JobConfig::default()).run(&mut store);
    assert!(matches!(err, Err(JobError::Store(_))));
}

#[test]
fn cancelled_job_leaves_storage_untouched() {
    let waypoints = vec![Waypoint::new("w1", "r1")];
    let mut store = StubStore::new(street(), waypoints);
    let job = OptimalRouteJob::new(JobConfig::default());
    job.cancel_token().cancel();
    let err = job.run(&mut store);
    assert!(matches!(err, Err(JobError::Cancelled)));
    assert_eq!(store.flags_reset, 0);
    assert!(store.marked.is_empty());
}

#[test]
fn flag_write_deduplicates_a_doubling_back_route() {
    // Three dead-end branches hang off one hub segment; visiting all
    // three forces the route back through the hub between branches.
    let segments = vec![
        seg("hub", &[(2.5010, 48.800), (2.5015, 48.800), (2.5020, 48.800)]),
        seg("b1", &[(2.5010, 48.800), (2.5010, 48.801)]),
        seg("b2", &[(2.5015, 48.800), (2.5015, 48.799)]),
        seg("b3", &[(2.5020, 48.800), (2.5020, 48.801)]),
    ];
    let waypoints = vec![
        Waypoint::new("w1", "b1"),
        Waypoint::new("w2", "b2"),
        Waypoint::new("w3", "b3"),
    ];
    let mut store = StubStore::new(segments, waypoints);
    let outcome = OptimalRouteJob::new(JobConfig::default())
        .run(&mut store)
        .unwrap();

    assert_eq!(outcome.route, ids(&["b1", "hub", "b2", "hub", "b3"]));
    assert!(outcome.report.adjacency_violations.is_empty());

    let written = &store.marked[0];
    assert!(written.len() < outcome.route.len());
    assert_eq!(written.to_vec(), ids(&["b1", "hub", "b2", "b3"]));
}

#[test]
fn progress_events_arrive_in_phase_order() {
    use chemin_engine::JobEvent;

    let waypoints = vec![Waypoint::new("w1", "r1"), Waypoint::new("w2", "r3")];
    let mut store = StubStore::new(street(), waypoints);
    let mut events = Vec::new();
    OptimalRouteJob::new(JobConfig::default())
        .run_with(&mut store, |e| events.push(e))
        .unwrap();

    assert!(matches!(events.first(), Some(JobEvent::Loaded { .. })));
    assert!(matches!(events.last(), Some(JobEvent::FlagsWritten { .. })));
    let network_pos = events
        .iter()
        .position(|e| matches!(e, JobEvent::NetworkBuilt { .. }))
        .unwrap();
    let tour_pos = events
        .iter()
        .position(|e| matches!(e, JobEvent::TourBuilt { .. }))
        .unwrap();
    let validated_pos = events
        .iter()
        .position(|e| matches!(e, JobEvent::Validated { .. }))
        .unwrap();
    assert!(network_pos < tour_pos && tour_pos < validated_pos);
}
