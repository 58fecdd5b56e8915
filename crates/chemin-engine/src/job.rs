//! The batch job driver: load, build, tour, validate, write back.
//!
//! A job runs to completion once per trigger. The long phases check a
//! shared control at coarse granularity (per candidate batch, per
//! Dijkstra source), so cancellation and deadlines take effect within
//! one unit of work, never mid-invariant. Storage writes happen only
//! after the whole computation succeeds.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::adjacency::{AdjacencyOracle, DEFAULT_MATCH_PRECISION};
use crate::gateway::{RouteStore, StoreError};
use crate::network::RoadNetwork;
use crate::report::{JobEvent, RunReport};
use crate::spatial::DEFAULT_CELL_PRECISION;
use crate::tour::WaypointGraph;
use crate::types::{Segment, SegmentId, Waypoint};
use crate::validate;

// ---------------------------------------------------------------------------
// Errors and control
// ---------------------------------------------------------------------------

/// Fatal job failures. Data-quality findings are never errors; they
/// travel in [`RunReport`].
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Storage failure. When raised during the read phase, no write was
    /// issued; the previous run's flags are intact.
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("computation cancelled")]
    Cancelled,
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Cooperative cancellation handle, cloneable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Deadline and cancellation state threaded through the long phases.
#[derive(Debug, Clone)]
pub struct RunControl {
    cancel: CancelToken,
    deadline: Option<Duration>,
    started: Instant,
}

impl RunControl {
    #[must_use]
    pub fn new(deadline: Option<Duration>, cancel: CancelToken) -> Self {
        Self {
            cancel,
            deadline,
            started: Instant::now(),
        }
    }

    /// No deadline, fresh token. The usual choice for direct library use.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None, CancelToken::new())
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Cancellation beats deadline expiry when both hold.
    ///
    /// # Errors
    ///
    /// [`JobError::Cancelled`] or [`JobError::DeadlineExceeded`].
    pub fn check(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        if let Some(limit) = self.deadline
            && self.started.elapsed() > limit
        {
            return Err(JobError::DeadlineExceeded(limit));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Configuration and outcome
// ---------------------------------------------------------------------------

/// Engine tuning knobs. The defaults match production data; tighter
/// precisions are mostly useful in tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Decimal digits for spatial grid cells.
    pub cell_precision: u8,
    /// Decimal digits for exact coordinate matching.
    pub match_precision: u8,
    /// Wall-clock budget for the whole run; `None` is unbounded.
    pub deadline: Option<Duration>,
    /// Compute everything but skip both storage writes.
    pub dry_run: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            cell_precision: DEFAULT_CELL_PRECISION,
            match_precision: DEFAULT_MATCH_PRECISION,
            deadline: None,
            dry_run: false,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Waypoint hosts interleaved with bridging intermediates. May
    /// repeat a segment where the tour doubles back.
    pub route: Vec<SegmentId>,
    pub report: RunReport,
}

// ---------------------------------------------------------------------------
// The job
// ---------------------------------------------------------------------------

/// One-shot optimal-route computation over a [`RouteStore`].
#[derive(Debug, Default)]
pub struct OptimalRouteJob {
    config: JobConfig,
    cancel: CancelToken,
}

impl OptimalRouteJob {
    #[must_use]
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Handle for cancelling this job from another thread.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the whole job, discarding progress events.
    ///
    /// # Errors
    ///
    /// See [`Self::run_with`].
    pub fn run(&self, store: &mut dyn RouteStore) -> Result<RunOutcome, JobError> {
        self.run_with(store, |_| {})
    }

    /// Run the whole job: read both collections, plan the route, then
    /// reset and re-mark the on-route flags (skipped on dry runs).
    ///
    /// # Errors
    ///
    /// Storage failure, cancellation, or deadline expiry. A failure
    /// anywhere before the write phase leaves storage untouched.
    pub fn run_with(
        &self,
        store: &mut dyn RouteStore,
        mut on_event: impl FnMut(JobEvent),
    ) -> Result<RunOutcome, JobError> {
        let control = RunControl::new(self.config.deadline, self.cancel.clone());

        let segments = store.load_segments()?;
        let waypoints = store.load_waypoints()?;
        on_event(JobEvent::Loaded {
            segments: segments.len(),
            waypoints: waypoints.len(),
        });

        let outcome = plan_route(&segments, &waypoints, &self.config, &control, &mut on_event)?;

        if !self.config.dry_run {
            control.check()?;
            store.reset_route_flags()?;
            let marked = dedup_preserving_order(&outcome.route);
            store.mark_on_route(&marked)?;
            on_event(JobEvent::FlagsWritten {
                marked: marked.len(),
            });
        }

        Ok(outcome)
    }
}

/// The pure planning core: everything between the storage reads and
/// writes. Exposed separately so callers with their own data in hand
/// can skip the gateway entirely.
///
/// # Errors
///
/// Only cancellation or deadline expiry, via `control`.
pub fn plan_route(
    segments: &[Segment],
    waypoints: &[Waypoint],
    config: &JobConfig,
    control: &RunControl,
    mut on_event: impl FnMut(JobEvent),
) -> Result<RunOutcome, JobError> {
    let built = RoadNetwork::build(
        segments,
        config.cell_precision,
        config.match_precision,
        control,
    )?;
    let adjacency_edges = built.network.edge_count();
    on_event(JobEvent::NetworkBuilt {
        vertices: built.network.node_count(),
        edges: adjacency_edges,
        excluded: built.excluded.len(),
    });

    let graph = WaypointGraph::build(&built.network, waypoints, control, |done, total| {
        on_event(JobEvent::PathsComputed {
            completed_sources: done,
            total_sources: total,
        });
    })?;
    let tour = graph.find_optimal_route();
    on_event(JobEvent::TourBuilt {
        route_len: tour.route.len(),
        unreached: tour.unreached.len(),
    });

    let oracle = AdjacencyOracle::new(config.match_precision);
    let check = validate::verify(&tour.route, segments, &oracle);
    on_event(JobEvent::Validated {
        violations: check.count(),
    });

    let malformed = built.excluded;
    let unknown_hosts: Vec<SegmentId> = graph
        .skipped_hosts()
        .iter()
        .filter(|id| !malformed.contains(id))
        .cloned()
        .collect();
    let report = RunReport {
        segments_loaded: segments.len(),
        waypoints_loaded: waypoints.len(),
        malformed_geometry: malformed,
        unknown_hosts,
        adjacency_edges,
        waypoint_vertices: graph.vertex_count(),
        no_path_pairs: graph.no_path_pairs(),
        disconnected: tour.unreached,
        adjacency_violations: check.violations,
    };

    Ok(RunOutcome {
        route: tour.route,
        report,
    })
}

/// First occurrence of each id, in route order. The flag write cares
/// about membership; the route itself keeps its repeats.
fn dedup_preserving_order(route: &[SegmentId]) -> Vec<SegmentId> {
    let mut seen: HashSet<&SegmentId> = HashSet::new();
    route
        .iter()
        .filter(|id| seen.insert(id))
        .cloned()
        .collect()
}
