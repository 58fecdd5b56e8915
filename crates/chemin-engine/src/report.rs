//! Structured run reporting.
//!
//! Data-quality conditions (malformed geometry, dangling waypoint
//! hosts, disconnected islands, adjacency violations) are facts about
//! the input, not failures; they accumulate here and ship with the
//! result. Only storage errors, cancellation, and deadline expiry are
//! fatal, and those live in [`crate::job::JobError`].

use serde::{Deserialize, Serialize};

use crate::types::SegmentId;

/// Everything a run has to say about its input and output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub segments_loaded: usize,
    pub waypoints_loaded: usize,
    /// Segments excluded because no geometry shape was usable.
    pub malformed_geometry: Vec<SegmentId>,
    /// Waypoint hosts absent from the road network for any other reason
    /// (dangling references).
    pub unknown_hosts: Vec<SegmentId>,
    /// Confirmed adjacencies in the road network.
    pub adjacency_edges: usize,
    /// Distinct waypoint hosts that made it into the reduced graph.
    pub waypoint_vertices: usize,
    /// Waypoint pairs with no finite path between them.
    pub no_path_pairs: usize,
    /// Waypoint hosts the tour could not reach.
    pub disconnected: Vec<SegmentId>,
    /// Positions of non-adjacent consecutive pairs in the final route.
    pub adjacency_violations: Vec<usize>,
}

impl RunReport {
    /// Count of conditions worth surfacing to an operator.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.malformed_geometry.len()
            + self.unknown_hosts.len()
            + self.disconnected.len()
            + self.adjacency_violations.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warning_count() == 0
    }
}

/// Progress notifications emitted while a job runs. The engine has no
/// logging of its own; callers route these wherever they want.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobEvent {
    Loaded {
        segments: usize,
        waypoints: usize,
    },
    NetworkBuilt {
        vertices: usize,
        edges: usize,
        excluded: usize,
    },
    /// One source of the pairwise shortest-path phase finished.
    PathsComputed {
        completed_sources: usize,
        total_sources: usize,
    },
    TourBuilt {
        route_len: usize,
        unreached: usize,
    },
    Validated {
        violations: usize,
    },
    FlagsWritten {
        marked: usize,
    },
}
