//! Road-network connectivity and optimal collection-route computation.
//!
//! Given road segments (polylines in WGS84) and collection waypoints
//! bound to specific segments, the engine:
//!
//! 1. buckets segment coordinates into a coarse spatial grid
//!    ([`spatial`]),
//! 2. confirms segment adjacency by exact coordinate match
//!    ([`adjacency`]),
//! 3. builds the full adjacency graph and answers shortest-path queries
//!    with Dijkstra over per-segment traversal costs ([`network`]),
//! 4. reduces to a waypoint graph and walks a single connected tour,
//!    nearest neighbor with a two-hop relay fallback ([`tour`]),
//! 5. re-validates the final route ([`validate`]) and writes the
//!    on-route flags back in one batched operation ([`job`]).
//!
//! Storage is reached only through [`gateway::RouteStore`]; the engine
//! performs no I/O and no logging of its own. Data-quality findings
//! accumulate in [`report::RunReport`] instead of failing the run.

pub mod adjacency;
pub mod gateway;
pub mod geometry;
mod heap;
pub mod job;
pub mod network;
pub mod report;
pub mod spatial;
pub mod tour;
pub mod types;
pub mod validate;

pub use adjacency::{AdjacencyOracle, DEFAULT_MATCH_PRECISION};
pub use gateway::{RouteStore, StoreError};
pub use geometry::Geometry;
pub use job::{
    CancelToken, JobConfig, JobError, OptimalRouteJob, RunControl, RunOutcome, plan_route,
};
pub use network::{NetworkBuild, PathFound, RoadNetwork, SingleSource};
pub use report::{JobEvent, RunReport};
pub use spatial::{DEFAULT_CELL_PRECISION, SpatialIndex};
pub use tour::{Tour, WaypointGraph};
pub use types::{Coord, Segment, SegmentId, Waypoint, WaypointId};
pub use validate::{RouteCheck, verify};
