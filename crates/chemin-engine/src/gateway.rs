//! Persistence gateway contract.
//!
//! The engine touches storage only through [`RouteStore`]: two bulk
//! reads up front, two bulk writes at the end. No ambient connection
//! state, no per-record round trips. Implementations live in adapter
//! crates; the engine itself performs no I/O.

use crate::types::{Segment, SegmentId, Waypoint};

/// Errors surfaced by a gateway implementation.
///
/// Always fatal to the run: the job aborts and, if the failure happens
/// before the write phase, no flag is touched.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed store document: {0}")]
    Malformed(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Bulk read/write access to road segments and collection waypoints.
pub trait RouteStore {
    /// Every road segment, geometry already normalized.
    ///
    /// # Errors
    ///
    /// Any storage failure; partially readable data is not returned.
    fn load_segments(&mut self) -> Result<Vec<Segment>, StoreError>;

    /// Every collection waypoint with a resolvable host reference.
    ///
    /// # Errors
    ///
    /// Any storage failure; partially readable data is not returned.
    fn load_waypoints(&mut self) -> Result<Vec<Waypoint>, StoreError>;

    /// Clear the on-route flag on every segment. Runs before marking,
    /// so flags from a previous run never survive into the new result.
    ///
    /// # Errors
    ///
    /// Any storage failure.
    fn reset_route_flags(&mut self) -> Result<(), StoreError>;

    /// Set the on-route flag on exactly `ids`, as one batched write.
    ///
    /// # Errors
    ///
    /// Any storage failure.
    fn mark_on_route(&mut self, ids: &[SegmentId]) -> Result<(), StoreError>;
}
