//! In-memory gateway for tests and embedding.
//!
//! Holds segments and waypoints directly and tracks flag state in a
//! map. Failure injection covers each gateway operation, so callers can
//! exercise every abort path of the job without touching a filesystem.

use std::collections::HashMap;

use chemin_engine::gateway::{RouteStore, StoreError};
use chemin_engine::{Segment, SegmentId, Waypoint};

/// Which gateway operation an injected failure should hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    LoadSegments,
    LoadWaypoints,
    ResetFlags,
    MarkOnRoute,
}

/// [`RouteStore`] over plain vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    segments: Vec<Segment>,
    waypoints: Vec<Waypoint>,
    flags: HashMap<SegmentId, bool>,
    fail_at: Option<FailPoint>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(segments: Vec<Segment>, waypoints: Vec<Waypoint>) -> Self {
        let flags = segments.iter().map(|s| (s.id.clone(), false)).collect();
        Self {
            segments,
            waypoints,
            flags,
            fail_at: None,
        }
    }

    /// Make the given operation fail with a backend error.
    #[must_use]
    pub fn fail_at(mut self, point: FailPoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    /// Ids currently flagged on-route, sorted for stable assertions.
    #[must_use]
    pub fn flagged(&self) -> Vec<SegmentId> {
        let mut ids: Vec<SegmentId> = self
            .flags
            .iter()
            .filter(|&(_, &on)| on)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn trip(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.fail_at == Some(point) {
            return Err(StoreError::Backend(format!(
                "injected failure at {point:?}"
            )));
        }
        Ok(())
    }
}

impl RouteStore for MemoryStore {
    fn load_segments(&mut self) -> Result<Vec<Segment>, StoreError> {
        self.trip(FailPoint::LoadSegments)?;
        Ok(self.segments.clone())
    }

    fn load_waypoints(&mut self) -> Result<Vec<Waypoint>, StoreError> {
        self.trip(FailPoint::LoadWaypoints)?;
        Ok(self.waypoints.clone())
    }

    fn reset_route_flags(&mut self) -> Result<(), StoreError> {
        self.trip(FailPoint::ResetFlags)?;
        for on in self.flags.values_mut() {
            *on = false;
        }
        Ok(())
    }

    fn mark_on_route(&mut self, ids: &[SegmentId]) -> Result<(), StoreError> {
        self.trip(FailPoint::MarkOnRoute)?;
        for id in ids {
            if let Some(on) = self.flags.get_mut(id) {
                *on = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chemin_engine::{Coord, Geometry};

    fn seg(id: &str, pairs: &[(f64, f64)]) -> Segment {
        Segment::new(
            id,
            Geometry::Flat(pairs.iter().map(|&(lon, lat)| Coord::new(lon, lat)).collect()),
        )
    }

    fn store() -> MemoryStore {
        MemoryStore::new(
            vec![
                seg("a", &[(2.500, 48.8), (2.501, 48.8)]),
                seg("b", &[(2.501, 48.8), (2.502, 48.8)]),
            ],
            vec![Waypoint::new("w1", "a")],
        )
    }

    #[test]
    fn reset_then_mark_leaves_exactly_the_marked_ids() {
        let mut store = store();
        store.mark_on_route(&["a".into(), "b".into()]).unwrap();
        store.reset_route_flags().unwrap();
        store.mark_on_route(&["b".into()]).unwrap();
        assert_eq!(store.flagged(), vec![SegmentId::from("b")]);
    }

    #[test]
    fn marking_an_unknown_id_is_a_no_op() {
        let mut store = store();
        store.mark_on_route(&["ghost".into()]).unwrap();
        assert!(store.flagged().is_empty());
    }

    #[test]
    fn each_fail_point_fires_on_its_operation() {
        let mut s = store().fail_at(FailPoint::LoadSegments);
        assert!(s.load_segments().is_err());
        assert!(s.load_waypoints().is_ok());

        let mut s = store().fail_at(FailPoint::ResetFlags);
        assert!(s.load_segments().is_ok());
        assert!(s.reset_route_flags().is_err());
        assert!(s.mark_on_route(&["a".into()]).is_ok());
    }
}
