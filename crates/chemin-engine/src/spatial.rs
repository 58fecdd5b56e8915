//! Coarse spatial grid for narrowing adjacency candidates.
//!
//! Every coordinate of every segment is bucketed by rounding to a fixed
//! number of decimal digits; the default of 3 gives cells roughly 110 m
//! on a side. The grid is strictly a prefilter: candidate pairs it
//! produces are confirmed or rejected by the adjacency oracle. Each
//! lookup also probes the eight surrounding cells, so coordinates that
//! match at full precision but straddle a cell boundary still meet.
//!
//! Known limitation: a long segment that crosses a cell without having
//! a vertex inside it is invisible to that cell.

use std::collections::{HashMap, HashSet};

use crate::types::{Coord, Segment};

/// Decimal digits kept when bucketing coordinates (~110 m cells).
pub const DEFAULT_CELL_PRECISION: u8 = 3;

/// Grid cell key: a coordinate pair rounded to the index precision.
type CellKey = (i64, i64);

/// Grid of segment indices keyed by rounded coordinate cells.
///
/// Indices refer to positions in the slice the index was built from.
#[derive(Debug)]
pub struct SpatialIndex {
    scale: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialIndex {
    /// Bucket every coordinate of every segment. A segment enters a
    /// given cell at most once no matter how many of its vertices fall
    /// there; segments without usable geometry are skipped.
    #[must_use]
    pub fn build(segments: &[&Segment], precision: u8) -> Self {
        let scale = 10f64.powi(i32::from(precision));
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (idx, segment) in segments.iter().enumerate() {
            let Some(coords) = segment.coordinates() else {
                continue;
            };
            let mut entered: HashSet<CellKey> = HashSet::new();
            for &c in coords {
                let key = cell_key(c, scale);
                if entered.insert(key) {
                    cells.entry(key).or_default().push(idx);
                }
            }
        }
        Self { scale, cells }
    }

    /// All other segments sharing any cell of this segment's coordinates
    /// or one of the eight cells around it. Sorted, deduplicated, and
    /// never containing `idx` itself.
    #[must_use]
    pub fn potential_neighbors(&self, idx: usize, segment: &Segment) -> Vec<usize> {
        let Some(coords) = segment.coordinates() else {
            return Vec::new();
        };
        let mut found: HashSet<usize> = HashSet::new();
        for &c in coords {
            let (cx, cy) = cell_key(c, self.scale);
            for dx in -1..=1_i64 {
                for dy in -1..=1_i64 {
                    if let Some(members) = self.cells.get(&(cx + dx, cy + dy)) {
                        found.extend(members.iter().copied());
                    }
                }
            }
        }
        found.remove(&idx);
        let mut out: Vec<usize> = found.into_iter().collect();
        out.sort_unstable();
        out
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cell_key(c: Coord, scale: f64) -> CellKey {
    ((c.lon * scale).round() as i64, (c.lat * scale).round() as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::types::Coord;

    fn seg(id: &str, pairs: &[(f64, f64)]) -> Segment {
        Segment::new(
            id,
            Geometry::Flat(pairs.iter().map(|&(lon, lat)| Coord::new(lon, lat)).collect()),
        )
    }

    #[test]
    fn segments_in_the_same_cell_are_candidates() {
        let a = seg("a", &[(2.5001, 48.8001), (2.5002, 48.8001)]);
        let b = seg("b", &[(2.5002, 48.8002), (2.5003, 48.8002)]);
        let index = SpatialIndex::build(&[&a, &b], DEFAULT_CELL_PRECISION);
        assert_eq!(index.potential_neighbors(0, &a), vec![1]);
        assert_eq!(index.potential_neighbors(1, &b), vec![0]);
    }

    #[test]
    fn far_segments_are_not_candidates() {
        let a = seg("a", &[(2.5, 48.8), (2.501, 48.8)]);
        let b = seg("b", &[(3.5, 47.0), (3.501, 47.0)]);
        let index = SpatialIndex::build(&[&a, &b], DEFAULT_CELL_PRECISION);
        assert!(index.potential_neighbors(0, &a).is_empty());
    }

    #[test]
    fn boundary_straddle_is_caught_by_ring_probe() {
        // 2.50049 and 2.50051 round into different cells at 3 decimals but
        // are 2e-5 degrees apart; the 3x3 probe must still pair them.
        let a = seg("a", &[(2.50049, 48.8), (2.501, 48.8)]);
        let b = seg("b", &[(2.50051, 48.8), (2.502, 48.8)]);
        let index = SpatialIndex::build(&[&a, &b], DEFAULT_CELL_PRECISION);
        assert_eq!(index.potential_neighbors(0, &a), vec![1]);
    }

    #[test]
    fn candidates_are_deduplicated() {
        // b shares two cells with a; it must still appear once.
        let a = seg("a", &[(2.500, 48.800), (2.501, 48.800)]);
        let b = seg("b", &[(2.500, 48.800), (2.501, 48.800)]);
        let index = SpatialIndex::build(&[&a, &b], DEFAULT_CELL_PRECISION);
        assert_eq!(index.potential_neighbors(0, &a), vec![1]);
    }

    #[test]
    fn unusable_geometry_is_invisible() {
        let a = seg("a", &[(2.5, 48.8)]);
        let bad = Segment::new("bad", Geometry::Unknown);
        let index = SpatialIndex::build(&[&a, &bad], DEFAULT_CELL_PRECISION);
        assert!(index.potential_neighbors(1, &bad).is_empty());
        assert!(index.potential_neighbors(0, &a).is_empty());
    }
}
