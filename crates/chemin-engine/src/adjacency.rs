//! Segment adjacency and the centroid distance metric.
//!
//! Two segments are adjacent iff they share at least one coordinate
//! after rounding both to the match precision (default 6 decimal
//! digits, about 0.11 m). An earlier endpoint-distance rule (any
//! endpoints within 50 m) declared parallel streets adjacent and is
//! superseded; the exact-match rule is the only adjacency predicate.

use std::collections::HashSet;

use crate::geometry;
use crate::types::{Coord, Segment};

/// Decimal digits kept when matching coordinates exactly (~0.11 m).
pub const DEFAULT_MATCH_PRECISION: u8 = 6;

/// A coordinate quantized to the match precision, usable as a set key.
pub(crate) type CoordKey = (i64, i64);

/// Decides segment adjacency and measures inter-segment distance.
#[derive(Debug, Clone, Copy)]
pub struct AdjacencyOracle {
    scale: f64,
}

impl AdjacencyOracle {
    #[must_use]
    pub fn new(precision: u8) -> Self {
        Self {
            scale: 10f64.powi(i32::from(precision)),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn quantize(&self, c: Coord) -> CoordKey {
        (
            (c.lon * self.scale).round() as i64,
            (c.lat * self.scale).round() as i64,
        )
    }

    /// Quantized coordinate set of a segment. Empty for unusable geometry.
    pub(crate) fn coordinate_keys(&self, segment: &Segment) -> HashSet<CoordKey> {
        segment
            .coordinates()
            .map(|coords| coords.iter().map(|&c| self.quantize(c)).collect())
            .unwrap_or_default()
    }

    /// Exact-coordinate-match adjacency. Symmetric by construction; any
    /// shared coordinate counts, interior vertices included. Segments
    /// without usable geometry are adjacent to nothing.
    #[must_use]
    pub fn are_adjacent(&self, a: &Segment, b: &Segment) -> bool {
        let Some(coords) = a.coordinates() else {
            return false;
        };
        let keys = self.coordinate_keys(b);
        if keys.is_empty() {
            return false;
        }
        coords.iter().any(|&c| keys.contains(&self.quantize(c)))
    }

    /// Great-circle distance in kilometers between the two segments'
    /// bounding-box centers. Edge-weight metric only; never used as an
    /// adjacency test.
    #[must_use]
    pub fn centroid_distance_km(&self, a: &Segment, b: &Segment) -> Option<f64> {
        Some(geometry::haversine_km(a.center()?, b.center()?))
    }
}

/// Set-intersection form of the adjacency test, for callers that have
/// already quantized both segments. Probes the smaller set.
pub(crate) fn keys_intersect(a: &HashSet<CoordKey>, b: &HashSet<CoordKey>) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|k| large.contains(k))
}
