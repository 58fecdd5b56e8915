//! Post-hoc route verification.
//!
//! Walks the final route and re-checks every consecutive pair against
//! the adjacency oracle. Violations are diagnostic output for the run
//! report; nothing is repaired or rejected here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyOracle;
use crate::types::{Segment, SegmentId};

/// Outcome of a route walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCheck {
    /// Positions `i` where `route[i]` and `route[i + 1]` are not adjacent.
    pub violations: Vec<usize>,
}

impl RouteCheck {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.violations.len()
    }
}

/// Re-check every consecutive pair of the route. Ids missing from
/// `segments` count as violations, as do pairs whose geometry no longer
/// matches.
#[must_use]
pub fn verify(route: &[SegmentId], segments: &[Segment], oracle: &AdjacencyOracle) -> RouteCheck {
    let by_id: HashMap<&SegmentId, &Segment> = segments.iter().map(|s| (&s.id, s)).collect();
    let mut violations = Vec::new();
    for (pos, pair) in route.windows(2).enumerate() {
        let adjacent = match (by_id.get(&pair[0]), by_id.get(&pair[1])) {
            (Some(a), Some(b)) => oracle.are_adjacent(a, b),
            _ => false,
        };
        if !adjacent {
            violations.push(pos);
        }
    }
    RouteCheck { violations }
}
