//! Reduced graph over waypoint-hosting segments and the tour heuristic.
//!
//! Vertices are the distinct segments that host at least one waypoint,
//! in first-appearance order; edges carry the full-network shortest
//! path between two vertices. The tour is a nearest-neighbor walk that
//! splices each edge's intermediates into the output, falling back to a
//! two-hop relay through an already-visited vertex when the current
//! vertex has no direct edge to any unvisited one.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::job::{JobError, RunControl};
use crate::network::RoadNetwork;
use crate::types::{SegmentId, Waypoint};

/// An edge of the reduced graph.
#[derive(Debug, Clone)]
struct WaypointEdge {
    distance_km: f64,
    /// Intermediates ordered from the lower-indexed vertex to the higher.
    intermediates: Vec<SegmentId>,
}

impl WaypointEdge {
    fn spliced(&self, forward: bool) -> Vec<SegmentId> {
        if forward {
            self.intermediates.clone()
        } else {
            self.intermediates.iter().rev().cloned().collect()
        }
    }
}

/// Output of [`WaypointGraph::find_optimal_route`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tour {
    /// Waypoint vertices interleaved with the bridging intermediates.
    pub route: Vec<SegmentId>,
    /// Waypoint vertices the walk could not reach. A non-empty list
    /// degrades the result; it never invalidates it.
    pub unreached: Vec<SegmentId>,
}

/// Complete pairwise-shortest-path graph over waypoint hosts.
#[derive(Debug)]
pub struct WaypointGraph {
    vertices: Vec<SegmentId>,
    /// Keyed by (lower index, higher index).
    edges: HashMap<(usize, usize), WaypointEdge>,
    no_path_pairs: usize,
    skipped_hosts: Vec<SegmentId>,
}

impl WaypointGraph {
    /// Build the reduced graph: deduplicate hosts in first-appearance
    /// order (that order seeds the tour, keeping runs deterministic),
    /// drop hosts missing from the network, then run one Dijkstra per
    /// vertex. `on_progress` is called once per completed source with
    /// `(done, total)`; the control is honored between sources.
    ///
    /// # Errors
    ///
    /// Only cancellation or deadline expiry, via `control`.
    pub fn build(
        network: &RoadNetwork,
        waypoints: &[Waypoint],
        control: &RunControl,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<Self, JobError> {
        let mut vertices = Vec::new();
        let mut seen: HashSet<&SegmentId> = HashSet::new();
        let mut skipped_hosts = Vec::new();
        for waypoint in waypoints {
            if !seen.insert(&waypoint.segment_id) {
                continue;
            }
            if network.contains(&waypoint.segment_id) {
                vertices.push(waypoint.segment_id.clone());
            } else {
                skipped_hosts.push(waypoint.segment_id.clone());
            }
        }

        let n = vertices.len();
        let mut edges = HashMap::new();
        let mut no_path_pairs = 0;
        for a in 0..n {
            control.check()?;
            let Some(source) = network.single_source(&vertices[a]) else {
                continue;
            };
            for b in (a + 1)..n {
                match source.to(&vertices[b]) {
                    Some(path) => {
                        edges.insert(
                            (a, b),
                            WaypointEdge {
                                distance_km: path.distance_km,
                                intermediates: path.intermediates,
                            },
                        );
                    }
                    None => no_path_pairs += 1,
                }
            }
            on_progress(a + 1, n);
        }

        Ok(Self {
            vertices,
            edges,
            no_path_pairs,
            skipped_hosts,
        })
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn vertices(&self) -> &[SegmentId] {
        &self.vertices
    }

    /// Vertex pairs with no finite path between them.
    #[must_use]
    pub fn no_path_pairs(&self) -> usize {
        self.no_path_pairs
    }

    /// Waypoint hosts that were not present in the road network.
    #[must_use]
    pub fn skipped_hosts(&self) -> &[SegmentId] {
        &self.skipped_hosts
    }

    /// Edge between two vertices, with the orientation needed to travel
    /// from `from` to `to`.
    fn edge(&self, from: usize, to: usize) -> Option<(&WaypointEdge, bool)> {
        if from < to {
            self.edges.get(&(from, to)).map(|e| (e, true))
        } else {
            self.edges.get(&(to, from)).map(|e| (e, false))
        }
    }

    /// Closest unvisited vertex with a direct edge from `current`. Ties
    /// go to the lower vertex index.
    fn nearest_direct(&self, current: usize, visited: &[bool]) -> Option<(usize, Vec<SegmentId>)> {
        let mut best: Option<(f64, usize)> = None;
        for next in 0..self.vertices.len() {
            if visited[next] || next == current {
                continue;
            }
            if let Some((edge, _)) = self.edge(current, next) {
                let closer = best
                    .is_none_or(|(w, _)| edge.distance_km.total_cmp(&w) == Ordering::Less);
                if closer {
                    best = Some((edge.distance_km, next));
                }
            }
        }
        let (_, next) = best?;
        let (edge, forward) = self.edge(current, next)?;
        Some((next, edge.spliced(forward)))
    }

    /// Cheapest unvisited vertex reachable through exactly one relay
    /// vertex. The relay itself is appended to the splice so the output
    /// stays a connected chain; revisiting it is allowed.
    fn nearest_relay(&self, current: usize, visited: &[bool]) -> Option<(usize, Vec<SegmentId>)> {
        let n = self.vertices.len();
        let mut best: Option<(f64, usize, usize)> = None;
        for target in 0..n {
            if visited[target] || target == current {
                continue;
            }
            for relay in 0..n {
                if relay == current || relay == target {
                    continue;
                }
                let (Some((first, _)), Some((second, _))) =
                    (self.edge(current, relay), self.edge(relay, target))
                else {
                    continue;
                };
                let combined = first.distance_km + second.distance_km;
                let closer = best
                    .is_none_or(|(w, _, _)| combined.total_cmp(&w) == Ordering::Less);
                if closer {
                    best = Some((combined, target, relay));
                }
            }
        }
        let (_, target, relay) = best?;
        let mut splice = Vec::new();
        if let Some((edge, forward)) = self.edge(current, relay) {
            splice.extend(edge.spliced(forward));
        }
        splice.push(self.vertices[relay].clone());
        if let Some((edge, forward)) = self.edge(relay, target) {
            splice.extend(edge.spliced(forward));
        }
        Some((target, splice))
    }

    /// Nearest-neighbor tour starting at the first vertex.
    ///
    /// When no unvisited vertex is reachable directly or through one
    /// relay, the walk stops and reports the rest as unreached. The
    /// partial route is still valid output.
    #[must_use]
    pub fn find_optimal_route(&self) -> Tour {
        let n = self.vertices.len();
        if n == 0 {
            return Tour::default();
        }

        let mut visited = vec![false; n];
        let mut route = vec![self.vertices[0].clone()];
        visited[0] = true;
        let mut current = 0;
        let mut remaining = n - 1;

        while remaining > 0 {
            let step = self
                .nearest_direct(current, &visited)
                .or_else(|| self.nearest_relay(current, &visited));
            let Some((next, splice)) = step else {
                break;
            };
            route.extend(splice);
            route.push(self.vertices[next].clone());
            visited[next] = true;
            remaining -= 1;
            current = next;
        }

        let unreached = visited
            .iter()
            .enumerate()
            .filter(|&(_, &v)| !v)
            .map(|(i, _)| self.vertices[i].clone())
            .collect();
        Tour { route, unreached }
    }
}
