//! The road network: one vertex per usable segment, one edge per
//! confirmed adjacency, queried with Dijkstra.
//!
//! The cost model is asymmetric with respect to edges: stepping onto a
//! segment costs that segment's own length, so a path's distance is the
//! sum of the lengths of every segment traversed after the start. Edge
//! weights (centroid distances) are kept for reporting and tour
//! selection but do not drive the search.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use rayon::prelude::*;

use crate::adjacency::{self, AdjacencyOracle, CoordKey};
use crate::heap::MinHeap;
use crate::job::{JobError, RunControl};
use crate::spatial::SpatialIndex;
use crate::types::{Segment, SegmentId};

// ---------------------------------------------------------------------------
// Graph construction
// ---------------------------------------------------------------------------

/// Per-vertex payload: the segment's id and traversal cost.
#[derive(Debug, Clone)]
struct RoadNode {
    id: SegmentId,
    length_km: f64,
}

/// Result of [`RoadNetwork::build`]: the network plus the segments that
/// were excluded for unusable geometry.
#[derive(Debug)]
pub struct NetworkBuild {
    pub network: RoadNetwork,
    /// Ids excluded because no geometry shape yielded coordinates.
    pub excluded: Vec<SegmentId>,
}

/// Undirected adjacency graph over road segments. Built once, then
/// queried; there is no incremental mutation.
#[derive(Debug)]
pub struct RoadNetwork {
    graph: UnGraph<RoadNode, f64>,
    index_of: HashMap<SegmentId, NodeIndex>,
}

impl RoadNetwork {
    /// Build the network from a segment list.
    ///
    /// Candidate pairs come from the spatial grid and are confirmed by
    /// exact coordinate match. Candidate discovery is parallel; each
    /// unordered pair is examined once (owned by its lower index), and
    /// edges land in the graph serially, so both directions of an
    /// adjacency appear together and a rebuild from the same input
    /// yields the same graph regardless of input order.
    ///
    /// # Errors
    ///
    /// Only cancellation or deadline expiry, via `control`.
    pub fn build(
        segments: &[Segment],
        cell_precision: u8,
        match_precision: u8,
        control: &RunControl,
    ) -> Result<NetworkBuild, JobError> {
        let mut usable: Vec<&Segment> = Vec::with_capacity(segments.len());
        let mut excluded = Vec::new();
        for segment in segments {
            if segment.coordinates().is_some() {
                usable.push(segment);
            } else {
                excluded.push(segment.id.clone());
            }
        }
        control.check()?;

        let index = SpatialIndex::build(&usable, cell_precision);
        let oracle = AdjacencyOracle::new(match_precision);
        let keys: Vec<HashSet<CoordKey>> =
            usable.iter().map(|s| oracle.coordinate_keys(s)).collect();
        control.check()?;

        let confirmed: Vec<Vec<(usize, usize, f64)>> = usable
            .par_iter()
            .enumerate()
            .map(|(i, segment)| -> Result<Vec<(usize, usize, f64)>, JobError> {
                control.check()?;
                let mut edges = Vec::new();
                for j in index.potential_neighbors(i, segment) {
                    if j <= i {
                        continue;
                    }
                    if adjacency::keys_intersect(&keys[i], &keys[j]) {
                        let weight = oracle
                            .centroid_distance_km(segment, usable[j])
                            .unwrap_or(0.0);
                        edges.push((i, j, weight));
                    }
                }
                Ok(edges)
            })
            .collect::<Result<_, _>>()?;

        let edge_total = confirmed.iter().map(Vec::len).sum();
        let mut graph = UnGraph::with_capacity(usable.len(), edge_total);
        let mut index_of = HashMap::with_capacity(usable.len());
        let nodes: Vec<NodeIndex> = usable
            .iter()
            .map(|segment| {
                let node = graph.add_node(RoadNode {
                    id: segment.id.clone(),
                    length_km: segment.length_km(),
                });
                index_of.insert(segment.id.clone(), node);
                node
            })
            .collect();
        for (i, j, weight) in confirmed.into_iter().flatten() {
            graph.update_edge(nodes[i], nodes[j], weight);
        }

        Ok(NetworkBuild {
            network: Self { graph, index_of },
            excluded,
        })
    }

    #[must_use]
    pub fn contains(&self, id: &SegmentId) -> bool {
        self.index_of.contains_key(id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether two segments were confirmed adjacent during the build.
    #[must_use]
    pub fn adjacent(&self, a: &SegmentId, b: &SegmentId) -> bool {
        match (self.index_of.get(a), self.index_of.get(b)) {
            (Some(&na), Some(&nb)) => self.graph.find_edge(na, nb).is_some(),
            _ => false,
        }
    }

    /// Centroid distance in kilometers between two adjacent segments.
    #[must_use]
    pub fn edge_distance_km(&self, a: &SegmentId, b: &SegmentId) -> Option<f64> {
        let (&na, &nb) = (self.index_of.get(a)?, self.index_of.get(b)?);
        let edge = self.graph.find_edge(na, nb)?;
        self.graph.edge_weight(edge).copied()
    }

    // -----------------------------------------------------------------------
    // Shortest paths
    // -----------------------------------------------------------------------

    /// Run Dijkstra from one segment and keep the whole distance table,
    /// so many targets can be resolved from one search. `None` when the
    /// start segment is not in the network.
    #[must_use]
    pub fn single_source(&self, start: &SegmentId) -> Option<SingleSource<'_>> {
        let &start = self.index_of.get(start)?;
        let n = self.graph.node_count();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev = vec![usize::MAX; n];
        let mut heap = MinHeap::new(n);
        dist[start.index()] = 0.0;
        heap.push(start.index(), 0.0);

        while let Some((u, du)) = heap.pop() {
            for v in self.graph.neighbors(NodeIndex::new(u)) {
                // Entering a neighbor costs that neighbor's own length.
                let next = du + self.graph[v].length_km;
                if next < dist[v.index()] {
                    dist[v.index()] = next;
                    prev[v.index()] = u;
                    heap.push_or_update(v.index(), next);
                }
            }
        }

        Some(SingleSource {
            network: self,
            start,
            dist,
            prev,
        })
    }

    /// Shortest path between two segments; see [`SingleSource::to`] for
    /// the distance rules. `None` when either id is unknown or no path
    /// exists, which is an expected answer for disconnected data.
    #[must_use]
    pub fn shortest_path(&self, start: &SegmentId, end: &SegmentId) -> Option<PathFound> {
        self.single_source(start)?.to(end)
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// A resolved shortest path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFound {
    /// Sum of traversed segment lengths in kilometers.
    pub distance_km: f64,
    /// Segments strictly between the endpoints, in travel order.
    pub intermediates: Vec<SegmentId>,
}

/// Frozen single-source Dijkstra state.
#[derive(Debug)]
pub struct SingleSource<'a> {
    network: &'a RoadNetwork,
    start: NodeIndex,
    dist: Vec<f64>,
    prev: Vec<usize>,
}

impl SingleSource<'_> {
    /// Resolve the path to one target.
    ///
    /// A segment to itself is distance zero with no intermediates.
    /// Directly adjacent segments cost the average of their two lengths
    /// (a crossing, not a full traversal of both). Everything else is
    /// the Dijkstra distance with the intermediate chain reconstructed;
    /// `None` means no path exists.
    #[must_use]
    pub fn to(&self, end: &SegmentId) -> Option<PathFound> {
        let &goal = self.network.index_of.get(end)?;
        if goal == self.start {
            return Some(PathFound {
                distance_km: 0.0,
                intermediates: Vec::new(),
            });
        }
        if self.network.graph.find_edge(self.start, goal).is_some() {
            let a = self.network.graph[self.start].length_km;
            let b = self.network.graph[goal].length_km;
            return Some(PathFound {
                distance_km: (a + b) / 2.0,
                intermediates: Vec::new(),
            });
        }
        if self.dist[goal.index()].is_infinite() {
            return None;
        }

        let mut chain = Vec::new();
        let mut cur = goal.index();
        while cur != self.start.index() {
            chain.push(cur);
            let p = self.prev[cur];
            if p == usize::MAX {
                return None;
            }
            cur = p;
        }
        chain.reverse();
        chain.pop();
        let intermediates = chain
            .into_iter()
            .map(|i| self.network.graph[NodeIndex::new(i)].id.clone())
            .collect();
        Some(PathFound {
            distance_km: self.dist[goal.index()],
            intermediates,
        })
    }
}
