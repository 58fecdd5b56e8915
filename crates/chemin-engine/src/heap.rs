//! Indexed binary min-heap with decrease-key, for the Dijkstra search.
//!
//! Vertices are dense indices into the network's node table. Priorities
//! are compared with `total_cmp`; equal priorities fall back to the
//! vertex index, so pop order is fully deterministic.

const ABSENT: usize = usize::MAX;

#[derive(Debug)]
pub(crate) struct MinHeap {
    /// Heap-ordered vertex indices.
    heap: Vec<usize>,
    /// pos[v] = position of v in `heap`, or ABSENT.
    pos: Vec<usize>,
    /// prio[v] = current priority of v. Valid only while queued or
    /// immediately after a pop.
    prio: Vec<f64>,
}

impl MinHeap {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            heap: Vec::with_capacity(vertex_count),
            pos: vec![ABSENT; vertex_count],
            prio: vec![f64::INFINITY; vertex_count],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, v: usize) -> bool {
        self.pos[v] != ABSENT
    }

    /// Insert a vertex that is not currently queued.
    pub fn push(&mut self, v: usize, priority: f64) {
        debug_assert!(!self.contains(v));
        self.prio[v] = priority;
        self.pos[v] = self.heap.len();
        self.heap.push(v);
        self.sift_up(self.heap.len() - 1);
    }

    /// Lower the priority of an already-queued vertex.
    pub fn update_priority(&mut self, v: usize, priority: f64) {
        debug_assert!(self.contains(v));
        debug_assert!(priority <= self.prio[v]);
        self.prio[v] = priority;
        self.sift_up(self.pos[v]);
    }

    /// Insert or decrease-key, whichever applies.
    pub fn push_or_update(&mut self, v: usize, priority: f64) {
        if self.contains(v) {
            self.update_priority(v, priority);
        } else {
            self.push(v, priority);
        }
    }

    /// Remove and return the vertex with the smallest priority.
    pub fn pop(&mut self) -> Option<(usize, f64)> {
        let last = self.heap.len().checked_sub(1)?;
        self.heap.swap(0, last);
        let v = self.heap.pop()?;
        self.pos[v] = ABSENT;
        if let Some(&root) = self.heap.first() {
            self.pos[root] = 0;
            self.sift_down(0);
        }
        Some((v, self.prio[v]))
    }

    fn less(&self, a: usize, b: usize) -> bool {
        let (va, vb) = (self.heap[a], self.heap[b]);
        match self.prio[va].total_cmp(&self.prio[vb]) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => va < vb,
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.less(i, parent) {
                self.swap_nodes(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;
            if left < self.heap.len() && self.less(left, smallest) {
                smallest = left;
            }
            if right < self.heap.len() && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.swap_nodes(i, smallest);
            i = smallest;
        }
    }

    fn swap_nodes(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.pos[self.heap[a]] = a;
        self.pos[self.heap[b]] = b;
    }
}
