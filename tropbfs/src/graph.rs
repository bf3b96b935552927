//! Compact CSR graph data structure.

use rayon::iter::IndexedParallelIterator;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;
use rayon::slice::{ParallelSlice, ParallelSliceMut};

use crate::edges::EdgeBuckets;

pub type Vertex = u32;

/// An immutable compressed-sparse-row adjacency for undirected graphs.
///
/// The space of vertices is a contiguous range of u32 ints
/// from [0, nvertices). Every undirected edge is stored once per endpoint.
/// Neighbor lists keep the order in which edges were ingested; they are not
/// sorted by id.
pub struct CsrGraph {
    offsets: Box<[usize]>,
    neighbors: Box<[Vertex]>,
}

impl CsrGraph {
    /// `offsets.len()` should be one greater than the number of vertices
    /// with `neighbors[offsets[i]..offsets[i+1]]` being the edges incident
    /// from `i`, which should be free of self-loops and bidirectional.
    pub(crate) fn new(offsets: Box<[usize]>, neighbors: Box<[Vertex]>) -> Self {
        assert!(offsets.len() <= (1 << 32));
        assert_eq!(offsets.first().copied(), Some(0));
        assert_eq!(offsets.last().copied(), Some(neighbors.len()));
        debug_assert!(offsets.par_windows(2).enumerate().all(|(i, s)| {
            s[0] <= s[1] && neighbors[s[0]..s[1]].iter().all(|&j| j != i as Vertex)
        }));
        debug_assert!(is_symmetric(&offsets, &neighbors));
        Self { offsets, neighbors }
    }

    /// Flattens ingestion buckets into CSR arrays in one pass over the
    /// vertices, draining each bucket in FIFO order.
    pub fn from_buckets(buckets: EdgeBuckets) -> Self {
        let (buckets, nedges) = buckets.into_parts();
        let nverts = buckets.len();
        let mut offsets = vec![0usize; nverts + 1].into_boxed_slice();
        let mut neighbors = vec![0 as Vertex; nedges].into_boxed_slice();

        let mut cursor = 0;
        for (v, bucket) in buckets.into_iter().enumerate() {
            offsets[v] = cursor;
            for nbr in bucket {
                neighbors[cursor] = nbr;
                cursor += 1;
            }
        }
        offsets[nverts] = cursor;
        assert_eq!(cursor, nedges, "bucket contents disagree with edge count");

        Self::new(offsets, neighbors)
    }

    /// Builds a graph from in-memory pairs with the same filtering rules as
    /// stream ingestion.
    ///
    /// Panics if an endpoint is not below `nverts`.
    pub fn from_edges(nverts: u32, edges: impl IntoIterator<Item = (Vertex, Vertex)>) -> Self {
        let mut buckets = EdgeBuckets::new(nverts);
        for (u, v) in edges {
            buckets.push(u, v);
        }
        Self::from_buckets(buckets)
    }

    pub fn neighbors(&self, v: Vertex) -> &[Vertex] {
        let v = v as usize;
        let lo = self.offsets[v];
        let hi = self.offsets[v + 1];
        &self.neighbors[lo..hi]
    }

    pub fn degree(&self, v: Vertex) -> usize {
        let v = v as usize;
        let lo = self.offsets[v];
        let hi = self.offsets[v + 1];
        hi - lo
    }

    pub fn nvertices(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Directed edge count, twice the number of undirected edges retained.
    pub fn nedges(&self) -> usize {
        self.neighbors.len()
    }

    /// Row offsets, `nvertices() + 1` long.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Flat column indices, `nedges()` long.
    pub fn col_indices(&self) -> &[Vertex] {
        &self.neighbors
    }

    /// The "unreached" distance for this graph.
    pub fn infinity(&self) -> u32 {
        self.nvertices() as u32
    }
}

/// Every directed entry `(v, w)` is matched by a `(w, v)`, counting
/// repeats. Offsets must already be non-decreasing.
fn is_symmetric(offsets: &[usize], neighbors: &[Vertex]) -> bool {
    let mut forward: Vec<(Vertex, Vertex)> = offsets
        .windows(2)
        .enumerate()
        .flat_map(|(v, s)| neighbors[s[0]..s[1]].iter().map(move |&w| (v as Vertex, w)))
        .collect();
    let mut backward: Vec<(Vertex, Vertex)> = forward.par_iter().map(|&(v, w)| (w, v)).collect();
    forward.par_sort_unstable();
    backward.par_sort_unstable();
    forward == backward
}

#[cfg(test)]
mod tests {
    use super::*;

    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    use crate::testing::random_edges;

    fn assert_csr_invariants(g: &CsrGraph) {
        let offsets = g.offsets();
        assert_eq!(offsets.len(), g.nvertices() + 1);
        assert_eq!(offsets[0], 0);
        assert_eq!(offsets[g.nvertices()], g.nedges());
        assert!(offsets.iter().tuple_windows().all(|(a, b)| a <= b));
        assert_eq!(g.nedges() % 2, 0);
        for v in 0..g.nvertices() as Vertex {
            for &w in g.neighbors(v) {
                assert_ne!(w, v, "self-loop at {}", v);
                assert!(g.neighbors(w).contains(&v), "{} -> {} not mirrored", v, w);
            }
        }
    }

    #[test]
    fn path_graph_layout() {
        let g = CsrGraph::from_edges(4, vec![(0, 1), (1, 2), (2, 3)]);
        assert_eq!(g.nvertices(), 4);
        assert_eq!(g.nedges(), 6);
        assert_eq!(g.offsets(), &[0, 1, 3, 5, 6]);
        assert_eq!(g.col_indices(), &[1, 0, 2, 1, 3, 2]);
        assert_csr_invariants(&g);
    }

    #[test]
    fn symmetry_counts_repeats() {
        // 0 -> 1 twice, 1 -> 0 twice
        assert!(is_symmetric(&[0, 2, 4], &[1, 1, 0, 0]));
        // 0 -> 1 twice, 1 -> 0 once
        assert!(!is_symmetric(&[0, 2, 3], &[1, 1, 0]));
        // 0 -> 2 unmatched
        assert!(!is_symmetric(&[0, 2, 3, 3], &[1, 2, 0]));
        assert!(is_symmetric(&[0, 0], &[]));
    }

    #[test]
    fn columns_follow_ingestion_order() {
        let g = CsrGraph::from_edges(4, vec![(0, 3), (0, 1), (2, 0)]);
        assert_eq!(g.neighbors(0), &[3, 1, 2]);
        assert_eq!(g.degree(0), 3);
        assert_eq!(g.neighbors(3), &[0]);
    }

    #[test]
    fn isolated_and_empty() {
        let g = CsrGraph::from_edges(8, vec![(1, 2)]);
        assert_eq!(g.degree(0), 0);
        assert!(g.neighbors(7).is_empty());
        assert_eq!(g.offsets(), &[0, 0, 1, 2, 2, 2, 2, 2, 2]);

        let g = CsrGraph::from_edges(3, Vec::new());
        assert_eq!(g.nedges(), 0);
        assert_eq!(g.offsets(), &[0, 0, 0, 0]);
        assert_eq!(g.infinity(), 3);
    }

    #[test]
    fn non_adjacent_duplicates_are_kept() {
        let g = CsrGraph::from_edges(3, vec![(0, 1), (1, 2), (1, 0)]);
        assert_eq!(g.neighbors(0), &[1, 1]);
        assert_eq!(g.nedges(), 6);
        assert_csr_invariants(&g);
    }

    #[test]
    fn random_graphs_hold_invariants() {
        let rng = &mut Pcg64Mcg::seed_from_u64(7);
        for &n in &[1u32, 2, 16, 100] {
            for _ in 0..5 {
                let m = rng.gen_range(0..(4 * n as usize + 1));
                let edges = random_edges(rng, n, m);
                let g = CsrGraph::from_edges(n, edges.iter().copied());
                assert_csr_invariants(&g);

                let kept = edges
                    .iter()
                    .filter(|(u, v)| u != v)
                    .map(|&(u, v)| (u.min(v), u.max(v)))
                    .dedup()
                    .count();
                assert_eq!(g.nedges(), 2 * kept);
            }
        }
    }
}
