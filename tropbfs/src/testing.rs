//! Shared fixtures for unit tests.

use std::collections::VecDeque;

use rand::Rng;

use crate::graph::CsrGraph;

/// Draws `m` uniform raw pairs over `0..n` and orders them by canonical edge,
/// the way an edge file is laid out. Orientation and self-loops are left in
/// so ingestion has something to filter.
pub(crate) fn random_edges<R: Rng>(rng: &mut R, n: u32, m: usize) -> Vec<(u32, u32)> {
    let mut edges: Vec<(u32, u32)> = (0..m)
        .map(|_| (rng.gen_range(0..n), rng.gen_range(0..n)))
        .collect();
    edges.sort_by_key(|&(u, v)| (u.min(v), u.max(v)));
    edges
}

/// Queue-based BFS used as an oracle for the fixpoint driver.
pub(crate) fn queue_bfs(graph: &CsrGraph, source: u32) -> Vec<u32> {
    let inf = graph.infinity();
    let mut dist = vec![inf; graph.nvertices()];
    if source >= inf {
        return dist;
    }
    dist[source as usize] = 0;
    let mut queue = VecDeque::new();
    queue.push_back(source);
    while let Some(v) = queue.pop_front() {
        let dv = dist[v as usize];
        for &w in graph.neighbors(v) {
            if dist[w as usize] == inf {
                dist[w as usize] = dv + 1;
                queue.push_back(w);
            }
        }
    }
    dist
}
