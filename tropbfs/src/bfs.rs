//! Breadth-first search as a min-plus fixpoint.
//!
//! Rather than walking a frontier, every round relaxes all rows at once with
//! one tropical SpMV. A round costs O(edges) no matter how small the
//! frontier is, but the inner loops stay branch-light and vectorize. The
//! iteration stops once a round leaves every distance unchanged, which takes
//! at most `eccentricity(source) + 1` sweeps.

use crate::graph::CsrGraph;
use crate::spmv::SpmvConfig;

/// Outcome of one fixpoint run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsTrace {
    /// Hop distance from the source; `nverts` for unreached vertices.
    pub dists: Vec<u32>,
    /// Sweeps that lowered at least one distance.
    pub rounds: usize,
    /// SpMV applications, including the final one that confirmed the fixpoint.
    pub sweeps: usize,
}

/// Distances from `source`, or all-`nverts` if `source` is not a vertex.
pub fn bfs(graph: &CsrGraph, source: u32, config: SpmvConfig) -> Vec<u32> {
    bfs_traced(graph, source, config).dists
}

pub fn bfs_traced(graph: &CsrGraph, source: u32, config: SpmvConfig) -> BfsTrace {
    bfs_observed(graph, source, config, |_, _| ())
}

/// Runs the fixpoint, calling `observe(sweep, dists)` after every sweep.
pub fn bfs_observed<F>(graph: &CsrGraph, source: u32, config: SpmvConfig, mut observe: F) -> BfsTrace
where
    F: FnMut(usize, &[u32]),
{
    let inf = graph.infinity();
    let mut dists = vec![inf; graph.nvertices()];
    if source >= inf {
        return BfsTrace {
            dists,
            rounds: 0,
            sweeps: 0,
        };
    }
    dists[source as usize] = 0;

    // Kept distinct from `dists` for the whole run: rows read only `prev`
    // and write only `dists`.
    let mut prev = vec![0u32; graph.nvertices()];
    let mut sweeps = 0;
    while dists != prev {
        prev.copy_from_slice(&dists);
        config.apply(&mut dists, graph, &prev);
        sweeps += 1;
        observe(sweeps, &dists);
    }
    // every sweep but the last lowered something; a single-vertex graph
    // starts at its fixpoint and sweeps zero times
    BfsTrace {
        dists,
        rounds: sweeps.saturating_sub(1),
        sweeps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use itertools::Itertools;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use crate::spmv::{Kernel, LaneWidth};
    use crate::testing::{queue_bfs, random_edges};

    fn configs() -> Vec<SpmvConfig> {
        vec![
            SpmvConfig::sequential(Kernel::Scalar),
            SpmvConfig::sequential(Kernel::Lanes(LaneWidth::FOUR)),
            SpmvConfig::sequential(Kernel::Lanes(LaneWidth::EIGHT)),
            SpmvConfig::sequential(Kernel::Lanes(LaneWidth::new(6).unwrap())),
            SpmvConfig {
                kernel: Kernel::Lanes(LaneWidth::EIGHT),
                parallel: true,
            },
        ]
    }

    #[test]
    fn path_graph_converges_in_three_rounds() {
        let g = CsrGraph::from_edges(4, vec![(0, 1), (1, 2), (2, 3)]);
        for config in configs() {
            let trace = bfs_traced(&g, 0, config);
            assert_eq!(trace.dists, vec![0, 1, 2, 3]);
            assert_eq!(trace.rounds, 3);
            assert_eq!(trace.sweeps, 4);
        }
    }

    #[test]
    fn duplicated_path_input_still_converges_in_three_rounds() {
        let g = CsrGraph::from_edges(
            4,
            vec![(0, 1), (1, 0), (1, 1), (1, 2), (2, 1), (3, 2), (2, 3)],
        );
        assert_eq!(g.nedges(), 6);
        let trace = bfs_traced(&g, 0, SpmvConfig::default());
        assert_eq!(trace.dists, vec![0, 1, 2, 3]);
        assert_eq!(trace.rounds, 3);
    }

    #[test]
    fn source_out_of_range_is_all_unreached() {
        let g = CsrGraph::from_edges(4, vec![(0, 1), (1, 2)]);
        for &source in &[4, 5, u32::MAX] {
            let trace = bfs_traced(&g, source, SpmvConfig::default());
            assert_eq!(trace.dists, vec![4; 4]);
            assert_eq!(trace.sweeps, 0);
        }
    }

    #[test]
    fn isolated_vertex_stays_unreached() {
        // 16 vertices, vertex 9 never appears
        let edges = (0..16u32)
            .filter(|&v| v != 9)
            .tuple_windows()
            .collect_vec();
        let g = CsrGraph::from_edges(16, edges);
        let dists = bfs(&g, 3, SpmvConfig::default());
        assert_eq!(dists[9], 16);
        assert_eq!(dists[3], 0);
        assert_eq!(dists[0], 3);
        assert_eq!(dists[15], 11);
    }

    #[test]
    fn lone_source() {
        let g = CsrGraph::from_edges(2, Vec::new());
        let trace = bfs_traced(&g, 1, SpmvConfig::default());
        assert_eq!(trace.dists, vec![2, 0]);
        assert_eq!(trace.rounds, 0);
        assert_eq!(trace.sweeps, 1);
    }

    #[test]
    fn single_vertex_graph() {
        let g = CsrGraph::from_edges(1, Vec::new());
        let trace = bfs_traced(&g, 0, SpmvConfig::default());
        assert_eq!(trace.dists, vec![0]);
        assert_eq!(trace.sweeps, 0);
        assert_eq!(bfs(&g, 1, SpmvConfig::default()), vec![1]);
    }

    #[test]
    fn matches_queue_bfs_on_random_graphs() {
        let rng = &mut Pcg64Mcg::seed_from_u64(5);
        for &n in &[2u32, 17, 64, 300] {
            for &m in &[n as usize / 2, n as usize, 3 * n as usize] {
                let g = CsrGraph::from_edges(n, random_edges(rng, n, m));
                for source in (0..n).step_by((n as usize / 4).max(1)) {
                    let expected = queue_bfs(&g, source);
                    for config in configs() {
                        assert_eq!(bfs(&g, source, config), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn distances_never_increase_between_sweeps() {
        let rng = &mut Pcg64Mcg::seed_from_u64(23);
        let n = 256;
        let g = CsrGraph::from_edges(n, random_edges(rng, n, 2 * n as usize));
        let mut last: Vec<u32> = Vec::new();
        bfs_observed(&g, 0, SpmvConfig::default(), |_, dists| {
            if !last.is_empty() {
                assert!(last.iter().zip(dists).all(|(a, b)| b <= a));
            }
            last = dists.to_vec();
        });
    }

    #[test]
    fn fixpoint_is_idempotent() {
        let rng = &mut Pcg64Mcg::seed_from_u64(29);
        let n = 128;
        let g = CsrGraph::from_edges(n, random_edges(rng, n, n as usize));
        for config in configs() {
            let dists = bfs(&g, 1, config);
            let mut again = dists.clone();
            config.apply(&mut again, &g, &dists);
            assert_eq!(again, dists);
        }
    }

    #[test]
    fn graph_is_reusable_across_sources() {
        let g = CsrGraph::from_edges(5, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
        let from_zero = bfs(&g, 0, SpmvConfig::default());
        let from_four = bfs(&g, 4, SpmvConfig::default());
        assert_eq!(from_zero, vec![0, 1, 2, 3, 4]);
        assert_eq!(from_four, vec![4, 3, 2, 1, 0]);
        assert_eq!(bfs(&g, 0, SpmvConfig::default()), from_zero);
    }
}
