//! # `tropbfs` - breadth-first search as tropical matrix-vector products
//!
//! Reads raw edge streams into a symmetric CSR graph and computes BFS
//! distances by iterating a min-plus SpMV until the distance vector stops
//! changing. The SpMV comes in a scalar reference form and SIMD lane forms
//! that agree bit for bit. A SELL-C-sigma layout of the same graph is
//! provided for cross-checking.

use std::collections::HashMap;

use ordered_float::NotNan;
use serde_json::{json, Value};

pub mod bfs;
pub mod compare;
pub mod edges;
mod error;
pub mod graph;
pub mod graphio;
pub mod sellcs;
pub mod spmv;
#[cfg(test)]
mod testing;

pub use edges::GraphParams;
pub use error::{Error, Result};
pub use graph::CsrGraph;
pub use sellcs::SellCSigma;
pub use spmv::{Kernel, LaneWidth, SpmvConfig};

const NSTAT_PERCENTILES: usize = 10;
const STAT_PERCENTILES: [f64; NSTAT_PERCENTILES] =
    [0.0, 0.001, 0.01, 0.05, 0.10, 0.50, 0.90, 0.95, 0.99, 1.0];

/// Degree distribution of a graph: mean plus a fixed set of percentiles.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeSummary {
    mean: f64,
    percentiles: [f64; NSTAT_PERCENTILES],
}

impl DegreeSummary {
    /// Returns `None` for a graph without vertices.
    pub fn of(graph: &CsrGraph) -> Option<Self> {
        let n = graph.nvertices();
        if n == 0 {
            return None;
        }
        let mut degrees: Vec<NotNan<f64>> = (0..n as u32)
            .map(|v| NotNan::new(graph.degree(v) as f64).expect("degree is a number"))
            .collect();
        degrees.sort_unstable();
        let mut stats = DegreeSummary {
            mean: graph.nedges() as f64 / n as f64,
            percentiles: Default::default(),
        };
        STAT_PERCENTILES
            .iter()
            .copied()
            .map(|f| degrees[((n - 1) as f64 * f) as usize].into_inner())
            .zip(stats.percentiles.iter_mut())
            .for_each(|(val, p)| *p = val);
        Some(stats)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn max(&self) -> f64 {
        self.percentiles[NSTAT_PERCENTILES - 1]
    }

    pub fn median(&self) -> f64 {
        self.percentiles[5]
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        let mut map: HashMap<_, _> = STAT_PERCENTILES
            .iter()
            .map(|f| format!("p{:.3}", f))
            .zip(self.percentiles.iter().copied())
            .collect();
        map.insert("mean".to_string(), self.mean);
        map
    }

    pub fn to_json(&self) -> Value {
        json!(self.to_map())
    }
}
