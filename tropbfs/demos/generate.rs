//! Samples a synthetic R-MAT edge stream and writes it out as a raw edge
//! file that the `bfs` example can read.

use std::convert::TryInto;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::Rng;
use rand_pcg::Lcg64Xsh32;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;
use serde_json::json;
use structopt::StructOpt;

use tropbfs::{graphio, GraphParams};

/// Graph500 R-MAT quadrant probabilities; the remainder goes to the lower
/// right quadrant.
const RMAT_A: f64 = 0.57;
const RMAT_B: f64 = 0.19;
const RMAT_C: f64 = 0.19;

/// Edges drawn per rng stream.
const EDGES_PER_STREAM: usize = 1 << 16;

/// Generate an R-MAT graph with `2^scale` vertices and `edgefactor` edges
/// per vertex.
#[derive(Debug, StructOpt)]
#[structopt(name = "generate", about = "Sample an R-MAT edge file.")]
struct Opt {
    /// Directory to write `SCALE_EDGEFACTOR_rmat.bin` into.
    #[structopt(long)]
    out: PathBuf,

    /// Base-2 log of the vertex count.
    #[structopt(long)]
    scale: u32,

    /// Edges per vertex.
    #[structopt(long, default_value = "16")]
    edgefactor: u32,

    /// Random sampling seed
    #[structopt(long)]
    seed: u64,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let params = GraphParams::new(opt.scale, opt.edgefactor)?;
    let m = params.nedges_raw();

    let sample_start = Instant::now();
    let nstreams = (m + EDGES_PER_STREAM - 1) / EDGES_PER_STREAM;
    let mut edges: Vec<(u32, u32)> = (0..nstreams)
        .into_par_iter()
        .flat_map_iter(|stream| {
            let mut rng = Lcg64Xsh32::new(0xcafef00dd15ea5e5, opt.seed ^ stream as u64);
            let lo = stream * EDGES_PER_STREAM;
            let hi = (lo + EDGES_PER_STREAM).min(m);
            (lo..hi)
                .map(|_| rmat_edge(&mut rng, opt.scale))
                .collect::<Vec<_>>()
        })
        .collect();
    let sample_time = format!("{:.0?}", Instant::now().duration_since(sample_start));

    // ingestion only drops duplicates that sit next to each other
    let sort_start = Instant::now();
    edges.par_sort_unstable_by_key(|&(u, v)| (u.min(v), u.max(v)));
    let sort_time = format!("{:.0?}", Instant::now().duration_since(sort_start));

    let path = opt
        .out
        .join(format!("{}_{}_rmat.bin", opt.scale, opt.edgefactor));
    let write_start = Instant::now();
    graphio::write_edges(&path, edges.iter().copied())
        .with_context(|| format!("writing {:?}", path))?;

    println!(
        "{}",
        json!({
            "path": path.display().to_string(),
            "nvertices": params.nverts(),
            "nedges_raw": m,
            "sample_time": sample_time,
            "sort_time": sort_time,
            "write_time": format!("{:.0?}", Instant::now().duration_since(write_start)),
        })
    );
    Ok(())
}

/// Descends `scale` levels of the recursive adjacency-matrix quadrants.
fn rmat_edge<R: Rng>(rng: &mut R, scale: u32) -> (u32, u32) {
    let (mut u, mut v) = (0u64, 0u64);
    for _ in 0..scale {
        let p: f64 = rng.gen();
        let (du, dv) = if p < RMAT_A {
            (0, 0)
        } else if p < RMAT_A + RMAT_B {
            (0, 1)
        } else if p < RMAT_A + RMAT_B + RMAT_C {
            (1, 0)
        } else {
            (1, 1)
        };
        u = 2 * u + du;
        v = 2 * v + dv;
    }
    (u.try_into().unwrap(), v.try_into().unwrap())
}
