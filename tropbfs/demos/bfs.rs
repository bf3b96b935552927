//! Runs min-plus BFS over an edge file in CSR form, SELL-C-sigma form,
//! or both with a cross-check of the results.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde_json::json;
use structopt::StructOpt;

use tropbfs::bfs::bfs_traced;
use tropbfs::{compare, graphio, DegreeSummary, Kernel, SpmvConfig};

const MODE_CSR: u8 = 1;
const MODE_SELLCS: u8 = 2;

/// Reads a raw edge file and computes hop distances from a root vertex.
///
/// The edge file holds `2 * EDGEFACTOR * 2^SCALE` native-endian u32s,
/// sorted by canonical edge. SCALE and EDGEFACTOR default to the two
/// leading fields of its file name.
#[derive(Debug, StructOpt)]
#[structopt(name = "bfs", about = "Tropical SpMV breadth-first search.")]
struct Opt {
    /// Edge file, named SCALE_EDGEFACTOR_*.
    #[structopt(short = "f", long)]
    file: PathBuf,

    /// Root vertex, 0 <= root < 2^SCALE.
    #[structopt(short = "r", long, default_value = "0")]
    root: u32,

    /// SELL-C-sigma chunk size, 4 or 8.
    #[structopt(short = "C", long, default_value = "8")]
    chunk: usize,

    /// Base-2 log of the SELL-C-sigma sorting window, 0 <= sigma <= SCALE.
    #[structopt(short = "s", long, default_value = "1")]
    sigma: u32,

    /// Base-2 log of the vertex count.
    #[structopt(short = "S", long)]
    scale: Option<u32>,

    /// Raw edge records per vertex.
    #[structopt(short = "E", long)]
    edgefactor: Option<u32>,

    /// 1: CSR only, 2: SELL-C-sigma only, 3: both and compare.
    #[structopt(short = "m", long, default_value = "1")]
    mode: u8,

    /// CSR kernel: scalar, lanes, or lanesN for an N-wide block.
    #[structopt(long, default_value = "lanes")]
    kernel: Kernel,

    /// Spread rows over all cores.
    #[structopt(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let params = graphio::resolve_params(&opt.file, opt.scale, opt.edgefactor)
        .with_context(|| format!("sizing graph from {:?}", opt.file))?;
    if opt.root >= params.nverts() {
        bail!(
            "root = {} is not valid, must be 0 <= root < 2^SCALE = {}",
            opt.root,
            params.nverts()
        );
    }
    if opt.chunk != 4 && opt.chunk != 8 {
        bail!("chunk size must be 4 or 8, got {}", opt.chunk);
    }
    if opt.sigma > params.scale() {
        bail!(
            "sigma must satisfy 0 <= sigma <= SCALE = {}, got {}",
            params.scale(),
            opt.sigma
        );
    }
    if opt.mode < 1 || opt.mode > 3 {
        bail!("mode must be 1 (CSR), 2 (SELL-C-sigma) or 3 (both), got {}", opt.mode);
    }

    let mut csr_res = None;
    if opt.mode & MODE_CSR != 0 {
        let graph = graphio::read_csr(&opt.file, params)
            .with_context(|| format!("loading CSR graph from {:?}", opt.file))?;
        if let Some(degrees) = DegreeSummary::of(&graph) {
            println!("{}", json!({ "degrees": degrees.to_json() }));
        }

        let config = SpmvConfig {
            kernel: opt.kernel,
            parallel: opt.parallel,
        };
        let bfs_start = Instant::now();
        let trace = bfs_traced(&graph, opt.root, config);
        println!(
            "{}",
            json!({
                "format": "csr",
                "kernel": config.kernel.to_string(),
                "parallel": config.parallel,
                "rounds": trace.rounds,
                "sweeps": trace.sweeps,
                "reached": reached(&trace.dists, params.nverts()),
                "bfs_time": format!("{:.0?}", Instant::now().duration_since(bfs_start)),
            })
        );
        csr_res = Some(trace.dists);
    }

    let mut sellcs_res = None;
    if opt.mode & MODE_SELLCS != 0 {
        let sigma = 1usize << opt.sigma;
        let graph = graphio::read_sellcs(&opt.file, params, opt.chunk, sigma)
            .with_context(|| format!("loading SELL-C-sigma graph from {:?}", opt.file))?;

        let bfs_start = Instant::now();
        let internal = graph.bfs(opt.root, opt.parallel);
        let bfs_time = format!("{:.0?}", Instant::now().duration_since(bfs_start));
        let dists = graph.depermute(&internal);
        println!(
            "{}",
            json!({
                "format": "sellcs",
                "chunk": graph.chunk(),
                "sigma": graph.sigma(),
                "reached": reached(&dists, params.nverts()),
                "bfs_time": bfs_time,
            })
        );
        sellcs_res = Some(dists);
    }

    if let (Some(csr), Some(sellcs)) = (&csr_res, &sellcs_res) {
        let comparison = compare::compare(csr, sellcs);
        println!("{}", json!({ "cross_check": comparison.to_json(10) }));
    }
    Ok(())
}

fn reached(dists: &[u32], inf: u32) -> usize {
    dists.iter().filter(|&&d| d != inf).count()
}
