//! Tropical (min-plus) sparse matrix-vector products over a [`CsrGraph`].
//!
//! Every kernel here computes, for each row `i`,
//!
//! ```text
//! y[i] = min(y[i], min_{j in nbrs(i)} (1 + x[j]))
//! ```
//!
//! with the empty minimum taken to be `nverts`. Results accumulate into `y`;
//! it is never reset. The scalar reference and the lane kernels must agree
//! bit for bit on every input, so all adds wrap the same way vector lanes do.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};
use wide::{u32x4, u32x8};

use crate::error::{Error, Result};
use crate::graph::CsrGraph;

/// Rows handed to a rayon task at a time.
const ROWS_PER_TASK: usize = 1024;

/// A fixed number of `u32` lanes that take lane-wise minima together.
pub(crate) trait MinBlock: Copy + Add<Output = Self> {
    const LANES: usize;

    fn splat(v: u32) -> Self;

    /// Gathers `x[idx[l]]` into lane `l`; `idx` is exactly `LANES` long.
    fn gather(x: &[u32], idx: &[u32]) -> Self;

    fn load(s: &[u32]) -> Self;

    fn store(self, out: &mut [u32]);

    fn lanes_min(self, rhs: Self) -> Self;

    fn reduce_min(self) -> u32;
}

impl MinBlock for u32x4 {
    const LANES: usize = 4;

    #[inline]
    fn splat(v: u32) -> Self {
        u32x4::splat(v)
    }

    #[inline]
    fn gather(x: &[u32], idx: &[u32]) -> Self {
        u32x4::new([
            x[idx[0] as usize],
            x[idx[1] as usize],
            x[idx[2] as usize],
            x[idx[3] as usize],
        ])
    }

    #[inline]
    fn load(s: &[u32]) -> Self {
        u32x4::new([s[0], s[1], s[2], s[3]])
    }

    #[inline]
    fn store(self, out: &mut [u32]) {
        out[..4].copy_from_slice(&self.to_array());
    }

    #[inline]
    fn lanes_min(self, rhs: Self) -> Self {
        self.min(rhs)
    }

    #[inline]
    fn reduce_min(self) -> u32 {
        let [a, b, c, d] = self.to_array();
        a.min(b).min(c.min(d))
    }
}

impl MinBlock for u32x8 {
    const LANES: usize = 8;

    #[inline]
    fn splat(v: u32) -> Self {
        u32x8::splat(v)
    }

    #[inline]
    fn gather(x: &[u32], idx: &[u32]) -> Self {
        u32x8::new([
            x[idx[0] as usize],
            x[idx[1] as usize],
            x[idx[2] as usize],
            x[idx[3] as usize],
            x[idx[4] as usize],
            x[idx[5] as usize],
            x[idx[6] as usize],
            x[idx[7] as usize],
        ])
    }

    #[inline]
    fn load(s: &[u32]) -> Self {
        u32x8::new([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]])
    }

    #[inline]
    fn store(self, out: &mut [u32]) {
        out[..8].copy_from_slice(&self.to_array());
    }

    #[inline]
    fn lanes_min(self, rhs: Self) -> Self {
        self.min(rhs)
    }

    #[inline]
    fn reduce_min(self) -> u32 {
        let [a, b, c, d, e, f, g, h] = self.to_array();
        a.min(b).min(c.min(d)).min(e.min(f).min(g.min(h)))
    }
}

/// Number of values a data-parallel kernel processes per block.
///
/// Widths 4 and 8 map onto SIMD registers; any other positive width runs a
/// portable blocked loop with the same semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneWidth(usize);

impl LaneWidth {
    pub const FOUR: LaneWidth = LaneWidth(4);
    pub const EIGHT: LaneWidth = LaneWidth(8);

    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::LaneWidth(width));
        }
        Ok(LaneWidth(width))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Whether this width runs on native vector lanes.
    pub fn is_native(self) -> bool {
        self.0 == 4 || self.0 == 8
    }
}

/// Which row kernel to relax with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// Four interleaved running minima per row.
    Scalar,
    /// Blocked lane-wise minima followed by a horizontal reduction.
    Lanes(LaneWidth),
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Scalar => write!(f, "scalar"),
            Kernel::Lanes(w) => write!(f, "lanes{}", w.get()),
        }
    }
}

impl FromStr for Kernel {
    type Err = Error;

    /// Accepts `scalar`, `lanes` (width 8), or `lanesN`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scalar" => Ok(Kernel::Scalar),
            "lanes" => Ok(Kernel::Lanes(LaneWidth::EIGHT)),
            _ => {
                let width = s
                    .strip_prefix("lanes")
                    .and_then(|w| w.parse().ok())
                    .ok_or_else(|| Error::ParamRange(format!("unknown kernel {:?}", s)))?;
                Ok(Kernel::Lanes(LaneWidth::new(width)?))
            }
        }
    }
}

/// Kernel choice plus whether rows are spread over the rayon pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpmvConfig {
    pub kernel: Kernel,
    pub parallel: bool,
}

impl Default for SpmvConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::Lanes(LaneWidth::EIGHT),
            parallel: false,
        }
    }
}

impl SpmvConfig {
    pub fn sequential(kernel: Kernel) -> Self {
        Self {
            kernel,
            parallel: false,
        }
    }

    /// Accumulates `graph (x) x` into `y`.
    ///
    /// `x` and `y` are distinct buffers, so rows never observe each other's
    /// writes within one product; running rows in parallel is safe.
    pub fn apply(&self, y: &mut [u32], graph: &CsrGraph, x: &[u32]) {
        let n = graph.nvertices();
        assert_eq!(y.len(), n, "output length must equal nverts");
        assert_eq!(x.len(), n, "input length must equal nverts");
        let inf = graph.infinity();

        match self.kernel {
            Kernel::Scalar => relax_rows(y, self.parallel, || (), |_, i| {
                row_scalar(graph.neighbors(i as u32), x, inf)
            }),
            Kernel::Lanes(LaneWidth(4)) => relax_rows(y, self.parallel, || (), |_, i| {
                row_blocked::<u32x4>(graph.neighbors(i as u32), x, inf)
            }),
            Kernel::Lanes(LaneWidth(8)) => relax_rows(y, self.parallel, || (), |_, i| {
                row_blocked::<u32x8>(graph.neighbors(i as u32), x, inf)
            }),
            Kernel::Lanes(LaneWidth(w)) => relax_rows(
                y,
                self.parallel,
                || vec![0u32; w],
                |acc, i| row_portable(graph.neighbors(i as u32), x, inf, acc),
            ),
        }
    }
}

/// Scalar reference product, one thread.
pub fn scalar(y: &mut [u32], graph: &CsrGraph, x: &[u32]) {
    SpmvConfig::sequential(Kernel::Scalar).apply(y, graph, x)
}

/// Data-parallel product with `width` lanes, one thread.
pub fn lanes(y: &mut [u32], graph: &CsrGraph, x: &[u32], width: LaneWidth) {
    SpmvConfig::sequential(Kernel::Lanes(width)).apply(y, graph, x)
}

/// Folds `row(i)` into every `y[i]`, optionally across the rayon pool.
///
/// `init` builds per-worker scratch state.
fn relax_rows<S, I, F>(y: &mut [u32], parallel: bool, init: I, row: F)
where
    I: Fn() -> S + Sync + Send,
    F: Fn(&mut S, usize) -> u32 + Sync + Send,
{
    if parallel {
        y.par_iter_mut()
            .enumerate()
            .with_min_len(ROWS_PER_TASK)
            .for_each_init(&init, |scratch, (i, yi)| {
                *yi = (*yi).min(row(scratch, i));
            });
    } else {
        let mut scratch = init();
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = (*yi).min(row(&mut scratch, i));
        }
    }
}

#[inline]
fn succ(x: &[u32], j: u32) -> u32 {
    x[j as usize].wrapping_add(1)
}

/// Row minimum using four independent accumulators over strided elements.
#[inline]
pub(crate) fn row_scalar(cols: &[u32], x: &[u32], inf: u32) -> u32 {
    let (mut m0, mut m1, mut m2, mut m3) = (inf, inf, inf, inf);
    let quads = cols.chunks_exact(4);
    let rest = quads.remainder();
    for q in quads {
        m0 = m0.min(succ(x, q[0]));
        m1 = m1.min(succ(x, q[1]));
        m2 = m2.min(succ(x, q[2]));
        m3 = m3.min(succ(x, q[3]));
    }
    let mut m = m0.min(m1).min(m2.min(m3));
    for &j in rest {
        m = m.min(succ(x, j));
    }
    m
}

/// Row minimum over full `B::LANES` blocks, then a scalar tail.
#[inline]
pub(crate) fn row_blocked<B: MinBlock>(cols: &[u32], x: &[u32], inf: u32) -> u32 {
    let one = B::splat(1);
    let mut acc = B::splat(inf);
    let blocks = cols.chunks_exact(B::LANES);
    let rest = blocks.remainder();
    for block in blocks {
        acc = acc.lanes_min(B::gather(x, block) + one);
    }
    let mut m = acc.reduce_min();
    for &j in rest {
        m = m.min(succ(x, j));
    }
    m
}

/// Blocked row minimum for widths without a vector type; `acc` holds one
/// running minimum per lane.
#[inline]
pub(crate) fn row_portable(cols: &[u32], x: &[u32], inf: u32, acc: &mut [u32]) -> u32 {
    let width = acc.len();
    acc.iter_mut().for_each(|a| *a = inf);
    let blocks = cols.chunks_exact(width);
    let rest = blocks.remainder();
    for block in blocks {
        for (a, &j) in acc.iter_mut().zip(block) {
            *a = (*a).min(succ(x, j));
        }
    }
    let mut m = acc.iter().copied().fold(inf, u32::min);
    for &j in rest {
        m = m.min(succ(x, j));
    }
    m
}
