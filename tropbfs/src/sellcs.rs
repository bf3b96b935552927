//! SELL-C-sigma: sliced ELLPACK with sigma-window degree sorting.
//!
//! Vertices are renumbered so that, inside each window of `sigma`
//! consecutive ids, higher-degree rows come first. Renumbered rows are then
//! cut into chunks of `C`; each chunk is stored column-major and padded to
//! its longest row, so one SpMV step on a chunk is `C` lane-wise minima.
//!
//! Padding entries point at a dedicated slot one past the last (padded)
//! row. That slot always holds `nverts`, and `1 + nverts` never beats a
//! stored distance, so padding is the min-plus identity.
//!
//! Distances computed here live in the internal numbering; run them through
//! [`SellCSigma::depermute`] before comparing with CSR results.

use std::cmp::Reverse;
use std::convert::TryFrom;

use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;
use wide::{u32x4, u32x8};

use crate::edges::EdgeBuckets;
use crate::error::{Error, Result};
use crate::spmv::MinBlock;

pub struct SellCSigma {
    chunk: usize,
    sigma: usize,
    nverts: u32,
    nedges: usize,
    /// `chunk_offsets[c]..chunk_offsets[c + 1]` is chunk `c` in `cols`.
    chunk_offsets: Box<[usize]>,
    cols: Box<[u32]>,
    /// `perm[new] = old`
    perm: Box<[u32]>,
    /// `old2new[old] = new`
    old2new: Box<[u32]>,
}

impl SellCSigma {
    /// Builds from ingested buckets.
    ///
    /// Neighbor order inside each row follows bucket order, as in CSR.
    pub fn from_buckets(buckets: EdgeBuckets, chunk: usize, sigma: usize) -> Result<Self> {
        if chunk == 0 || sigma == 0 || chunk > u32::MAX as usize {
            return Err(Error::ChunkSize { chunk, sigma });
        }
        let (lists, nedges) = buckets.into_parts();
        let n = lists.len();
        let nchunks = n / chunk + usize::from(n % chunk != 0);
        // the padding slot index must itself be a u32
        let pad = match nchunks
            .checked_mul(chunk)
            .and_then(|rows| u32::try_from(rows).ok())
        {
            Some(pad) => pad,
            None => return Err(Error::ChunkSize { chunk, sigma }),
        };

        let mut perm: Vec<u32> = (0..n as u32).collect();
        for window in perm.chunks_mut(sigma) {
            // stable, so equal degrees keep their original order
            window.sort_by_key(|&v| Reverse(lists[v as usize].len()));
        }
        let mut old2new = vec![0u32; n];
        for (new, &old) in perm.iter().enumerate() {
            old2new[old as usize] = new as u32;
        }

        let mut chunk_offsets = Vec::with_capacity(nchunks + 1);
        chunk_offsets.push(0);
        for rows in perm.chunks(chunk) {
            let width = rows
                .iter()
                .map(|&old| lists[old as usize].len())
                .max()
                .unwrap_or(0);
            let last = chunk_offsets[chunk_offsets.len() - 1];
            chunk_offsets.push(last + width * chunk);
        }

        let mut cols = vec![pad; chunk_offsets[nchunks]];
        for (c, rows) in perm.chunks(chunk).enumerate() {
            let base = chunk_offsets[c];
            for (lane, &old) in rows.iter().enumerate() {
                for (k, &nbr) in lists[old as usize].iter().enumerate() {
                    cols[base + k * chunk + lane] = old2new[nbr as usize];
                }
            }
        }

        Ok(Self {
            chunk,
            sigma,
            nverts: n as u32,
            nedges,
            chunk_offsets: chunk_offsets.into_boxed_slice(),
            cols: cols.into_boxed_slice(),
            perm: perm.into_boxed_slice(),
            old2new: old2new.into_boxed_slice(),
        })
    }

    pub fn chunk(&self) -> usize {
        self.chunk
    }

    pub fn sigma(&self) -> usize {
        self.sigma
    }

    pub fn nvertices(&self) -> usize {
        self.nverts as usize
    }

    /// Directed edge count, excluding padding.
    pub fn nedges(&self) -> usize {
        self.nedges
    }

    pub fn nchunks(&self) -> usize {
        self.chunk_offsets.len() - 1
    }

    /// Stored column slots, padding included.
    pub fn nslots(&self) -> usize {
        self.cols.len()
    }

    /// Length of an internal distance vector: padded rows plus the padding
    /// slot.
    pub fn padded_len(&self) -> usize {
        self.nchunks() * self.chunk + 1
    }

    /// `perm()[new]` is the canonical id of internal row `new`.
    pub fn perm(&self) -> &[u32] {
        &self.perm
    }

    /// Internal id of canonical vertex `v`.
    pub fn to_internal(&self, v: u32) -> u32 {
        self.old2new[v as usize]
    }

    /// Canonical ids of the neighbors of internal row `row`, in storage
    /// order.
    pub fn neighbors(&self, row: u32) -> Vec<u32> {
        let row = row as usize;
        let (c, lane) = (row / self.chunk, row % self.chunk);
        let pad = (self.padded_len() - 1) as u32;
        self.cols[self.chunk_offsets[c]..self.chunk_offsets[c + 1]]
            .iter()
            .skip(lane)
            .step_by(self.chunk)
            .take_while(|&&j| j != pad)
            .map(|&j| self.perm[j as usize])
            .collect()
    }

    /// Accumulates one min-plus product into `y` from `x`, both internal
    /// and `padded_len()` long.
    ///
    /// The last slot of `x` is the padding slot and must hold `nverts`;
    /// any smaller value leaks into rows through their padding.
    pub fn spmv(&self, y: &mut [u32], x: &[u32], parallel: bool) {
        let len = self.padded_len();
        assert_eq!(y.len(), len, "output must be padded_len long");
        assert_eq!(x.len(), len, "input must be padded_len long");
        debug_assert_eq!(x[len - 1], self.nverts, "padding slot must hold nverts");
        let rows = &mut y[..len - 1];
        match self.chunk {
            4 => self.relax_chunks(rows, parallel, |c, out| {
                self.chunk_blocked::<u32x4>(c, x, out)
            }),
            8 => self.relax_chunks(rows, parallel, |c, out| {
                self.chunk_blocked::<u32x8>(c, x, out)
            }),
            _ => self.relax_chunks(rows, parallel, |c, out| {
                self.chunk_portable(c, x, out)
            }),
        }
    }

    fn relax_chunks<F>(&self, rows: &mut [u32], parallel: bool, relax: F)
    where
        F: Fn(usize, &mut [u32]) + Sync + Send,
    {
        if parallel {
            rows.par_chunks_mut(self.chunk)
                .enumerate()
                .for_each(|(c, out)| relax(c, out));
        } else {
            for (c, out) in rows.chunks_mut(self.chunk).enumerate() {
                relax(c, out);
            }
        }
    }

    #[inline]
    fn chunk_blocked<B: MinBlock>(&self, c: usize, x: &[u32], out: &mut [u32]) {
        let one = B::splat(1);
        let mut acc = B::load(out);
        let slots = &self.cols[self.chunk_offsets[c]..self.chunk_offsets[c + 1]];
        for column in slots.chunks_exact(B::LANES) {
            acc = acc.lanes_min(B::gather(x, column) + one);
        }
        acc.store(out);
    }

    #[inline]
    fn chunk_portable(&self, c: usize, x: &[u32], out: &mut [u32]) {
        let slots = &self.cols[self.chunk_offsets[c]..self.chunk_offsets[c + 1]];
        for column in slots.chunks_exact(self.chunk) {
            for (o, &j) in out.iter_mut().zip(column) {
                *o = (*o).min(x[j as usize].wrapping_add(1));
            }
        }
    }

    /// Fixpoint BFS from canonical vertex `source`.
    ///
    /// Returns internal, padded distances; an out-of-range source yields
    /// all `nverts`.
    pub fn bfs(&self, source: u32, parallel: bool) -> Vec<u32> {
        let len = self.padded_len();
        let mut dists = vec![self.nverts; len];
        if source >= self.nverts {
            return dists;
        }
        dists[self.to_internal(source) as usize] = 0;
        let mut prev = vec![0u32; len];
        while dists != prev {
            prev.copy_from_slice(&dists);
            self.spmv(&mut dists, &prev, parallel);
        }
        dists
    }

    /// Maps internal distances back to canonical order, dropping padding.
    pub fn depermute(&self, internal: &[u32]) -> Vec<u32> {
        assert!(internal.len() >= self.nvertices());
        let mut out = vec![0u32; self.nvertices()];
        for (new, &old) in self.perm.iter().enumerate() {
            out[old as usize] = internal[new];
        }
        out
    }
}
