//! Edge stream ingestion.
//!
//! A raw edge stream is a headerless sequence of `u32` pairs in native byte
//! order. Each pair is a candidate undirected edge. Ingestion drops
//! self-loops, canonicalizes each pair to `(min, max)`, drops a pair equal
//! to the previous retained one, and enqueues both directions into
//! per-vertex FIFO buckets.
//!
//! Only *adjacent* duplicates are suppressed. The stream is expected to be
//! sorted by canonical edge; repeats further apart survive and show up twice
//! in the adjacency.

use std::convert::TryFrom;
use std::io::{ErrorKind, Read};

use byte_slice_cast::AsMutByteSlice;

use crate::error::{Error, Result};

/// Records pulled from the reader per `read` call.
const RECORDS_PER_CHUNK: usize = 8 * 1024;

/// Synthetic-graph sizing: `2^scale` vertices and `edgefactor * 2^scale` raw
/// edge records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphParams {
    scale: u32,
    edgefactor: u32,
}

impl GraphParams {
    pub const MAX_SCALE: u32 = 31;

    pub fn new(scale: u32, edgefactor: u32) -> Result<Self> {
        if scale > Self::MAX_SCALE {
            return Err(Error::ParamRange(format!(
                "SCALE {} exceeds {}",
                scale,
                Self::MAX_SCALE
            )));
        }
        let params = Self { scale, edgefactor };
        let raw = u64::from(edgefactor) << scale;
        if usize::try_from(raw).is_err() {
            return Err(Error::ParamRange(format!(
                "EDGEFACTOR {} * 2^{} records do not fit in memory",
                edgefactor, scale
            )));
        }
        Ok(params)
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn edgefactor(&self) -> u32 {
        self.edgefactor
    }

    pub fn nverts(&self) -> u32 {
        1 << self.scale
    }

    /// Number of raw records the stream must provide.
    pub fn nedges_raw(&self) -> usize {
        (self.edgefactor as usize) << self.scale
    }
}

/// Per-vertex neighbor queues filled during ingestion.
///
/// Lives only between reading the stream and building a graph format from
/// it; both builders consume it.
#[derive(Debug, Clone)]
pub struct EdgeBuckets {
    buckets: Vec<Vec<u32>>,
    nedges: usize,
    prev: Option<(u32, u32)>,
}

impl EdgeBuckets {
    pub fn new(nverts: u32) -> Self {
        Self {
            buckets: vec![Vec::new(); nverts as usize],
            nedges: 0,
            prev: None,
        }
    }

    /// Offers one raw pair. Returns whether it was retained.
    ///
    /// Panics if either endpoint is not below `nverts`.
    pub fn push(&mut self, a: u32, b: u32) -> bool {
        if a == b {
            return false;
        }
        let edge = if a < b { (a, b) } else { (b, a) };
        if self.prev == Some(edge) {
            return false;
        }
        let (lo, hi) = edge;
        self.buckets[lo as usize].push(hi);
        self.buckets[hi as usize].push(lo);
        self.nedges += 2;
        self.prev = Some(edge);
        true
    }

    pub fn nverts(&self) -> u32 {
        self.buckets.len() as u32
    }

    /// Directed edge count: twice the number of retained pairs.
    pub fn nedges(&self) -> usize {
        self.nedges
    }

    /// Neighbors enqueued so far for `v`, oldest first.
    pub fn bucket(&self, v: u32) -> &[u32] {
        &self.buckets[v as usize]
    }

    pub(crate) fn into_parts(self) -> (Vec<Vec<u32>>, usize) {
        (self.buckets, self.nedges)
    }
}

/// Reads exactly `params.nedges_raw()` records from `reader` into buckets.
///
/// Bytes past the last record are left unread.
pub fn ingest<R: Read>(mut reader: R, params: GraphParams) -> Result<EdgeBuckets> {
    let nverts = params.nverts();
    let expected = params.nedges_raw();
    let mut buckets = EdgeBuckets::new(nverts);
    let mut words = vec![0u32; 2 * RECORDS_PER_CHUNK.min(expected.max(1))];

    let mut record = 0;
    while record < expected {
        let want = (expected - record).min(words.len() / 2);
        let bytes = words[..2 * want].as_mut_byte_slice();
        let got = fill(&mut reader, bytes)?;
        let full = got / 8;
        for pair in words[..2 * full].chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            if let Some(&vertex) = [a, b].iter().find(|&&v| v >= nverts) {
                return Err(Error::VertexOutOfRange {
                    record,
                    vertex,
                    nverts,
                });
            }
            buckets.push(a, b);
            record += 1;
        }
        if full < want {
            return Err(Error::Truncated {
                expected,
                read: record,
            });
        }
    }
    Ok(buckets)
}

/// Reads until `buf` is full or the reader is exhausted; returns bytes read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
