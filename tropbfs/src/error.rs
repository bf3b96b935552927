//! Error type shared by the loaders and kernel configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading edge stream: {0}")]
    Read(#[from] io::Error),

    /// The edge stream ended before the advertised number of records.
    #[error("edge stream truncated: expected {expected} records, read {read}")]
    Truncated { expected: usize, read: usize },

    #[error("edge record {record} names vertex {vertex}, but nverts is {nverts}")]
    VertexOutOfRange {
        record: usize,
        vertex: u32,
        nverts: u32,
    },

    #[error("cannot extract SCALE and EDGEFACTOR from file name {0:?}")]
    BadPath(PathBuf),

    #[error("parameter out of range: {0}")]
    ParamRange(String),

    #[error("lane width must be positive, got {0}")]
    LaneWidth(usize),

    #[error("SELL-C-sigma needs positive sigma and 1 <= C with padded rows fitting u32, got C={chunk} sigma={sigma}")]
    ChunkSize { chunk: usize, sigma: usize },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
