//! Edge file reading and writing.
//!
//! Edge files are named `SCALE_EDGEFACTOR_<anything>`; the two leading
//! `.`/`_`-separated integers of the base name size the graph.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use bstr::ByteSlice;
use byte_slice_cast::AsByteSlice;
use serde_json::json;

use crate::edges::{self, GraphParams};
use crate::error::{Error, Result};
use crate::graph::CsrGraph;
use crate::sellcs::SellCSigma;

const BUFSIZE: usize = 64 * 1024;
const WORDS_PER_WRITE: usize = BUFSIZE / 4;

/// Parses SCALE and EDGEFACTOR out of a file name such as `20_16_kron.bin`.
pub fn params_from_path(path: &Path) -> Result<GraphParams> {
    let bad = || Error::BadPath(path.to_path_buf());
    let name = path.file_name().ok_or_else(bad)?;
    let name = <[u8]>::from_path(Path::new(name)).ok_or_else(bad)?;
    let mut fields = name
        .fields_with(|c| c == '.' || c == '_')
        .map(|f| f.to_str().ok().and_then(|s| s.parse::<u32>().ok()));
    match (fields.next(), fields.next()) {
        (Some(Some(scale)), Some(Some(edgefactor))) => GraphParams::new(scale, edgefactor),
        _ => Err(bad()),
    }
}

/// Settles graph parameters from explicit values and the file name.
///
/// Explicit values win. Any value not given is taken from the file name,
/// and a disagreement between the two is logged.
pub fn resolve_params(
    path: &Path,
    scale: Option<u32>,
    edgefactor: Option<u32>,
) -> Result<GraphParams> {
    if let (Some(scale), Some(edgefactor)) = (scale, edgefactor) {
        let params = GraphParams::new(scale, edgefactor)?;
        if let Ok(named) = params_from_path(path) {
            if named != params {
                println!(
                    "{}",
                    json!({
                        "warning": "explicit SCALE/EDGEFACTOR disagree with file name",
                        "path": path.display().to_string(),
                        "explicit": [params.scale(), params.edgefactor()],
                        "file_name": [named.scale(), named.edgefactor()],
                    })
                );
            }
        }
        return Ok(params);
    }
    let named = params_from_path(path)?;
    GraphParams::new(
        scale.unwrap_or_else(|| named.scale()),
        edgefactor.unwrap_or_else(|| named.edgefactor()),
    )
}

pub fn open_edges(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(BufReader::with_capacity(BUFSIZE, file))
}

fn ingest_file(path: &Path, params: GraphParams) -> Result<(edges::EdgeBuckets, String)> {
    let start = Instant::now();
    let buckets = edges::ingest(open_edges(path)?, params)?;
    let ingest_time = format!("{:.0?}", Instant::now().duration_since(start));
    Ok((buckets, ingest_time))
}

/// Reads an edge file into a CSR graph.
pub fn read_csr(path: &Path, params: GraphParams) -> Result<CsrGraph> {
    let (buckets, ingest_time) = ingest_file(path, params)?;
    let build_start = Instant::now();
    let graph = CsrGraph::from_buckets(buckets);
    let build_time = format!("{:.0?}", Instant::now().duration_since(build_start));

    println!(
        "{}",
        json!({
            "format": "csr",
            "ingest_time": ingest_time,
            "build_time": build_time,
            "nvertices": graph.nvertices(),
            "nedges": graph.nedges(),
        })
    );
    Ok(graph)
}

/// Reads an edge file into SELL-C-sigma with chunk `chunk` and sorting
/// window `sigma`.
pub fn read_sellcs(
    path: &Path,
    params: GraphParams,
    chunk: usize,
    sigma: usize,
) -> Result<SellCSigma> {
    let (buckets, ingest_time) = ingest_file(path, params)?;
    let build_start = Instant::now();
    let graph = SellCSigma::from_buckets(buckets, chunk, sigma)?;
    let build_time = format!("{:.0?}", Instant::now().duration_since(build_start));

    println!(
        "{}",
        json!({
            "format": "sellcs",
            "ingest_time": ingest_time,
            "build_time": build_time,
            "chunk": chunk,
            "sigma": sigma,
            "nvertices": graph.nvertices(),
            "nedges": graph.nedges(),
            "nslots": graph.nslots(),
        })
    );
    Ok(graph)
}

/// Writes pairs as a raw native-endian edge stream.
pub fn write_edges<I>(path: &Path, edges: I) -> Result<()>
where
    I: IntoIterator<Item = (u32, u32)>,
{
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::with_capacity(BUFSIZE, file);
    let mut words: Vec<u32> = Vec::with_capacity(WORDS_PER_WRITE);
    let flush = |words: &mut Vec<u32>, writer: &mut BufWriter<File>| {
        let res = writer.write_all(words[..].as_byte_slice());
        words.clear();
        res.map_err(|e| Error::io(path, e))
    };
    for (u, v) in edges {
        words.push(u);
        words.push(v);
        if words.len() >= WORDS_PER_WRITE {
            flush(&mut words, &mut writer)?;
        }
    }
    flush(&mut words, &mut writer)?;
    writer.flush().map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    #[test]
    fn parses_leading_fields() {
        let p = params_from_path(Path::new("/data/graphs/20_16_kron.bin")).unwrap();
        assert_eq!((p.scale(), p.edgefactor()), (20, 16));
        let p = params_from_path(Path::new("5.8.edges")).unwrap();
        assert_eq!((p.scale(), p.edgefactor()), (5, 8));
        let p = params_from_path(Path::new("3_2")).unwrap();
        assert_eq!(p.nedges_raw(), 16);
    }

    #[test]
    fn rejects_bad_names() {
        for name in &["kron_20_16.bin", "20.bin", "20", "", "/", "20_x_y"] {
            assert!(
                matches!(params_from_path(Path::new(name)), Err(Error::BadPath(_))),
                "{:?}",
                name
            );
        }
        assert!(matches!(
            params_from_path(Path::new("40_1_big")),
            Err(Error::ParamRange(_))
        ));
        assert!(params_from_path(Path::new("99999999999_1")).is_err());
    }

    #[test]
    fn resolve_prefers_explicit_values() {
        let path = PathBuf::from("4_8_rmat.bin");
        let p = resolve_params(&path, Some(3), Some(2)).unwrap();
        assert_eq!((p.scale(), p.edgefactor()), (3, 2));
        let p = resolve_params(&path, None, Some(2)).unwrap();
        assert_eq!((p.scale(), p.edgefactor()), (4, 2));
        let p = resolve_params(&path, None, None).unwrap();
        assert_eq!((p.scale(), p.edgefactor()), (4, 8));

        let unnamed = PathBuf::from("edges.bin");
        assert!(resolve_params(&unnamed, Some(3), Some(2)).is_ok());
        assert!(resolve_params(&unnamed, Some(3), None).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2_2_missing.bin");
        let params = params_from_path(&path).unwrap();
        match read_csr(&path, params) {
            Err(Error::Io { path: p, .. }) => assert_eq!(p, path),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("read a graph from nothing"),
        }
    }

    #[test]
    fn written_edges_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2_1_small.bin");
        write_edges(&path, vec![(0, 1), (1, 0), (2, 1), (3, 3)]).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 32);

        let g = read_csr(&path, params_from_path(&path).unwrap()).unwrap();
        assert_eq!(g.offsets(), &[0, 1, 3, 4, 4]);
        assert_eq!(g.col_indices(), &[1, 0, 2, 1]);
    }

    #[test]
    fn short_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3_1_short.bin");
        write_edges(&path, vec![(0, 1); 5]).unwrap();
        let params = params_from_path(&path).unwrap();
        assert!(matches!(
            read_csr(&path, params),
            Err(Error::Truncated {
                expected: 8,
                read: 5
            })
        ));
        assert!(read_sellcs(&path, params, 4, 1).is_err());
    }
}
