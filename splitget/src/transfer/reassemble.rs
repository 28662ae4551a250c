//! Ordered reassembly of chunk files into the final artifact.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::error::{TransferError, TransferResult};
use super::fetcher::ChunkResult;

/// The merged artifact, still inside the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Local path of the complete artifact.
    pub path: PathBuf,
    /// Total bytes in the artifact.
    pub bytes: u64,
}

/// Concatenate `chunks` in ascending range order into `temp_dir/target_name`.
///
/// Each chunk file is deleted as soon as it has been copied. On failure the
/// error is returned and whatever is left in `temp_dir` stays for inspection.
pub fn merge(
    mut chunks: Vec<ChunkResult>,
    temp_dir: &Path,
    target_name: &str,
) -> TransferResult<TransferOutcome> {
    chunks.sort_by_key(|chunk| chunk.range.start);

    let path = temp_dir.join(target_name);
    let merge_error = |source: io::Error| TransferError::Merge {
        path: path.clone(),
        source,
    };

    let output = File::create(&path).map_err(merge_error)?;
    let mut writer = BufWriter::new(output);
    let mut bytes = 0u64;

    for chunk in &chunks {
        let mut part = File::open(&chunk.path).map_err(merge_error)?;
        bytes += io::copy(&mut part, &mut writer).map_err(merge_error)?;
        drop(part);
        fs::remove_file(&chunk.path).map_err(merge_error)?;
    }

    writer.flush().map_err(merge_error)?;

    info!(path = %path.display(), chunks = chunks.len(), bytes, "chunks merged");
    Ok(TransferOutcome { path, bytes })
}
