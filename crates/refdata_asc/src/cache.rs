//! On-disk bundle cache
//!
//! Parsing a quarter's addenda dominates cold-start latency, so each built
//! bundle is persisted to a versioned artifact in its quarter directory.
//! Reads validate the format version and the modification times of every
//! source file; any failure is a cache miss, never an error surfaced to the
//! caller. Writes are best-effort: the store logs and discards failures.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use thiserror::Error;

use crate::bundle::ReferenceBundle;
use crate::tables::code_pair_sources;

/// Cache-format version; bump when `ReferenceBundle`'s shape changes so
/// stale artifacts are rebuilt instead of misread.
pub const CACHE_VERSION: u32 = 2;

/// File name of the cache artifact inside each quarter directory
pub const CACHE_FILE_NAME: &str = "asc_ref_cache.json";

/// Reasons a cache artifact cannot be used
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache artifact not present")]
    Missing,

    #[error("cache artifact older than source file {0}")]
    Stale(String),

    #[error("cache format version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("cache i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("cache deserialization error: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Attempts to read a valid cached bundle for a quarter directory.
///
/// Validity requires: the artifact exists, no `.csv`/`.txt` source in the
/// quarter directory (nor any relevant normalized code-pair file) is newer
/// than it, and its embedded version tag matches [`CACHE_VERSION`].
pub fn read_cache(quarter_dir: &Path, data_root: &Path) -> Result<ReferenceBundle, CacheError> {
    let cache_path = quarter_dir.join(CACHE_FILE_NAME);
    if !cache_path.exists() {
        return Err(CacheError::Missing);
    }

    let cache_mtime = mtime(&cache_path)?;
    for source in source_files(quarter_dir, data_root)? {
        if mtime(&source)? > cache_mtime {
            return Err(CacheError::Stale(source.display().to_string()));
        }
    }

    let raw = fs::read(&cache_path)?;
    let bundle: ReferenceBundle = serde_json::from_slice(&raw)?;
    if bundle.cache_version != CACHE_VERSION {
        return Err(CacheError::VersionMismatch {
            found: bundle.cache_version,
            expected: CACHE_VERSION,
        });
    }
    Ok(bundle)
}

/// Persists a freshly built bundle to the quarter directory.
///
/// Callers treat failure as non-fatal (log and discard): a read-only data
/// directory must not fail the pricing request.
pub fn write_cache(quarter_dir: &Path, bundle: &ReferenceBundle) -> Result<(), CacheError> {
    let cache_path = quarter_dir.join(CACHE_FILE_NAME);
    let raw = serde_json::to_vec(bundle)?;
    fs::write(cache_path, raw)?;
    Ok(())
}

fn mtime(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Every source file whose mtime can invalidate the quarter's cache
fn source_files(
    quarter_dir: &Path,
    data_root: &Path,
) -> io::Result<Vec<std::path::PathBuf>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(quarter_dir)? {
        let path = entry?.path();
        let is_source = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if is_source {
            sources.push(path);
        }
    }
    sources.extend(code_pair_sources(data_root, quarter_dir));
    Ok(sources)
}
