//! Idempotent artifact-directory preparation.
//!
//! Either artifact directory (tables, logical forms) may hold a single
//! `*.tar.gz` bundle instead of loose per-item files. Extraction is an
//! explicit step owned by the caller, performed before any reader is
//! constructed; the read path itself never extracts. A marker file makes
//! re-runs (and racing runs that lost the extraction race) no-ops once the
//! winner has finished.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::ReadError;

const MARKER: &str = ".prepared";

/// Resolve `dir` into the effective artifact directory.
///
/// If `dir` contains a `*.tar.gz` bundle, extract it once into
/// `<dir>/<stem>.extracted/` and return that path (descending into a single
/// wrapping directory if the bundle contains one). Otherwise return `dir`
/// unchanged.
pub fn prepare_directory(dir: &Path) -> Result<PathBuf, ReadError> {
    let Some(tarball) = find_tarball(dir)? else {
        return Ok(dir.to_path_buf());
    };

    let stem = tarball
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(".tar.gz"))
        .unwrap_or("bundle")
        .to_string();
    let target = dir.join(format!("{stem}.extracted"));
    let marker = target.join(MARKER);

    if marker.exists() {
        tracing::debug!(target = %target.display(), "bundle already extracted");
        return resolve_artifact_root(&target);
    }

    tracing::info!(
        tarball = %tarball.display(),
        target = %target.display(),
        "found a bundle in the artifact directory; extracting it once"
    );
    fs::create_dir_all(&target)?;
    let file = File::open(&tarball)?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(&target)
        .map_err(|e| ReadError::Archive {
            path: tarball.clone(),
            message: e.to_string(),
        })?;
    fs::write(&marker, b"")?;

    resolve_artifact_root(&target)
}

fn find_tarball(dir: &Path) -> Result<Option<PathBuf>, ReadError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.ends_with(".tar.gz") {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Bundles commonly wrap their contents in one directory (`tables/...`).
/// If the extraction target holds exactly one subdirectory and no files
/// besides the marker, that subdirectory is the artifact root.
fn resolve_artifact_root(target: &Path) -> Result<PathBuf, ReadError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(target)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        } else if entry.file_name() != MARKER {
            return Ok(target.to_path_buf());
        }
    }
    match dirs.as_slice() {
        [single] => Ok(single.clone()),
        _ => Ok(target.to_path_buf()),
    }
}
