/// Persistence of the merged fallback dataset.
///
/// The document is serialized in full before anything touches the disk, and
/// then written next to the target and renamed over it. A failed run
/// therefore leaves any previous file untouched.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{FallbackDocument, MergedEntry, OutputError};

/// Assembles the output document. `BTreeSet` iteration gives the sorted
/// source list.
pub fn build_document(used_sources: BTreeSet<String>, data: Vec<MergedEntry>) -> FallbackDocument {
    FallbackDocument {
        used_sources: used_sources.into_iter().collect(),
        data,
    }
}

/// Serializes to compact JSON. Non-ASCII characters (e.g. "Météo-France")
/// are written as UTF-8, not escaped.
pub fn to_json_bytes(document: &FallbackDocument) -> Result<Vec<u8>, OutputError> {
    Ok(serde_json::to_vec(document)?)
}

/// Writes the document to `path`, replacing any existing file.
pub fn write_fallback(path: impl AsRef<Path>, document: &FallbackDocument) -> Result<(), OutputError> {
    let path = path.as_ref();
    let bytes = to_json_bytes(document)?;
    let tmp = temp_path(path);
    let io_err = |err: std::io::Error| OutputError::Io {
        path: path.display().to_string(),
        err,
    };

    fs::write(&tmp, &bytes).map_err(io_err)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(err));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
