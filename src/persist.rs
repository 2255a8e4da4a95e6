use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Serialized graph file name within the output directory.
pub const GRAPH_FILE: &str = "graph.json";
/// Fingerprint index file name within the output directory.
pub const INDEX_FILE: &str = "fingerprints.json";

/// Replace `path` with `contents` atomically.
///
/// Writes to a temp file in the same directory, then renames over the
/// target, so a crash never leaves a half-written source file behind.
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(contents).map_err(|e| Error::io(path, e))?;
    tmp.as_file().flush().map_err(|e| Error::io(path, e))?;
    // Temp files are created 0600; keep the mode of the file being replaced.
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| Error::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}
