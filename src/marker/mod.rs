//! Project-wide injection and removal of fingerprint marker attributes.
//!
//! Both passes walk the project with the configured extensions and
//! exclusions, handle one file at a time, and record per-file failures in
//! the returned [`MarkerSummary`] instead of aborting.

pub mod inject;
pub mod strip;

use std::path::Path;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::JsxGraphConfig;
use crate::error::{Error, FileError, Result};
use crate::format::{Dialect, SourceFormatter};
use crate::persist::write_atomic;
use crate::walker::{WalkOptions, collect_files};

pub use inject::{FingerprintRecord, inject_source};
pub use strip::strip_source;

#[derive(Debug, Clone)]
pub struct MarkerOptions {
    pub attribute_name: String,
    pub walk: WalkOptions,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self::from_config(&JsxGraphConfig::default())
    }
}

impl MarkerOptions {
    pub fn from_config(config: &JsxGraphConfig) -> Self {
        Self {
            attribute_name: config.attribute_name.clone(),
            walk: config.marker_walk(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct MarkerSummary {
    pub total_files: usize,
    pub processed_files: usize,
    pub failed_files: usize,
    pub markers_added: usize,
    pub markers_removed: usize,
    /// Every marker added, in file then document order.
    pub fingerprints: Vec<FingerprintRecord>,
    pub errors: Vec<FileError>,
}

impl MarkerSummary {
    fn fail(&mut self, file: &Path, err: &Error) {
        error!("failed to process {}: {err}", file.display());
        self.failed_files += 1;
        self.errors.push(FileError::new(file, err));
    }
}

/// Add markers to every matching file under `root`.
///
/// A file is rewritten only when at least one marker was added.
pub fn inject_markers(root: &Path, options: &MarkerOptions) -> MarkerSummary {
    info!("adding markers under {} ({})", root.display(), options.attribute_name);
    let files = collect_files(root, &options.walk);
    let mut summary = MarkerSummary {
        total_files: files.len(),
        ..Default::default()
    };

    for file in &files {
        debug!("processing {}", file.display());
        match inject_file(file, &options.attribute_name) {
            Ok(records) => {
                summary.processed_files += 1;
                summary.markers_added += records.len();
                summary.fingerprints.extend(records);
            }
            Err(err) => summary.fail(file, &err),
        }
    }

    info!(
        "markers added: {} in {}/{} files ({} failed)",
        summary.markers_added, summary.processed_files, summary.total_files, summary.failed_files
    );
    summary
}

fn inject_file(path: &Path, attribute_name: &str) -> Result<Vec<FingerprintRecord>> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let injected = inject_source(path, &source, attribute_name)?;
    if !injected.records.is_empty() {
        write_atomic(path, injected.source.as_bytes())?;
    }
    Ok(injected.records)
}

/// Remove markers from every matching file under `root`.
///
/// Rewritten files go through `formatter`; if it rejects the text the
/// unformatted result is written instead.
pub fn strip_markers(
    root: &Path,
    options: &MarkerOptions,
    formatter: &dyn SourceFormatter,
) -> MarkerSummary {
    info!("removing markers under {} ({})", root.display(), options.attribute_name);
    let files = collect_files(root, &options.walk);
    let mut summary = MarkerSummary {
        total_files: files.len(),
        ..Default::default()
    };

    for file in &files {
        debug!("processing {}", file.display());
        match strip_file(file, &options.attribute_name, formatter) {
            Ok(removed) => {
                summary.processed_files += 1;
                summary.markers_removed += removed;
            }
            Err(err) => summary.fail(file, &err),
        }
    }

    info!(
        "markers removed: {} in {}/{} files ({} failed)",
        summary.markers_removed, summary.processed_files, summary.total_files, summary.failed_files
    );
    summary
}

fn strip_file(path: &Path, attribute_name: &str, formatter: &dyn SourceFormatter) -> Result<usize> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let stripped = strip_source(path, &source, attribute_name)?;
    if stripped.removed == 0 {
        return Ok(0);
    }

    let text = match formatter.format(&stripped.source, Dialect::from_path(path)) {
        Ok(formatted) => formatted,
        Err(err) => {
            warn!("{}: {err}; writing unformatted output", path.display());
            stripped.source
        }
    };
    write_atomic(path, text.as_bytes())?;
    Ok(stripped.removed)
}
