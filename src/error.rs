use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the fingerprint, graph and patch layers.
///
/// Batch operations (`inject_markers`, `strip_markers`, `build_all`,
/// `apply_plan`) never surface these for a single failing unit; they record
/// the message in their summary and move on.
#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be parsed without syntax errors.
    #[error("parse error in {path}: unexpected syntax at {line}:{column}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(PathBuf),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("fingerprint not found: {0}")]
    FingerprintNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// An `old` snippet of a change plan is not present in the file.
    #[error("snippet not found in {file}: {snippet:?}")]
    PatchMismatch { file: PathBuf, snippet: String },

    /// The formatter rejected the rewritten source.
    #[error("formatter ({dialect}) failed: {message}")]
    Format { dialect: String, message: String },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid change plan: {0}")]
    InvalidPlan(String),

    /// A plan step names a file outside the project root.
    #[error("path is outside the project root: {0}")]
    OutsideRoot(String),

    #[error("failed to load grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A per-file failure recorded by a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

impl FileError {
    pub fn new(file: &Path, error: &impl fmt::Display) -> Self {
        Self {
            file: file.to_string_lossy().into_owned(),
            error: error.to_string(),
        }
    }
}
