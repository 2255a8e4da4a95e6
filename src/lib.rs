//! Stable fingerprints for JSX elements, a structural graph of functions and
//! elements, context bundles for a selected element, and a text patcher for
//! change plans produced from those bundles.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod graph;
pub mod index;
pub mod marker;
pub mod parser;
pub mod patch;
pub mod persist;
pub mod query;
pub mod walker;

pub use error::{Error, Result};
