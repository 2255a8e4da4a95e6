//! Element id -> source location lookup table (`fingerprints.json`).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::graph::node::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintEntry {
    pub file: String,
    pub element_name: String,
    /// Name of the function whose markup contains the element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintIndex {
    entries: BTreeMap<String, FingerprintEntry>,
}

impl FingerprintIndex {
    /// Index every element node that carries a source location.
    pub fn from_graph(store: &GraphStore) -> Self {
        let mut entries = BTreeMap::new();
        for node in store.nodes().filter(|n| n.kind == NodeKind::Element) {
            let (Some(file), Some(range)) = (&node.file_path, node.range) else {
                continue;
            };
            let component = store
                .ancestors(&node.id)
                .into_iter()
                .find(|a| a.kind == NodeKind::Function)
                .map(|f| f.name.clone());
            entries.insert(
                node.id.clone(),
                FingerprintEntry {
                    file: file.clone(),
                    element_name: node.name.clone(),
                    component,
                    line: range.start.line,
                    column: range.start.column,
                },
            );
        }
        Self { entries }
    }

    pub fn lookup(&self, id: &str) -> Result<&FingerprintEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| Error::FingerprintNotFound(id.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FingerprintEntry)> {
        self.entries.iter()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::persist::write_atomic(path, &serde_json::to_vec_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
