use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of directed edge between two nodes of the UI graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Parent element (or enclosing function) -> nested element.
    Contains,
    /// Enclosing function -> component tag name it instantiates.
    Renders,
    /// Element or function -> name of a function it calls.
    Calls,
    /// Element -> resource path or identifier named by `src`/`href`/`poster`/`data`.
    References,
    /// Element -> handler named by an `on*` attribute.
    BindsEvent,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Renders => "renders",
            Self::Calls => "calls",
            Self::References => "references",
            Self::BindsEvent => "binds_event",
        }
    }

    pub const ALL: [EdgeKind; 5] = [
        Self::Contains,
        Self::Renders,
        Self::Calls,
        Self::References,
        Self::BindsEvent,
    ];
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub kind: EdgeKind,
    pub source: String,
    pub target: String,
}

impl Edge {
    /// `source-kind-target`: at most one edge per triple.
    pub fn composite_id(kind: EdgeKind, source: &str, target: &str) -> String {
        format!("{source}-{kind}-{target}")
    }
}
