use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The kind of a graph node. Only `Function` and `Element` are produced by
/// the builder; `Variable` is what an edge endpoint placeholder starts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Function,
    Element,
    Variable,
    Prop,
    File,
    Api,
}

/// 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    pub fn of(node: tree_sitter::Node) -> Self {
        let (s, e) = (node.start_position(), node.end_position());
        Self {
            start: Position {
                line: s.row + 1,
                column: s.column,
            },
            end: Position {
                line: e.row + 1,
                column: e.column,
            },
        }
    }
}

/// Ids of the edges incident on a node, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency {
    pub incoming: Vec<String>,
    pub outgoing: Vec<String>,
}

/// A function/component declaration or a concrete UI element instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snippet: Option<String>,
    /// Attribute name to literal or symbolic value, in source order (elements only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub edges: Adjacency,
}

/// The optional attributes accepted by `GraphStore::add_node`.
#[derive(Debug, Clone, Default)]
pub struct NodeAttrs {
    pub name: Option<String>,
    pub kind: Option<NodeKind>,
    pub file_path: Option<String>,
    pub range: Option<SourceRange>,
    pub source_snippet: Option<String>,
    pub props: Option<IndexMap<String, String>>,
}

impl Node {
    /// Build a node record; missing attributes fall back to the id as name
    /// and `Variable` as kind.
    pub fn new(id: &str, attrs: NodeAttrs) -> Self {
        Self {
            id: id.to_owned(),
            name: attrs.name.unwrap_or_else(|| id.to_owned()),
            kind: attrs.kind.unwrap_or(NodeKind::Variable),
            file_path: attrs.file_path,
            range: attrs.range,
            source_snippet: attrs.source_snippet,
            props: attrs.props,
            edges: Adjacency::default(),
        }
    }

    /// True for nodes that only exist because an edge pointed at them.
    pub fn is_placeholder(&self) -> bool {
        self.file_path.is_none() && self.range.is_none()
    }
}
