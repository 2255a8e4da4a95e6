pub mod builder;
pub mod edge;
pub mod node;

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use edge::{Edge, EdgeKind};
use node::{Node, NodeAttrs, NodeKind};

/// Upper bound on how many `contains` levels [`GraphStore::ancestors`] climbs.
pub const MAX_ANCESTOR_DEPTH: usize = 20;

/// The in-memory UI graph: nodes and edges in insertion order with O(1) id lookup.
///
/// Single owner, single thread. Builders take it by `&mut` and it is rebuilt
/// wholesale (after [`GraphStore::clear`]) rather than patched.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<String, usize>,
}

/// On-disk shape: `{"nodes": [[id, node], ...], "edges": [[id, edge], ...]}`.
#[derive(Serialize)]
struct SerializedGraphRef<'a> {
    nodes: Vec<(&'a str, &'a Node)>,
    edges: Vec<(&'a str, &'a Edge)>,
}

#[derive(Deserialize)]
struct SerializedGraph {
    nodes: Vec<(String, Node)>,
    edges: Vec<(String, Edge)>,
}

/// Node and edge counts broken down by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub functions: usize,
    pub elements: usize,
    pub placeholders: usize,
    pub edges_by_kind: Vec<(EdgeKind, usize)>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless one with this id already exists.
    ///
    /// First writer wins: a later call never overwrites an existing record and
    /// never upgrades a placeholder created by [`GraphStore::add_edge`].
    /// Returns `true` if the node was inserted.
    pub fn add_node(&mut self, id: &str, attrs: Option<NodeAttrs>) -> bool {
        if self.node_index.contains_key(id) {
            return false;
        }
        self.node_index.insert(id.to_owned(), self.nodes.len());
        self.nodes.push(Node::new(id, attrs.unwrap_or_default()));
        true
    }

    /// Insert the edge `source-kind-target` unless it already exists.
    ///
    /// Both endpoints are created as placeholder nodes if missing, and the
    /// edge id is appended to the source's `outgoing` and the target's
    /// `incoming` lists. Re-adding an existing edge changes nothing.
    /// Returns `true` if the edge was inserted.
    pub fn add_edge(&mut self, kind: EdgeKind, source: &str, target: &str) -> bool {
        let id = Edge::composite_id(kind, source, target);
        if self.edge_index.contains_key(&id) {
            return false;
        }

        self.add_node(source, None);
        self.add_node(target, None);

        if let Some(&i) = self.node_index.get(source) {
            self.nodes[i].edges.outgoing.push(id.clone());
        }
        if let Some(&i) = self.node_index.get(target) {
            self.nodes[i].edges.incoming.push(id.clone());
        }

        self.edge_index.insert(id.clone(), self.edges.len());
        self.edges.push(Edge {
            id,
            kind,
            source: source.to_owned(),
            target: target.to_owned(),
        });
        true
    }

    /// Drop every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.node_index.clear();
        self.edges.clear();
        self.edge_index.clear();
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).map(|&i| &self.edges[i])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Incoming edges of `id` with the given kind, in adjacency order.
    pub fn incoming(&self, id: &str, kind: EdgeKind) -> Vec<&Edge> {
        self.node(id)
            .map(|n| self.resolve_edges(&n.edges.incoming, kind))
            .unwrap_or_default()
    }

    /// Outgoing edges of `id` with the given kind, in adjacency order.
    pub fn outgoing(&self, id: &str, kind: EdgeKind) -> Vec<&Edge> {
        self.node(id)
            .map(|n| self.resolve_edges(&n.edges.outgoing, kind))
            .unwrap_or_default()
    }

    /// Containment chain above `id`, nearest first.
    ///
    /// Follows the first incoming `contains` edge at each level. Stops at a
    /// root, at a parent id with no node, or after [`MAX_ANCESTOR_DEPTH`]
    /// levels, so a cyclic graph still terminates.
    pub fn ancestors(&self, id: &str) -> Vec<&Node> {
        let mut chain = Vec::new();
        let mut current = id;
        while chain.len() < MAX_ANCESTOR_DEPTH {
            let Some(edge) = self.incoming(current, EdgeKind::Contains).into_iter().next() else {
                break;
            };
            let Some(parent) = self.node(&edge.source) else {
                break;
            };
            chain.push(parent);
            current = &parent.id;
        }
        chain
    }

    fn resolve_edges(&self, ids: &[String], kind: EdgeKind) -> Vec<&Edge> {
        ids.iter()
            .filter_map(|e| self.edge(e))
            .filter(|e| e.kind == kind)
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let count = |k: NodeKind| self.nodes.iter().filter(|n| n.kind == k).count();
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            functions: count(NodeKind::Function),
            elements: count(NodeKind::Element),
            placeholders: self.nodes.iter().filter(|n| n.is_placeholder()).count(),
            edges_by_kind: EdgeKind::ALL
                .iter()
                .map(|&k| (k, self.edges.iter().filter(|e| e.kind == k).count()))
                .collect(),
        }
    }

    /// Serialize to pretty JSON, preserving insertion order.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let doc = SerializedGraphRef {
            nodes: self.nodes.iter().map(|n| (n.id.as_str(), n)).collect(),
            edges: self.edges.iter().map(|e| (e.id.as_str(), e)).collect(),
        };
        Ok(serde_json::to_vec_pretty(&doc)?)
    }

    /// Rebuild a store from [`GraphStore::serialize`] output. Records are
    /// taken as-is, adjacency lists included; a repeated id keeps its first entry.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let doc: SerializedGraph = serde_json::from_slice(bytes)?;
        let mut store = Self::new();
        for (id, node) in doc.nodes {
            if store.node_index.contains_key(&id) {
                continue;
            }
            store.node_index.insert(id, store.nodes.len());
            store.nodes.push(node);
        }
        for (id, edge) in doc.edges {
            if store.edge_index.contains_key(&id) {
                continue;
            }
            store.edge_index.insert(id, store.edges.len());
            store.edges.push(edge);
        }
        Ok(store)
    }

    /// Write the serialized graph to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::persist::write_atomic(path, &self.serialize()?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::deserialize(&bytes)
    }

    /// Human-readable adjacency listing: one block per node, one line per
    /// outgoing edge.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            let _ = writeln!(out, "{} {} (id: {})", node.kind_label(), node.name, node.id);
            if node.edges.outgoing.is_empty() {
                let _ = writeln!(out, "   (no outgoing edges)");
            }
            for edge in node.edges.outgoing.iter().filter_map(|e| self.edge(e)) {
                let target = self
                    .node(&edge.target)
                    .map(|t| t.name.as_str())
                    .unwrap_or("unknown");
                let _ = writeln!(
                    out,
                    "   {:<12} -> {} (id: {})",
                    edge.kind.as_str(),
                    target,
                    edge.target
                );
            }
            out.push('\n');
        }
        out
    }
}

impl Node {
    fn kind_label(&self) -> &'static str {
        match self.kind {
            NodeKind::Function => "fn",
            NodeKind::Element => "el",
            NodeKind::Variable => "var",
            NodeKind::Prop => "prop",
            NodeKind::File => "file",
            NodeKind::Api => "api",
        }
    }
}
