use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::graph::edge::EdgeKind;
use crate::graph::node::Node;

/// Render the text bundle handed to a reasoning agent for element `id`.
///
/// Sections, in order: the user intent, the target node, its containment
/// ancestors (nearest first, at most [`crate::graph::MAX_ANCESTOR_DEPTH`]),
/// the functions it calls, and the resources it references. Each node is
/// printed as its snippet (or name), id and file. A referenced target with
/// no node of its own is printed as the literal itself.
///
/// # Errors
/// [`Error::NodeNotFound`] if `id` is not in the graph.
pub fn assemble_context(store: &GraphStore, id: &str, intent: &str) -> Result<String> {
    let node = store
        .node(id)
        .ok_or_else(|| Error::NodeNotFound(id.to_owned()))?;

    let mut out = format!("User intent: {intent}\n\n");
    push_node(&mut out, "Main element", node);

    for (depth, parent) in store.ancestors(id).into_iter().enumerate() {
        let label = match depth {
            0 => "Parent element".to_owned(),
            n => format!("Parent (level {}) element", n + 1),
        };
        push_node(&mut out, &label, parent);
    }

    for edge in store.outgoing(id, EdgeKind::Calls) {
        if let Some(callee) = store.node(&edge.target) {
            push_node(&mut out, "Calls", callee);
        }
    }

    for edge in store.outgoing(id, EdgeKind::References) {
        match store.node(&edge.target) {
            Some(target) => push_node(&mut out, "Uses", target),
            None => {
                let _ = write!(out, "Uses: {0}\nid: {0}\n\n", edge.target);
            }
        }
    }

    Ok(out.trim().to_owned())
}

fn push_node(out: &mut String, label: &str, node: &Node) {
    let text = node.source_snippet.as_deref().unwrap_or(&node.name);
    let file = node.file_path.as_deref().unwrap_or("unknown");
    let _ = write!(out, "{label}: {text}\nid: {}\nFile: {file}\n\n", node.id);
}
