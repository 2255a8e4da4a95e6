//! Single-pass structural analysis of one source file into the [`GraphStore`].
//!
//! The walk is depth-first over an explicit work stack. The enclosing
//! function and element context lives on a frame stack that is pushed on
//! entry and popped on exit of each declaration/element subtree, so nested
//! functions and sibling elements never see stale context.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, error, info};
use tree_sitter::Node;

use crate::error::{Error, FileError, Result};
use crate::fingerprint::positional_fingerprint;
use crate::graph::GraphStore;
use crate::graph::edge::EdgeKind;
use crate::graph::node::{NodeAttrs, NodeKind, SourceRange};
use crate::parser::syntax::{AttrValue, ElementSyntax, FunctionDecl, Syntax, classify, named_children};
use crate::parser::{node_text, parse_source};

/// Attributes whose value names an external resource.
const RESOURCE_ATTRIBUTES: &[&str] = &["src", "href", "poster", "data"];

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Marker attribute read as the element id. Elements without it get a
    /// positional fingerprint computed on the fly, which equals the id the
    /// injector would assign to the same unedited file.
    pub attribute_name: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            attribute_name: "data-fingerprint".to_owned(),
        }
    }
}

/// Outcome of [`build_all`].
#[derive(Debug, Default, Serialize)]
pub struct BuildSummary {
    pub total_files: usize,
    pub built_files: usize,
    pub failed_files: usize,
    pub errors: Vec<FileError>,
}

enum Frame {
    Function(String),
    Element(String),
}

impl Frame {
    fn id(&self) -> &str {
        match self {
            Frame::Function(id) | Frame::Element(id) => id,
        }
    }
}

struct Builder<'a> {
    store: &'a mut GraphStore,
    source: &'a [u8],
    file: String,
    attribute_name: &'a str,
    frames: Vec<Frame>,
}

/// Build every file in order. A file that fails to read or parse contributes
/// nothing; the error is logged and recorded and the next file is processed.
pub fn build_all(store: &mut GraphStore, files: &[impl AsRef<Path>], options: &BuildOptions) -> BuildSummary {
    let mut summary = BuildSummary {
        total_files: files.len(),
        ..Default::default()
    };

    for file in files {
        let file = file.as_ref();
        match build_file(store, file, options) {
            Ok(()) => summary.built_files += 1,
            Err(err) => {
                error!("error processing {}: {err}", file.display());
                summary.failed_files += 1;
                summary.errors.push(FileError::new(file, &err));
            }
        }
    }

    info!(
        "graph built: {} nodes, {} edges from {}/{} files",
        store.node_count(),
        store.edge_count(),
        summary.built_files,
        summary.total_files
    );
    summary
}

pub fn build_file(store: &mut GraphStore, path: &Path, options: &BuildOptions) -> Result<()> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    build_source(store, path, &source, options)
}

/// Analyse `source` (the contents of `path`) and add its nodes and edges to `store`.
///
/// Parsing happens before anything is inserted, so a parse error leaves the
/// store untouched.
pub fn build_source(
    store: &mut GraphStore,
    path: &Path,
    source: &str,
    options: &BuildOptions,
) -> Result<()> {
    let parsed = parse_source(path, source)?;
    let before = (store.node_count(), store.edge_count());

    let mut builder = Builder {
        store,
        source: parsed.bytes(),
        file: path.to_string_lossy().into_owned(),
        attribute_name: &options.attribute_name,
        frames: Vec::new(),
    };
    builder.visit(parsed.root());

    debug!(
        "{}: +{} nodes, +{} edges",
        path.display(),
        builder.store.node_count() - before.0,
        builder.store.edge_count() - before.1
    );
    Ok(())
}

/// Work item of the depth-first walk.
enum Step<'t> {
    Enter(Node<'t>),
    /// Pop the frame pushed when the matching declaration or element was entered.
    Exit,
}

impl Builder<'_> {
    /// Depth-first pre-order walk on an explicit stack, so arbitrarily deep
    /// expressions cannot exhaust the thread stack.
    fn visit(&mut self, root: Node) {
        let mut work = vec![Step::Enter(root)];
        while let Some(step) = work.pop() {
            let node = match step {
                Step::Enter(node) => node,
                Step::Exit => {
                    self.frames.pop();
                    continue;
                }
            };

            match classify(node, self.source) {
                Syntax::Function(decl) => {
                    let id = self.add_function(&decl);
                    self.frames.push(Frame::Function(id));
                    work.push(Step::Exit);
                }
                Syntax::Element(element) => {
                    let id = self.add_element(&element);
                    self.frames.push(Frame::Element(id));
                    work.push(Step::Exit);
                }
                Syntax::Call { callee } => {
                    // Innermost enclosing element or function.
                    if let Some(frame) = self.frames.last() {
                        let caller = frame.id().to_owned();
                        self.store.add_edge(EdgeKind::Calls, &caller, &callee);
                    }
                }
                Syntax::Other => {}
            }

            let children = named_children(node);
            work.extend(children.into_iter().rev().map(Step::Enter));
        }
    }

    fn enclosing_function(&self) -> Option<&str> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Function(id) => Some(id.as_str()),
            Frame::Element(_) => None,
        })
    }

    fn enclosing_element(&self) -> Option<&str> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Element(id) => Some(id.as_str()),
            Frame::Function(_) => None,
        })
    }

    fn add_function(&mut self, decl: &FunctionDecl) -> String {
        let range = SourceRange::of(decl.node);
        let id = positional_fingerprint(&self.file, range.start.line, range.start.column);
        self.store.add_node(
            &id,
            Some(NodeAttrs {
                name: Some(decl.name.clone()),
                kind: Some(NodeKind::Function),
                file_path: Some(self.file.clone()),
                range: Some(range),
                source_snippet: Some(node_text(decl.node, self.source).to_owned()),
                props: None,
            }),
        );
        id
    }

    fn add_element(&mut self, element: &ElementSyntax) -> String {
        let id = match element.marker(self.attribute_name) {
            Some(marker) => marker.to_owned(),
            None => {
                let (line, column) = element.position();
                positional_fingerprint(&self.file, line, column)
            }
        };

        let mut props = IndexMap::new();
        for attr in &element.attributes {
            let value = match &attr.value {
                AttrValue::Literal(text) | AttrValue::Expression(text) => text.clone(),
                AttrValue::Identifier(name) => format!("{{{name}}}"),
                AttrValue::Markup(_) | AttrValue::Absent => continue,
            };
            props.insert(attr.name.clone(), value);
        }

        self.store.add_node(
            &id,
            Some(NodeAttrs {
                name: Some(element.tag_name.clone()),
                kind: Some(NodeKind::Element),
                file_path: Some(self.file.clone()),
                range: Some(SourceRange::of(element.node)),
                source_snippet: Some(node_text(element.node, self.source).to_owned()),
                props: Some(props),
            }),
        );

        let parent = self
            .enclosing_element()
            .or_else(|| self.enclosing_function())
            .map(str::to_owned);
        if let Some(parent) = parent {
            self.store.add_edge(EdgeKind::Contains, &parent, &id);
        }

        if element.is_component()
            && let Some(owner) = self.enclosing_function().map(str::to_owned)
        {
            self.store.add_edge(EdgeKind::Renders, &owner, &element.tag_name);
        }

        for attr in &element.attributes {
            if attr.name.starts_with("on") {
                if let AttrValue::Identifier(handler) = &attr.value {
                    self.store.add_edge(EdgeKind::BindsEvent, &id, handler);
                }
            } else if RESOURCE_ATTRIBUTES.contains(&attr.name.as_str()) {
                match &attr.value {
                    AttrValue::Literal(target) | AttrValue::Identifier(target) => {
                        self.store.add_edge(EdgeKind::References, &id, target);
                    }
                    AttrValue::Expression(_) | AttrValue::Markup(_) | AttrValue::Absent => {}
                }
            }
        }

        id
    }
}
