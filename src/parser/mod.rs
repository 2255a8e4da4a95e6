pub mod languages;
pub mod syntax;

use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser, Tree};

use crate::error::{Error, Result};

use languages::Grammar;

/// A syntax tree together with the text it was parsed from.
pub struct ParsedSource<'s> {
    pub tree: Tree,
    pub source: &'s str,
    pub grammar: Grammar,
}

impl<'s> ParsedSource<'s> {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn bytes(&self) -> &'s [u8] {
        self.source.as_bytes()
    }
}

/// Parse `source` with the grammar selected by `path`'s extension.
///
/// Allocates a fresh `Parser` per call; every pipeline here handles one file
/// at a time.
///
/// # Errors
/// - [`Error::UnsupportedExtension`] if the extension is not `.ts`/`.tsx`/`.js`/`.jsx`
/// - [`Error::Parse`] if tree-sitter gives up or the tree contains error nodes;
///   the position is that of the first error
pub fn parse_source<'s>(path: &Path, source: &'s str) -> Result<ParsedSource<'s>> {
    let grammar =
        Grammar::from_path(path).ok_or_else(|| Error::UnsupportedExtension(path.to_path_buf()))?;
    parse_with(grammar, path, source)
}

pub fn parse_with<'s>(grammar: Grammar, path: &Path, source: &'s str) -> Result<ParsedSource<'s>> {
    let mut parser = Parser::new();
    parser.set_language(&grammar.language())?;

    let tree = parser.parse(source, None).ok_or_else(|| Error::Parse {
        path: path.to_path_buf(),
        line: 0,
        column: 0,
    })?;

    if let Some(bad) = first_error(tree.root_node()) {
        let at = bad.start_position();
        return Err(Error::Parse {
            path: PathBuf::from(path),
            line: at.row + 1,
            column: at.column,
        });
    }

    Ok(ParsedSource {
        tree,
        source,
        grammar,
    })
}

/// Depth-first search for the first `ERROR` or `MISSING` node. Subtrees
/// without errors are skipped.
fn first_error(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// UTF-8 text of a node; empty for nodes that do not fall on char boundaries.
pub fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
