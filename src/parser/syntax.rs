//! Typed view over the handful of tree-sitter node kinds the pipeline cares
//! about: function declarations, JSX elements with their attributes, and
//! call expressions. Everything else is [`Syntax::Other`].

use tree_sitter::Node;

use super::node_text;

/// Classification of a single syntax node.
pub enum Syntax<'t> {
    /// `function Foo() {}` or `const Foo = () => {}` / `const Foo = function () {}`.
    Function(FunctionDecl<'t>),
    /// A JSX element with a tag name. Fragments are not elements.
    Element(ElementSyntax<'t>),
    /// A call whose callee is a bare identifier: `foo(...)`.
    Call { callee: String },
    Other,
}

pub struct FunctionDecl<'t> {
    pub name: String,
    /// The declaration node (`function_declaration` or `variable_declarator`).
    pub node: Node<'t>,
}

pub struct ElementSyntax<'t> {
    /// `jsx_element` or `jsx_self_closing_element`.
    pub node: Node<'t>,
    /// The tag carrying name and attributes: the opening element, or the
    /// self-closing element itself.
    pub tag: Node<'t>,
    pub tag_name: String,
    pub attributes: Vec<Attribute<'t>>,
    /// Byte offset right after the last attribute (or the tag name), where a
    /// new attribute can be spliced in.
    pub insert_at: usize,
}

pub struct Attribute<'t> {
    pub node: Node<'t>,
    pub name: String,
    pub value: AttrValue,
}

/// The value side of a JSX attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `name="text"`: the text between the quotes.
    Literal(String),
    /// `name={ident}`
    Identifier(String),
    /// `name={any other expression}`: the expression's source text.
    Expression(String),
    /// `name=<Element />`
    Markup(String),
    /// `name` or `name={}`
    Absent,
}

impl<'t> ElementSyntax<'t> {
    pub fn attribute(&self, name: &str) -> Option<&Attribute<'t>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The literal value of the marker attribute, if present.
    pub fn marker(&self, attribute_name: &str) -> Option<&str> {
        match self.attribute(attribute_name).map(|a| &a.value) {
            Some(AttrValue::Literal(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    /// 1-based line and 0-based column of the element start.
    pub fn position(&self) -> (usize, usize) {
        let at = self.node.start_position();
        (at.row + 1, at.column)
    }

    pub fn is_component(&self) -> bool {
        self.tag_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
    }
}

pub fn classify<'t>(node: Node<'t>, source: &[u8]) -> Syntax<'t> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => node
            .child_by_field_name("name")
            .map(|name| {
                Syntax::Function(FunctionDecl {
                    name: node_text(name, source).to_owned(),
                    node,
                })
            })
            .unwrap_or(Syntax::Other),
        "variable_declarator" => {
            let name = node.child_by_field_name("name");
            let value = node.child_by_field_name("value");
            match (name, value) {
                (Some(name), Some(value))
                    if name.kind() == "identifier" && is_function_value(value) =>
                {
                    Syntax::Function(FunctionDecl {
                        name: node_text(name, source).to_owned(),
                        node,
                    })
                }
                _ => Syntax::Other,
            }
        }
        "jsx_element" => {
            let open = node.child_by_field_name("open_tag").or_else(|| {
                named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "jsx_opening_element")
            });
            open.and_then(|tag| element(node, tag, source))
                .map(Syntax::Element)
                .unwrap_or(Syntax::Other)
        }
        "jsx_self_closing_element" => element(node, node, source)
            .map(Syntax::Element)
            .unwrap_or(Syntax::Other),
        "call_expression" => match node.child_by_field_name("function") {
            Some(callee) if callee.kind() == "identifier" => Syntax::Call {
                callee: node_text(callee, source).to_owned(),
            },
            _ => Syntax::Other,
        },
        _ => Syntax::Other,
    }
}

fn is_function_value(node: Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

/// Build the element view, or `None` for a nameless (fragment) tag.
fn element<'t>(node: Node<'t>, tag: Node<'t>, source: &[u8]) -> Option<ElementSyntax<'t>> {
    let name = tag.child_by_field_name("name")?;

    let mut insert_at = name.end_byte();
    let mut attributes = Vec::new();
    for child in named_children(tag) {
        match child.kind() {
            "comment" => continue,
            "jsx_attribute" => {
                if let Some(attr) = attribute(child, source) {
                    attributes.push(attr);
                }
            }
            _ => {}
        }
        insert_at = insert_at.max(child.end_byte());
    }

    Some(ElementSyntax {
        node,
        tag,
        tag_name: node_text(name, source).to_owned(),
        attributes,
        insert_at,
    })
}

fn attribute<'t>(node: Node<'t>, source: &[u8]) -> Option<Attribute<'t>> {
    let parts = named_children(node);
    let name = parts.first()?;
    let value = match parts.get(1) {
        None => AttrValue::Absent,
        Some(v) => match v.kind() {
            "string" => AttrValue::Literal(unquote(node_text(*v, source)).to_owned()),
            "jsx_expression" => expression_value(*v, source),
            _ => AttrValue::Markup(node_text(*v, source).to_owned()),
        },
    };
    Some(Attribute {
        node,
        name: node_text(*name, source).to_owned(),
        value,
    })
}

fn expression_value(container: Node, source: &[u8]) -> AttrValue {
    let inner = named_children(container)
        .into_iter()
        .find(|c| c.kind() != "comment");
    match inner {
        None => AttrValue::Absent,
        Some(expr) if expr.kind() == "identifier" => {
            AttrValue::Identifier(node_text(expr, source).to_owned())
        }
        Some(expr) => AttrValue::Expression(node_text(expr, source).to_owned()),
    }
}

fn unquote(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Every element under `root`, in document order (opening tags first).
pub fn elements<'t>(root: Node<'t>, source: &[u8]) -> Vec<ElementSyntax<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Syntax::Element(el) = classify(node, source) {
            out.push(el);
        }
        let mut children = named_children(node);
        children.reverse();
        stack.extend(children);
    }
    out
}

pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parser::parse_source;

    fn elements_of(src: &str) -> Vec<(String, Vec<(String, AttrValue)>)> {
        let parsed = parse_source(Path::new("t.tsx"), src).unwrap();
        elements(parsed.root(), parsed.bytes())
            .into_iter()
            .map(|el| {
                let attrs = el
                    .attributes
                    .iter()
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect();
                (el.tag_name, attrs)
            })
            .collect()
    }

    #[test]
    fn test_elements_in_document_order() {
        let els = elements_of("const a = <ul><li>1</li><li><b /></li></ul>;\nconst z = <p />;");
        let tags: Vec<&str> = els.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["ul", "li", "li", "b", "p"]);
    }

    #[test]
    fn test_attribute_values() {
        let src = r#"const a = <img src="./logo.png" alt={label} onClick={() => go(1)} hidden data-x={} />;"#;
        let els = elements_of(src);
        assert_eq!(els.len(), 1);
        let (tag, attrs) = &els[0];
        assert_eq!(tag, "img");
        assert_eq!(
            attrs,
            &vec![
                ("src".to_owned(), AttrValue::Literal("./logo.png".into())),
                ("alt".to_owned(), AttrValue::Identifier("label".into())),
                ("onClick".to_owned(), AttrValue::Expression("() => go(1)".into())),
                ("hidden".to_owned(), AttrValue::Absent),
                ("data-x".to_owned(), AttrValue::Absent),
            ]
        );
    }

    #[test]
    fn test_fragments_are_not_elements() {
        let els = elements_of("const a = <><span /></>;");
        let tags: Vec<&str> = els.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["span"]);
    }

    #[test]
    fn test_member_tag_name_and_component_check() {
        let src = "const a = <Menu.Item key=\"k\"><b /></Menu.Item>;";
        let parsed = parse_source(Path::new("t.tsx"), src).unwrap();
        let mut stack = vec![parsed.root()];
        let mut seen = Vec::new();
        while let Some(node) = stack.pop() {
            if let Syntax::Element(el) = classify(node, parsed.bytes()) {
                seen.push((el.tag_name.clone(), el.is_component()));
            }
            stack.extend(named_children(node));
        }
        seen.sort();
        assert_eq!(
            seen,
            vec![("Menu.Item".to_owned(), true), ("b".to_owned(), false)]
        );
    }

    #[test]
    fn test_insert_point_follows_last_attribute() {
        let src = "const a = <div className=\"x\" {...rest}>hi</div>;";
        let parsed = parse_source(Path::new("t.tsx"), src).unwrap();
        let mut stack = vec![parsed.root()];
        while let Some(node) = stack.pop() {
            if let Syntax::Element(el) = classify(node, parsed.bytes()) {
                assert_eq!(&src[..el.insert_at], "const a = <div className=\"x\" {...rest}");
                return;
            }
            stack.extend(named_children(node));
        }
        panic!("no element found");
    }

    #[test]
    fn test_function_and_call_classification() {
        let src = "function A() { helper(); obj.m(); }\nconst B = () => null;\nconst c = 1;";
        let parsed = parse_source(Path::new("t.ts"), src).unwrap();
        let mut functions = Vec::new();
        let mut calls = Vec::new();
        let mut stack = vec![parsed.root()];
        while let Some(node) = stack.pop() {
            match classify(node, parsed.bytes()) {
                Syntax::Function(f) => functions.push(f.name),
                Syntax::Call { callee } => calls.push(callee),
                Syntax::Element(_) | Syntax::Other => {}
            }
            stack.extend(named_children(node));
        }
        functions.sort();
        assert_eq!(functions, vec!["A", "B"]);
        assert_eq!(calls, vec!["helper"]);
    }
}
