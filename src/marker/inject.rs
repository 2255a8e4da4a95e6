use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::fingerprint::positional_fingerprint;
use crate::parser::parse_source;
use crate::parser::syntax::elements;

/// One marker added by the injector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintRecord {
    pub id: String,
    pub file: String,
    pub element_name: String,
    pub line: usize,
    pub column: usize,
}

/// Source text with markers spliced in.
#[derive(Debug)]
pub struct Injected {
    pub source: String,
    pub records: Vec<FingerprintRecord>,
}

/// Add ` <attribute_name>="<id>"` to every element that has no such attribute.
///
/// Ids are positional fingerprints of the element start in `source`. Edits
/// are spliced in from the end of the file backwards so every recorded
/// position refers to the original text, and no newline is ever added or
/// removed.
pub fn inject_source(path: &Path, source: &str, attribute_name: &str) -> Result<Injected> {
    let parsed = parse_source(path, source)?;
    let file = path.to_string_lossy();

    let mut edits: Vec<(usize, String)> = Vec::new();
    let mut records = Vec::new();
    for element in elements(parsed.root(), parsed.bytes()) {
        if element.attribute(attribute_name).is_some() {
            continue;
        }
        let (line, column) = element.position();
        let id = positional_fingerprint(&file, line, column);
        edits.push((element.insert_at, format!(" {attribute_name}=\"{id}\"")));
        records.push(FingerprintRecord {
            id,
            file: file.clone().into_owned(),
            element_name: element.tag_name,
            line,
            column,
        });
    }

    let mut out = source.to_owned();
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    for (offset, text) in edits {
        out.insert_str(offset, &text);
    }

    Ok(Injected {
        source: out,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTR: &str = "data-fingerprint";

    #[test]
    fn test_two_markers_on_nested_elements() {
        let path = Path::new("src/Card.tsx");
        let src = "export const Card = () => (\n  <div className=\"card\">\n    <span>{title}</span>\n  </div>\n);\n";
        let out = inject_source(path, src, ATTR).unwrap();

        assert_eq!(out.records.len(), 2);
        let div = &out.records[0];
        let span = &out.records[1];
        assert_eq!((div.element_name.as_str(), div.line, div.column), ("div", 2, 2));
        assert_eq!((span.element_name.as_str(), span.line, span.column), ("span", 3, 4));
        assert_eq!(div.id, positional_fingerprint("src/Card.tsx", 2, 2));
        assert_ne!(div.id, span.id);

        let expected = format!(
            "export const Card = () => (\n  <div className=\"card\" {ATTR}=\"{}\">\n    <span {ATTR}=\"{}\">{{title}}</span>\n  </div>\n);\n",
            div.id, span.id
        );
        assert_eq!(out.source, expected);
    }

    #[test]
    fn test_injection_is_idempotent() {
        let path = Path::new("App.jsx");
        let src = "const App = () => <main><Header /><p>hi</p></main>;\n";
        let first = inject_source(path, src, ATTR).unwrap();
        assert_eq!(first.records.len(), 3);
        let second = inject_source(path, &first.source, ATTR).unwrap();
        assert!(second.records.is_empty());
        assert_eq!(second.source, first.source);
    }

    #[test]
    fn test_existing_marker_of_any_value_is_kept() {
        let path = Path::new("A.tsx");
        let src = "const a = <div data-fingerprint={dynamicId}><b data-fingerprint=\"manual\" /></div>;\n";
        let out = inject_source(path, src, ATTR).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.source, src);
    }

    #[test]
    fn test_line_count_is_preserved() {
        let path = Path::new("L.tsx");
        let src = "function L() {\n  return (\n    <ul>\n      <li\n        key=\"a\"\n      >a</li>\n    </ul>\n  );\n}\n";
        let out = inject_source(path, src, ATTR).unwrap();
        assert_eq!(out.source.lines().count(), src.lines().count());
        assert!(out.source.contains("        key=\"a\" data-fingerprint="));
    }

    #[test]
    fn test_fragments_get_no_marker() {
        let out = inject_source(Path::new("F.tsx"), "const f = <><i /></>;\n", ATTR).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].element_name, "i");
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        assert!(inject_source(Path::new("Bad.tsx"), "const a = <div>;\n", ATTR).is_err());
    }
}
