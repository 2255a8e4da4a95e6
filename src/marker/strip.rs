use std::path::Path;

use crate::error::Result;
use crate::parser::parse_source;
use crate::parser::syntax::elements;

/// Source text with markers removed.
#[derive(Debug)]
pub struct Stripped {
    pub source: String,
    pub removed: usize,
}

/// Remove every `attribute_name` attribute, whatever its value, together
/// with the whitespace run in front of it.
///
/// The result is not formatted; for markers added by the injector it is the
/// text the injector started from.
pub fn strip_source(path: &Path, source: &str, attribute_name: &str) -> Result<Stripped> {
    let parsed = parse_source(path, source)?;
    let bytes = source.as_bytes();

    let mut cuts = Vec::new();
    for element in elements(parsed.root(), parsed.bytes()) {
        for attr in element.attributes.iter().filter(|a| a.name == attribute_name) {
            let end = attr.node.end_byte();
            let mut start = attr.node.start_byte();
            while start > 0 && bytes[start - 1].is_ascii_whitespace() {
                start -= 1;
            }
            cuts.push(start..end);
        }
    }

    let mut out = source.to_owned();
    cuts.sort_by(|a, b| b.start.cmp(&a.start));
    for cut in &cuts {
        out.replace_range(cut.clone(), "");
    }

    Ok(Stripped {
        source: out,
        removed: cuts.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::inject::inject_source;

    const ATTR: &str = "data-fingerprint";

    #[test]
    fn test_strip_reverts_injection() {
        let path = Path::new("src/App.tsx");
        let src = "export function App() {\n  return (\n    <div className=\"app\">\n      <Header\n        title=\"x\"\n      />\n      <img src={logo} />\n    </div>\n  );\n}\n";
        let injected = inject_source(path, src, ATTR).unwrap();
        assert_eq!(injected.records.len(), 3);

        let stripped = strip_source(path, &injected.source, ATTR).unwrap();
        assert_eq!(stripped.removed, 3);
        assert_eq!(stripped.source, src);
    }

    #[test]
    fn test_strip_removes_hand_written_markers() {
        let path = Path::new("B.jsx");
        let src = "const b = <button\n  data-fingerprint={id}\n  onClick={go}\n>ok</button>;\n";
        let out = strip_source(path, src, ATTR).unwrap();
        assert_eq!(out.removed, 1);
        assert_eq!(out.source, "const b = <button\n  onClick={go}\n>ok</button>;\n");
    }

    #[test]
    fn test_strip_inject_strip_is_stable() {
        let path = Path::new("src/List.tsx");
        let src = "const L = () => (\n  <ul data-fingerprint=\"old\">\n    <li key={k}>x</li>\n  </ul>\n);\n";
        let first = strip_source(path, src, ATTR).unwrap();
        assert_eq!(first.removed, 1);

        let injected = inject_source(path, &first.source, ATTR).unwrap();
        assert_eq!(injected.records.len(), 2);
        let second = strip_source(path, &injected.source, ATTR).unwrap();
        assert_eq!(second.removed, 2);
        assert_eq!(second.source, first.source);
    }

    #[test]
    fn test_strip_without_markers_is_a_no_op() {
        let src = "const c = <p title=\"t\">x</p>;\n";
        let out = strip_source(Path::new("C.tsx"), src, ATTR).unwrap();
        assert_eq!(out.removed, 0);
        assert_eq!(out.source, src);
    }

    #[test]
    fn test_other_attributes_survive() {
        let src = "const d = <div data-fingerprint=\"abc\" data-test=\"keep\" />;\n";
        let out = strip_source(Path::new("D.tsx"), src, ATTR).unwrap();
        assert_eq!(out.source, "const d = <div data-test=\"keep\" />;\n");
    }
}
