//! Canonical formatting of rewritten source text.
//!
//! Both the marker stripper and the patch engine pass their output through a
//! [`SourceFormatter`] before writing. The built-in [`ScriptFormatter`]
//! reprints TypeScript and JavaScript with dprint. The dialect names are the
//! parser names understood by prettier-compatible tools, so
//! [`CommandFormatter`] can hand them straight to an external command.

use std::io::Write;
use std::ops::Range;
use std::path::Path;
use std::process::{Command, Stdio};

use dprint_plugin_typescript::FormatTextOptions;
use dprint_plugin_typescript::configuration::{Configuration, ConfigurationBuilder};
use tree_sitter::Node;

use crate::config::FormatterConfig;
use crate::error::{Error, Result};
use crate::parser::languages::Grammar;
use crate::parser::parse_with;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Babel,
    Css,
    Json,
    Html,
}

impl Dialect {
    /// `.ts`/`.tsx` are TypeScript, `.js`/`.jsx` Babel; anything unrecognised
    /// falls back to TypeScript.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts" | "tsx") => Self::TypeScript,
            Some("js" | "jsx") => Self::Babel,
            Some("css") => Self::Css,
            Some("json") => Self::Json,
            Some("html") => Self::Html,
            _ => Self::TypeScript,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Babel => "babel",
            Self::Css => "css",
            Self::Json => "json",
            Self::Html => "html",
        }
    }

    fn error(self, message: impl Into<String>) -> Error {
        Error::Format {
            dialect: self.as_str().to_owned(),
            message: message.into(),
        }
    }
}

pub trait SourceFormatter {
    /// Return the canonical form of `source`, or [`Error::Format`] when the
    /// text is not valid in `dialect`. Callers fall back to the unformatted
    /// text on error.
    fn format(&self, source: &str, dialect: Dialect) -> Result<String>;
}

/// Pick the formatter named by the project configuration.
pub fn from_config(config: &FormatterConfig) -> Box<dyn SourceFormatter> {
    match config.command.as_deref().and_then(CommandFormatter::from_argv) {
        Some(cmd) => Box::new(cmd),
        None => Box::new(ScriptFormatter::new(config)),
    }
}

/// Built-in canonical formatter.
///
/// TypeScript and Babel sources are reprinted by dprint's TypeScript plugin
/// with prettier-like settings. JSON, CSS and HTML go through
/// [`TidyFormatter`].
pub struct ScriptFormatter {
    config: Configuration,
}

impl ScriptFormatter {
    pub fn new(options: &FormatterConfig) -> Self {
        let mut builder = ConfigurationBuilder::new();
        builder
            .line_width(options.line_width)
            .indent_width(options.indent_width);
        Self {
            config: builder.build(),
        }
    }

    /// Format as if the text were a file with `extension`, which selects
    /// the syntax (`tsx`, `ts`, `jsx`).
    fn reprint(&self, text: &str, extension: &str) -> std::result::Result<String, String> {
        let file = format!("source.{extension}");
        let output = dprint_plugin_typescript::format_text(FormatTextOptions {
            path: Path::new(&file),
            extension: None,
            text: text.to_owned(),
            config: &self.config,
            external_formatter: None,
        })
        .map_err(|e| e.to_string())?;
        // `None` means the text is already canonical.
        Ok(output.unwrap_or_else(|| text.to_owned()))
    }
}

impl Default for ScriptFormatter {
    fn default() -> Self {
        Self::new(&FormatterConfig::default())
    }
}

impl SourceFormatter for ScriptFormatter {
    fn format(&self, source: &str, dialect: Dialect) -> Result<String> {
        let text = source.replace("\r\n", "\n");
        let formatted = match dialect {
            // TSX first; plain TypeScript accepts `<T>expr` casts that TSX rejects.
            Dialect::TypeScript => self
                .reprint(&text, "tsx")
                .or_else(|_| self.reprint(&text, "ts")),
            Dialect::Babel => self.reprint(&text, "jsx"),
            Dialect::Json | Dialect::Css | Dialect::Html => {
                return TidyFormatter.format(&text, dialect);
            }
        };
        formatted.map_err(|message| dialect.error(message))
    }
}

/// Whitespace-only formatter.
///
/// Normalises line endings to `\n`, trims trailing whitespace on every line
/// whose end is not inside a string or template literal, and ends the text
/// with exactly one newline. Script dialects and JSON are parsed first and
/// rejected if invalid.
#[derive(Debug, Clone, Copy, Default)]
pub struct TidyFormatter;

impl SourceFormatter for TidyFormatter {
    fn format(&self, source: &str, dialect: Dialect) -> Result<String> {
        let text = source.replace("\r\n", "\n");

        let protected = match dialect {
            Dialect::TypeScript => {
                // TSX first; plain TypeScript accepts `<T>expr` casts that TSX rejects.
                literal_ranges(Grammar::Tsx, &text)
                    .or_else(|_| literal_ranges(Grammar::TypeScript, &text))
                    .map_err(|e| dialect.error(e.to_string()))?
            }
            Dialect::Babel => literal_ranges(Grammar::JavaScript, &text)
                .map_err(|e| dialect.error(e.to_string()))?,
            Dialect::Json => {
                serde_json::from_str::<serde_json::Value>(&text)
                    .map_err(|e| dialect.error(e.to_string()))?;
                Vec::new()
            }
            Dialect::Css | Dialect::Html => Vec::new(),
        };

        Ok(tidy(&text, &protected))
    }
}

fn literal_ranges(grammar: Grammar, text: &str) -> Result<Vec<Range<usize>>> {
    let parsed = parse_with(grammar, Path::new(grammar.name()), text)?;
    let mut ranges = Vec::new();
    collect_literals(parsed.root(), &mut ranges);
    Ok(ranges)
}

/// Byte ranges of string and template literals, outermost only.
fn collect_literals(root: Node, out: &mut Vec<Range<usize>>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if matches!(node.kind(), "string" | "template_string") {
            out.push(node.start_byte()..node.end_byte());
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }
}

fn tidy(text: &str, protected: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        let line_end = offset + body.len();
        let inside_literal = protected
            .iter()
            .any(|r| r.start < line_end && line_end < r.end);
        if inside_literal {
            out.push_str(body);
        } else {
            out.push_str(body.trim_end_matches([' ', '\t']));
        }
        out.push_str(newline);
        offset += line.len();
    }

    let kept = out.trim_end_matches(['\n', ' ', '\t']).len();
    out.truncate(kept);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// External prettier-compatible formatter: source on stdin, result on stdout,
/// `--parser <dialect>` appended to the configured argv.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl SourceFormatter for CommandFormatter {
    fn format(&self, source: &str, dialect: Dialect) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--parser")
            .arg(dialect.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| dialect.error(format!("failed to start {}: {e}", self.program)))?;

        // Feed stdin from another thread so a large output cannot deadlock the pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.to_owned();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| dialect.error(e.to_string()))?;
        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(dialect.error(format!("writing stdin: {e}"))),
                Err(_) => return Err(dialect.error("stdin writer panicked")),
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(dialect.error(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        String::from_utf8(output.stdout).map_err(|e| dialect.error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_by_extension() {
        assert_eq!(Dialect::from_path(Path::new("a/App.tsx")), Dialect::TypeScript);
        assert_eq!(Dialect::from_path(Path::new("a/App.jsx")), Dialect::Babel);
        assert_eq!(Dialect::from_path(Path::new("main.js")), Dialect::Babel);
        assert_eq!(Dialect::from_path(Path::new("site.css")), Dialect::Css);
        assert_eq!(Dialect::from_path(Path::new("package.json")), Dialect::Json);
        assert_eq!(Dialect::from_path(Path::new("index.html")), Dialect::Html);
        assert_eq!(Dialect::from_path(Path::new("README.md")), Dialect::TypeScript);
        assert_eq!(Dialect::from_path(Path::new("Makefile")), Dialect::TypeScript);
    }

    #[test]
    fn test_tidy_trims_and_terminates() {
        let src = "const a = 1;   \r\nconst b = <div>  \r\n  x\r\n</div>;\n\n\n";
        let out = TidyFormatter.format(src, Dialect::TypeScript).unwrap();
        assert_eq!(out, "const a = 1;\nconst b = <div>\n  x\n</div>;\n");
    }

    #[test]
    fn test_tidy_keeps_whitespace_inside_template_literals() {
        let src = "const t = `line   \nnext`;  \n";
        let out = TidyFormatter.format(src, Dialect::Babel).unwrap();
        assert_eq!(out, "const t = `line   \nnext`;\n");
    }

    #[test]
    fn test_tidy_is_stable() {
        let src = "export const A = () => <p>hi</p>;\n";
        let once = TidyFormatter.format(src, Dialect::TypeScript).unwrap();
        assert_eq!(once, src);
        assert_eq!(TidyFormatter.format(&once, Dialect::TypeScript).unwrap(), once);
    }

    #[test]
    fn test_tidy_accepts_angle_bracket_casts() {
        let src = "const n = <number>value;\n";
        assert!(TidyFormatter.format(src, Dialect::TypeScript).is_ok());
    }

    #[test]
    fn test_tidy_rejects_invalid_script_and_json() {
        let err = TidyFormatter
            .format("const x = <div>;\n", Dialect::Babel)
            .unwrap_err();
        assert!(matches!(err, Error::Format { ref dialect, .. } if dialect == "babel"));
        assert!(TidyFormatter.format("{\"a\": }", Dialect::Json).is_err());
        assert_eq!(
            TidyFormatter.format("{\"a\": 1}", Dialect::Json).unwrap(),
            "{\"a\": 1}\n"
        );
    }

    #[test]
    fn test_css_and_html_are_not_validated() {
        let out = TidyFormatter.format("a {  \n}", Dialect::Css).unwrap();
        assert_eq!(out, "a {\n}\n");
    }

    #[test]
    fn test_from_config_selects_formatter() {
        assert!(CommandFormatter::from_argv(&[]).is_none());
        let cmd = CommandFormatter::from_argv(&["npx".into(), "prettier".into()]).unwrap();
        assert_eq!(cmd.program, "npx");
        assert_eq!(cmd.args, vec!["prettier"]);
        let builtin = from_config(&FormatterConfig::default());
        assert_eq!(builtin.format("x", Dialect::Babel).unwrap(), "x;\n");
    }

    #[test]
    fn test_script_formatter_reprints_code() {
        let fmt = ScriptFormatter::default();
        assert_eq!(
            fmt.format("const   a=1", Dialect::TypeScript).unwrap(),
            "const a = 1;\n"
        );
        assert_eq!(
            fmt.format("function f(){return 1}", Dialect::Babel).unwrap(),
            "function f() {\n  return 1;\n}\n"
        );
    }

    #[test]
    fn test_script_formatter_is_stable_on_canonical_jsx() {
        let fmt = ScriptFormatter::default();
        let src = "export const A = () => <p>hi</p>;\n";
        let once = fmt.format(src, Dialect::TypeScript).unwrap();
        assert_eq!(once, src);
        assert_eq!(fmt.format(&once, Dialect::Babel).unwrap(), once);
    }

    #[test]
    fn test_script_formatter_falls_back_to_plain_typescript() {
        let fmt = ScriptFormatter::default();
        assert!(fmt.format("const n = <number>value;\n", Dialect::TypeScript).is_ok());
    }

    #[test]
    fn test_script_formatter_rejects_invalid_source() {
        let err = ScriptFormatter::default()
            .format("const x = <div>;\n", Dialect::Babel)
            .unwrap_err();
        assert!(matches!(err, Error::Format { ref dialect, .. } if dialect == "babel"));
    }

    #[test]
    fn test_script_formatter_delegates_other_dialects() {
        let fmt = ScriptFormatter::default();
        assert_eq!(fmt.format("a {  \n}", Dialect::Css).unwrap(), "a {\n}\n");
        assert!(fmt.format("{\"a\": }", Dialect::Json).is_err());
    }

    #[test]
    fn test_tidy_handles_deep_expressions() {
        let mut src = String::from("const s = \"a  \"");
        for _ in 0..20_000 {
            src.push_str(" + 1");
        }
        src.push_str(";   \n");
        let out = std::thread::Builder::new()
            .stack_size(8 << 20)
            .spawn(move || TidyFormatter.format(&src, Dialect::TypeScript))
            .unwrap()
            .join()
            .unwrap()
            .unwrap();
        assert!(out.starts_with("const s = \"a  \" + 1"));
        assert!(out.ends_with("+ 1;\n"));
    }

    #[test]
    fn test_missing_command_is_a_format_error() {
        let cmd = CommandFormatter::from_argv(&["jsx-graph-no-such-formatter".into()]).unwrap();
        let err = cmd.format("x;", Dialect::Babel).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }
}
