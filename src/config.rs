use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::walker::WalkOptions;

/// Name of the optional configuration file at the project root.
pub const CONFIG_FILE: &str = "jsx-graph.toml";

/// Configuration loaded from `jsx-graph.toml` at the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JsxGraphConfig {
    /// Name of the marker attribute carrying element fingerprints.
    pub attribute_name: String,
    /// Extensions of files that receive markers.
    pub marker_extensions: Vec<String>,
    /// Extensions of files analysed by the graph builder.
    pub graph_extensions: Vec<String>,
    /// Directory names pruned from every walk.
    pub exclude_dirs: Vec<String>,
    /// Additional glob patterns to exclude.
    pub exclude: Option<Vec<String>>,
    /// Sub-directory of the project the graph is built from.
    pub source_dir: PathBuf,
    /// Where `graph.json` and `fingerprints.json` are written.
    pub output_dir: PathBuf,
    pub formatter: FormatterConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// External prettier-compatible command, e.g. `["npx", "prettier"]`.
    /// When unset the built-in formatter is used.
    pub command: Option<Vec<String>>,
    /// Line width of the built-in formatter.
    pub line_width: u32,
    /// Indent width of the built-in formatter.
    pub indent_width: u8,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            command: None,
            line_width: 80,
            indent_width: 2,
        }
    }
}

impl Default for JsxGraphConfig {
    fn default() -> Self {
        Self {
            attribute_name: "data-fingerprint".to_owned(),
            marker_extensions: vec!["tsx".into(), "jsx".into()],
            graph_extensions: vec!["tsx".into(), "ts".into(), "jsx".into(), "js".into()],
            exclude_dirs: vec![
                "node_modules".into(),
                "dist".into(),
                "build".into(),
                ".git".into(),
            ],
            exclude: None,
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from(".jsx-graph"),
            formatter: FormatterConfig::default(),
        }
    }
}

impl JsxGraphConfig {
    /// Load configuration from `jsx-graph.toml` in the given root directory.
    ///
    /// Returns the defaults if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!("failed to parse {CONFIG_FILE}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                warn!("failed to read {CONFIG_FILE}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    /// Walk over the files that receive markers.
    pub fn marker_walk(&self) -> WalkOptions {
        self.walk(&self.marker_extensions)
    }

    /// Walk over the files analysed by the graph builder.
    pub fn graph_walk(&self) -> WalkOptions {
        self.walk(&self.graph_extensions)
    }

    fn walk(&self, extensions: &[String]) -> WalkOptions {
        WalkOptions {
            extensions: extensions.to_vec(),
            exclude_dirs: self.exclude_dirs.clone(),
            exclude: self.exclude.clone().unwrap_or_default(),
        }
    }

    pub fn source_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.source_dir)
    }

    pub fn graph_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output_dir).join(crate::persist::GRAPH_FILE)
    }

    pub fn index_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output_dir).join(crate::persist::INDEX_FILE)
    }
}

/// Strip a leading dot so `.tsx` and `tsx` compare equal.
pub fn normalize_extension(ext: &str) -> &str {
    ext.strip_prefix('.').unwrap_or(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = JsxGraphConfig::load(dir.path());
        assert_eq!(config.attribute_name, "data-fingerprint");
        assert_eq!(config.marker_extensions, vec!["tsx", "jsx"]);
        assert!(config.formatter.command.is_none());
    }

    #[test]
    fn test_partial_config_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "attribute_name = \"data-fp\"\nsource_dir = \"app\"\n\n[formatter]\ncommand = [\"prettier\"]\n",
        )
        .unwrap();
        let config = JsxGraphConfig::load(dir.path());
        assert_eq!(config.attribute_name, "data-fp");
        assert_eq!(config.source_root(dir.path()), dir.path().join("app"));
        assert_eq!(config.formatter.command, Some(vec!["prettier".to_owned()]));
        assert_eq!(config.exclude_dirs.len(), 4, "unset keys keep defaults");
        assert_eq!(config.graph_walk().extensions.len(), 4);
        assert!(config.marker_walk().exclude.is_empty());
        assert_eq!(config.formatter.line_width, 80, "formatter table keeps its defaults");
        assert_eq!(config.formatter.indent_width, 2);
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "attribute_name = [").unwrap();
        let config = JsxGraphConfig::load(dir.path());
        assert_eq!(config.attribute_name, "data-fingerprint");
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".tsx"), "tsx");
        assert_eq!(normalize_extension("jsx"), "jsx");
    }
}
