use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::normalize_extension;

/// Which files a walk should return.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Extensions to keep, with or without the leading dot.
    pub extensions: Vec<String>,
    /// Directory names pruned wherever they appear.
    pub exclude_dirs: Vec<String>,
    /// Extra glob patterns matched against the full path and each component.
    pub exclude: Vec<String>,
}

/// Walk `root` and collect every file whose extension is in `options.extensions`.
///
/// Ignore files are not consulted: only `exclude_dirs` and `exclude` decide
/// what is skipped, so hidden directories are walked unless named. Entries
/// are sorted by file name so repeated walks return the same order.
pub fn collect_files(root: &Path, options: &WalkOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if !root.exists() {
        warn!("directory does not exist: {}", root.display());
        return files;
    }

    let exclude_dirs = options.exclude_dirs.clone();
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !exclude_dirs.iter().any(|d| d.as_str() == name)
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        let path = entry.path();

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !options
            .extensions
            .iter()
            .any(|wanted| normalize_extension(wanted) == ext)
        {
            continue;
        }

        if is_excluded_by_pattern(path, &options.exclude) {
            continue;
        }

        debug!("discovered {}", path.display());
        files.push(path.to_path_buf());
    }

    files
}

/// Returns true if `path` matches any exclusion glob.
fn is_excluded_by_pattern(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    for pattern in patterns {
        let Ok(matcher) = glob::Pattern::new(pattern) else {
            continue;
        };
        if matcher.matches(&path_str) {
            return true;
        }
        // Also check if any component matches the pattern directly.
        for component in path.components() {
            if let Some(s) = component.as_os_str().to_str()
                && matcher.matches(s)
            {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn jsx_options() -> WalkOptions {
        WalkOptions {
            extensions: vec![".tsx".into(), "jsx".into()],
            exclude_dirs: vec!["node_modules".into(), "dist".into()],
            exclude: Vec::new(),
        }
    }

    #[test]
    fn test_collects_matching_extensions_in_stable_order() {
        let dir = tmp();
        fs::create_dir_all(dir.path().join("src/components")).unwrap();
        fs::write(dir.path().join("src/main.tsx"), "").unwrap();
        fs::write(dir.path().join("src/components/Card.jsx"), "").unwrap();
        fs::write(dir.path().join("src/util.ts"), "").unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();

        let files = collect_files(dir.path(), &jsx_options());
        assert_eq!(
            names(&files, dir.path()),
            vec!["src/components/Card.jsx", "src/main.tsx"]
        );
        assert_eq!(files, collect_files(dir.path(), &jsx_options()));
    }

    #[test]
    fn test_excluded_dirs_are_pruned() {
        let dir = tmp();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.jsx"), "").unwrap();
        fs::write(dir.path().join("dist/App.tsx"), "").unwrap();
        fs::write(dir.path().join("App.tsx"), "").unwrap();

        let files = collect_files(dir.path(), &jsx_options());
        assert_eq!(names(&files, dir.path()), vec!["App.tsx"]);
    }

    #[test]
    fn test_glob_exclusions() {
        let dir = tmp();
        fs::write(dir.path().join("App.tsx"), "").unwrap();
        fs::write(dir.path().join("App.test.tsx"), "").unwrap();

        let options = WalkOptions {
            exclude: vec!["*.test.tsx".into()],
            ..jsx_options()
        };
        let files = collect_files(dir.path(), &options);
        assert_eq!(names(&files, dir.path()), vec!["App.tsx"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tmp();
        assert!(collect_files(&dir.path().join("nope"), &jsx_options()).is_empty());
    }
}
