use std::path::Path;

use tree_sitter::Language;

/// The grammar a source file is parsed with.
///
/// - `.ts`  -> [`Grammar::TypeScript`]
/// - `.tsx` -> [`Grammar::Tsx`]
/// - `.js`/`.jsx` -> [`Grammar::JavaScript`] (the JavaScript grammar accepts JSX)
///
/// `.ts` and `.tsx` must not share a grammar: the TypeScript grammar cannot
/// parse JSX and the TSX grammar rejects angle-bracket type assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Grammar {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "jsx" => Some(Self::JavaScript),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
        }
    }

    pub fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}
