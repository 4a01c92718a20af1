use std::collections::HashSet;
use std::fs;
use std::ops::Index;
use std::path::Path;

use chrono::Utc;
use rust_embed::Embed;
use serde::Deserialize;

use crate::snippet::{Difficulty, Language, Snippet, SnippetId};

#[derive(Embed)]
#[folder = "assets/snippets/"]
struct SnippetAssets;

const BUILTIN_FILE: &str = "builtin.toml";

#[derive(Debug, thiserror::Error)]
pub enum SnippetLoadError {
    #[error("bundled snippet set is missing")]
    MissingBuiltin,
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid snippet file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("snippet set is empty")]
    Empty,
    #[error("duplicate snippet id: {0}")]
    DuplicateId(String),
    #[error("snippet {0} has no code")]
    EmptyCode(String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnippetFile {
    #[serde(default, rename = "snippet")]
    snippets: Vec<SnippetEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnippetEntry {
    id: String,
    title: String,
    language: Language,
    #[serde(default = "default_difficulty")]
    difficulty: Difficulty,
    code: String,
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

/// Append-only sequence of snippets. Indices handed out by `push` stay valid
/// for the lifetime of the store.
#[derive(Clone, Debug)]
pub struct SnippetStore {
    snippets: Vec<Snippet>,
}

impl SnippetStore {
    /// Load the seed set: the user's file when configured, otherwise the
    /// bundled one.
    pub fn load(user_file: Option<&Path>) -> Result<Self, SnippetLoadError> {
        match user_file {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| SnippetLoadError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&content)
            }
            None => Self::builtin(),
        }
    }

    pub fn builtin() -> Result<Self, SnippetLoadError> {
        let file = SnippetAssets::get(BUILTIN_FILE).ok_or(SnippetLoadError::MissingBuiltin)?;
        let content = String::from_utf8_lossy(file.data.as_ref());
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SnippetLoadError> {
        let file: SnippetFile = toml::from_str(content)?;
        let snippets = file
            .snippets
            .into_iter()
            .map(|e| Snippet::new(SnippetId::new(e.id), e.title, e.language, e.difficulty, e.code))
            .collect();
        Self::from_snippets(snippets)
    }

    pub fn from_snippets(snippets: Vec<Snippet>) -> Result<Self, SnippetLoadError> {
        if snippets.is_empty() {
            return Err(SnippetLoadError::Empty);
        }
        let mut seen = HashSet::new();
        for snippet in &snippets {
            if snippet.code().is_empty() {
                return Err(SnippetLoadError::EmptyCode(snippet.id().to_string()));
            }
            if !seen.insert(snippet.id().clone()) {
                return Err(SnippetLoadError::DuplicateId(snippet.id().to_string()));
            }
        }
        Ok(Self { snippets })
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Snippet> {
        self.snippets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snippet> {
        self.snippets.iter()
    }

    pub fn position(&self, id: &SnippetId) -> Option<usize> {
        self.snippets.iter().position(|s| s.id() == id)
    }

    /// Append a snippet and return its index.
    pub fn push(&mut self, snippet: Snippet) -> usize {
        self.snippets.push(snippet);
        self.snippets.len() - 1
    }

    /// Id for the next generated snippet. The store length is part of the id,
    /// so two ids handed out by the same store never collide.
    pub fn generated_id(&self) -> SnippetId {
        SnippetId::new(format!(
            "gen-{}-{}",
            Utc::now().timestamp_millis(),
            self.snippets.len()
        ))
    }
}

impl Index<usize> for SnippetStore {
    type Output = Snippet;

    fn index(&self, index: usize) -> &Snippet {
        &self.snippets[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_set_loads() {
        let store = SnippetStore::builtin().unwrap();
        assert_eq!(store.len(), 5);
        let first = store.get(0).unwrap();
        assert_eq!(first.id().as_str(), "1");
        assert_eq!(first.title(), "Simple Function");
        assert_eq!(first.language(), Language::JavaScript);
        assert_eq!(
            first.code(),
            "function greet(name) {\n  return \"Hello, \" + name + \"!\";\n}"
        );
        assert_eq!(store.get(4).unwrap().difficulty(), Difficulty::Hard);
    }

    #[test]
    fn test_builtin_code_has_no_trailing_newline() {
        let store = SnippetStore::builtin().unwrap();
        for snippet in store.iter() {
            assert!(!snippet.code().ends_with('\n'), "{}", snippet.id());
            assert!(!snippet.code().starts_with('\n'), "{}", snippet.id());
        }
    }

    #[test]
    fn test_template_literal_survives_toml() {
        let store = SnippetStore::builtin().unwrap();
        let fetch = store.get(3).unwrap();
        assert!(fetch.code().contains("`/api/users/${id}`"));
    }

    #[test]
    fn test_unknown_keys_are_parse_errors() {
        let misnamed_table = r#"
[[snippets]]
id = "a"
title = "One"
language = "python"
code = "x = 1"
"#;
        let err = SnippetStore::from_toml(misnamed_table).unwrap_err();
        assert!(matches!(err, SnippetLoadError::Parse(_)));
        assert!(err.to_string().contains("snippets"));

        let stray_field = r#"
[[snippet]]
id = "a"
title = "One"
language = "python"
langauge = "python"
code = "x = 1"
"#;
        let err = SnippetStore::from_toml(stray_field).unwrap_err();
        assert!(matches!(err, SnippetLoadError::Parse(_)));
        assert!(err.to_string().contains("langauge"));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let toml_str = r#"
[[snippet]]
id = "a"
title = "One"
language = "python"
code = "x = 1"

[[snippet]]
id = "a"
title = "Two"
language = "python"
code = "y = 2"
"#;
        let err = SnippetStore::from_toml(toml_str).unwrap_err();
        assert!(matches!(err, SnippetLoadError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn test_rejects_empty_set_and_empty_code() {
        assert!(matches!(
            SnippetStore::from_toml("").unwrap_err(),
            SnippetLoadError::Empty
        ));
        let toml_str = r#"
[[snippet]]
id = "a"
title = "Blank"
language = "javascript"
code = ""
"#;
        assert!(matches!(
            SnippetStore::from_toml(toml_str).unwrap_err(),
            SnippetLoadError::EmptyCode(_)
        ));
    }

    #[test]
    fn test_missing_difficulty_defaults_to_medium() {
        let toml_str = r#"
[[snippet]]
id = "a"
title = "One"
language = "typescript"
code = "let a = 1;"
"#;
        let store = SnippetStore::from_toml(toml_str).unwrap();
        assert_eq!(store.get(0).unwrap().difficulty(), Difficulty::Medium);
    }

    #[test]
    fn test_load_user_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[[snippet]]\nid = \"u1\"\ntitle = \"Mine\"\nlanguage = \"python\"\ncode = \"print(1)\"\n"
        )
        .unwrap();
        let store = SnippetStore::load(Some(file.path())).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().code(), "print(1)");
    }

    #[test]
    fn test_load_missing_user_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = SnippetStore::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, SnippetLoadError::Io { .. }));
    }

    #[test]
    fn test_push_appends_with_stable_indices() {
        let mut store = SnippetStore::builtin().unwrap();
        let before: Vec<SnippetId> = store.iter().map(|s| s.id().clone()).collect();
        let id = store.generated_id();
        let idx = store.push(Snippet::new(
            id.clone(),
            "Gemini: loops",
            Language::Python,
            Difficulty::Medium,
            "for i in range(3):\n    print(i)",
        ));
        assert_eq!(idx, 5);
        assert_eq!(store.position(&id), Some(5));
        for (i, old) in before.iter().enumerate() {
            assert_eq!(store.get(i).unwrap().id(), old);
        }
    }

    #[test]
    fn test_generated_ids_are_unique_as_store_grows() {
        let mut store = SnippetStore::builtin().unwrap();
        let first = store.generated_id();
        store.push(Snippet::new(
            first.clone(),
            "t",
            Language::JavaScript,
            Difficulty::Medium,
            "a",
        ));
        let second = store.generated_id();
        assert_ne!(first, second);
        assert!(second.as_str().starts_with("gen-"));
    }
}
