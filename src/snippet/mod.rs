pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(String);

impl SnippetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
}

impl Language {
    /// Choices offered by the generate form, in display order.
    pub const CHOICES: [Language; 3] = [Language::TypeScript, Language::JavaScript, Language::Python];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "python" | "py" => Ok(Language::Python),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

/// Display-only; nothing gates on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// An immutable practice target. Fields are private so a stored snippet can
/// never be edited after it enters the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    id: SnippetId,
    title: String,
    language: Language,
    difficulty: Difficulty,
    code: String,
}

impl Snippet {
    pub fn new(
        id: SnippetId,
        title: impl Into<String>,
        language: Language,
        difficulty: Difficulty,
        code: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            language,
            difficulty,
            code: code.into(),
        }
    }

    pub fn id(&self) -> &SnippetId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The exact text the user has to reproduce.
    pub fn code(&self) -> &str {
        &self.code
    }
}
