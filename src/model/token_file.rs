use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Decoded form of a localization file.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TokenFile {
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub tokens: IndexMap<String, String>,
}

impl TokenFile {
    pub fn new(language: Option<String>, tokens: IndexMap<String, String>) -> Self {
        Self { language, tokens }
    }

    /// Number of values that would be sent for translation.
    pub fn translatable_count(&self) -> usize {
        self.tokens.values().filter(|v| !v.trim().is_empty()).count()
    }
}
