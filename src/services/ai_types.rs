use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    /// Translated text, or the source text when `ok` is false.
    pub text: String,
    pub ok: bool,
    pub error: Option<String>,
}

impl TranslationResult {
    pub fn translated(text: String) -> Self {
        Self {
            text,
            ok: true,
            error: None,
        }
    }

    /// Nothing was sent; the text is returned as is.
    pub fn unchanged(original: &str) -> Self {
        Self {
            text: original.to_string(),
            ok: true,
            error: None,
        }
    }

    /// The remote call failed; the source text stands in for the translation.
    pub fn fallback(original: &str, error: String) -> Self {
        Self {
            text: original.to_string(),
            ok: false,
            error: Some(error),
        }
    }
}
