use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::FormatError;
use crate::model::token_file::TokenFile;

/// Only achievement tokens are extracted from the `"Tokens"` section.
pub const TOKEN_PREFIX: &str = "NEW_ACHIEVEMENT_";

fn inline_language_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "Language"	"english"
    RE.get_or_init(|| Regex::new(r#"^"Language"\s+"([^"]*)""#).expect("valid regex"))
}

pub fn decode(text: &str) -> Result<TokenFile, FormatError> {
    if text.trim().is_empty() {
        return Err(FormatError::Empty);
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let token_start = format!("\"{TOKEN_PREFIX}");

    let mut language: Option<String> = None;
    let mut seen_language = false;
    let mut in_tokens = false;
    let mut tokens: IndexMap<String, String> = IndexMap::new();

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();

        if line == "\"Language\"" {
            // Value on the next line.
            seen_language = true;
            if let Some(next) = lines.get(i + 1).map(|l| l.trim()) {
                if next.len() >= 2 && next.starts_with('"') && next.ends_with('"') {
                    language = Some(next[1..next.len() - 1].to_string());
                }
            }
        } else if let Some(caps) = inline_language_re().captures(line) {
            seen_language = true;
            language = Some(caps[1].to_string());
        } else if line.contains("\"Tokens\"") {
            in_tokens = true;
        } else if in_tokens && line.starts_with(&token_start) {
            let mut fields = quoted_fields(line).into_iter();
            let key = fields.next().unwrap_or_default();
            let value = fields.next().unwrap_or_default();
            tokens.insert(key, value);
        }
    }

    if !seen_language && !in_tokens {
        return Err(FormatError::NoContent);
    }

    Ok(TokenFile::new(language, tokens))
}

/// Splits a line into its quoted fields, undoing backslash escapes.
/// An unterminated field runs to the end of the line.
fn quoted_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if c != '"' {
            continue;
        }
        let mut field = String::new();
        while let Some(c) = chars.next() {
            match c {
                '"' => break,
                '\\' => match chars.next() {
                    Some('n') => field.push('\n'),
                    Some('t') => field.push('\t'),
                    Some('r') => field.push('\r'),
                    Some('"') => field.push('"'),
                    Some('\\') => field.push('\\'),
                    Some(other) => {
                        field.push('\\');
                        field.push(other);
                    }
                    None => field.push('\\'),
                },
                _ => field.push(c),
            }
        }
        fields.push(field);
    }

    fields
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

pub fn encode(language: &str, tokens: &IndexMap<String, String>) -> String {
    let mut out = String::from("\"lang\"\n{\n");
    out.push_str(&format!("\t\"Language\"\t\"{language}\"\n"));
    out.push_str("\t\"Tokens\"\n\t{\n");

    for (key, value) in tokens {
        out.push_str(&format!("\t\t\"{key}\"\t\"{}\"\n", escape(value)));
    }

    out.push_str("\t}\n}");
    out
}
