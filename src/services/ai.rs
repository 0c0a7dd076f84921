use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::error::TranslationError;
use crate::model::language::SteamLanguage;
use crate::services::ai_types::TranslationResult;
use crate::services::cancel::CancelToken;
use crate::services::events::EventSink;

pub const DEFAULT_PROVIDER: &str = "deepseek";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const TIMEOUT_SECS: u64 = 30;
const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 1000;

/// Label the prompt ends with. Models sometimes echo it back.
pub const RESULT_LABEL: &str = "Translation result:";
const RESULT_LABELS: [&str; 2] = [RESULT_LABEL, "翻译结果:"];

/// Turns one source string into the target language.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target: &SteamLanguage) -> Result<String, TranslationError>;
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    /// Overrides the provider's endpoint when set.
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl AiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: None,
            timeout: Duration::from_secs(TIMEOUT_SECS),
        }
    }
}

fn endpoint_for(provider: &str) -> Result<&'static str, TranslationError> {
    match provider {
        "deepseek" => Ok("https://api.deepseek.com/v1/chat/completions"),
        "openai" => Ok("https://api.openai.com/v1/chat/completions"),
        other => Err(TranslationError::Fatal(format!(
            "unsupported provider: {other}"
        ))),
    }
}

/// Chat-completion client, one request per string.
pub struct ChatTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatTranslator {
    pub fn new(cfg: &AiConfig) -> Result<Self, TranslationError> {
        let endpoint = match &cfg.endpoint {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => endpoint_for(&cfg.provider)?.to_string(),
        };

        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| TranslationError::Fatal(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Translator for ChatTranslator {
    fn translate(&self, text: &str, target: &SteamLanguage) -> Result<String, TranslationError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": build_prompt(text, target) }
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| TranslationError::Remote(e.to_string()))?;

        let status = resp.status();

        // Read as text first so an error body is not lost to a JSON failure.
        let body_text = resp
            .text()
            .map_err(|e| TranslationError::Remote(e.to_string()))?;

        if !status.is_success() {
            return Err(TranslationError::Remote(extract_error_message(
                status, &body_text,
            )));
        }

        let content = extract_content(&body_text)?;
        let cleaned = clean_response(&content);
        if cleaned.is_empty() {
            return Err(TranslationError::Remote("empty translation in response".into()));
        }

        Ok(cleaned)
    }
}

pub fn build_prompt(text: &str, target: &SteamLanguage) -> String {
    format!(
        "Translate the following text from Chinese into {}.\n\
         Keep the tone and style of the original and do not add any explanation or notes.\n\
         If the text is a game achievement name or description, use phrasing that fits a game.\n\
         Reply with the translated text only.\n\
         Original: {}\n\
         {}",
        target.name, text, RESULT_LABEL
    )
}

fn extract_content(body_text: &str) -> Result<String, TranslationError> {
    let v: Value = serde_json::from_str(body_text)
        .map_err(|_| TranslationError::Remote("invalid JSON from AI".into()))?;

    v.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            TranslationError::Remote(
                "invalid AI response: missing choices[0].message.content".into(),
            )
        })
}

/// Keeps only what follows the last echoed result label, trimmed.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();

    for label in RESULT_LABELS {
        if let Some(pos) = text.rfind(label) {
            text = text[pos + label.len()..].trim();
        }
    }

    // Models often wrap the whole answer in one pair of quotes.
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|t| t.strip_suffix(close))
        {
            text = inner.trim();
            break;
        }
    }

    text.to_string()
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    // { "error": { "message": "..." } } or { "message": "..." }
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
    }

    let trimmed = body_text.trim();
    let snippet: String = if trimmed.chars().count() > 400 {
        let head: String = trimmed.chars().take(400).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    };

    format!("HTTP {}: {}", status.as_u16(), snippet)
}

/// Translates one value with the batch's degradation rules: blank text and
/// cancelled runs never reach the translator, and remote failures hand back
/// the source text. Only non-recoverable errors are returned.
pub fn translate_or_passthrough(
    translator: &dyn Translator,
    text: &str,
    target: &SteamLanguage,
    cancel: &CancelToken,
    events: &EventSink,
) -> Result<TranslationResult, TranslationError> {
    if text.trim().is_empty() || cancel.is_cancelled() {
        return Ok(TranslationResult::unchanged(text));
    }

    match translator.translate(text, target) {
        Ok(translated) => Ok(TranslationResult::translated(translated)),
        Err(e) if e.is_recoverable() => {
            tracing::warn!(language = target.id, error = %e, "translation failed, keeping source text");
            events.warn(format!("Translation error: {e}"));
            Ok(TranslationResult::fallback(text, e.to_string()))
        }
        Err(e) => Err(e),
    }
}
