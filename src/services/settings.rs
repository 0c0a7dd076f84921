use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::services::ai::{AiConfig, DEFAULT_MODEL, DEFAULT_PROVIDER, TIMEOUT_SECS};

pub const SETTINGS_FILE: &str = "settings.json";
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    TIMEOUT_SECS
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            provider: default_provider(),
            model: default_model(),
            endpoint: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Settings {
    pub fn ai_config(&self) -> AiConfig {
        AiConfig {
            provider: self.provider.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone().filter(|e| !e.trim().is_empty()),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }

    /// Copy safe to show: the key reduced to a mask of the same length.
    pub fn redacted(&self) -> Settings {
        Settings {
            api_key: "*".repeat(self.api_key.chars().count()),
            ..self.clone()
        }
    }
}

/// Per-user data directory: `%LOCALAPPDATA%`, then `$HOME`, then the
/// working directory.
pub fn settings_dir() -> PathBuf {
    if let Ok(local) = std::env::var("LOCALAPPDATA") {
        return PathBuf::from(local).join("VdfTranslator");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".vdf-translator");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".vdf-translator")
}

pub fn default_path() -> PathBuf {
    settings_dir().join(SETTINGS_FILE)
}

/// A missing file yields defaults.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let data = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str::<Settings>(&data).map_err(|source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, json).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "settings saved");
    Ok(())
}

/// First non-empty of: explicit value, environment, stored settings.
pub fn resolve_api_key(explicit: Option<&str>, stored: &Settings) -> Option<String> {
    let env = std::env::var(API_KEY_ENV).ok();

    [explicit.map(str::to_string), env, Some(stored.api_key.clone())]
        .into_iter()
        .flatten()
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
}
