//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Bad or missing input, detected before any work starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("source file not found or not a file: {0}")]
    MissingSource(PathBuf),

    #[error("select at least one target language")]
    NoLanguages,

    #[error("unknown target language: {0}")]
    UnknownLanguage(String),

    #[error("output directory not found or not a directory: {0}")]
    MissingOutputDir(PathBuf),

    #[error("translation API key is missing")]
    MissingCredential,
}

/// The source text could not be decoded at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("source file is empty")]
    Empty,

    #[error("no \"Language\" marker or \"Tokens\" section found")]
    NoContent,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// Transport, HTTP status or payload failure for a single text.
    #[error("remote translation failed: {0}")]
    Remote(String),

    /// The translator cannot be used at all; fails the owning language job.
    #[error("translator unavailable: {0}")]
    Fatal(String),
}

impl TranslationError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TranslationError::Remote(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("source file name {0:?} does not contain \"_loc_\"; cannot derive output name")]
pub struct FilenameFormatError(pub String);

/// Failure of one language job. Recorded on the job, never propagated.
#[derive(Debug, Error)]
pub enum LanguageError {
    #[error(transparent)]
    Filename(#[from] FilenameFormatError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("a translation run is already in progress; wait for it or cancel it")]
    RunInProgress,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to start worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
