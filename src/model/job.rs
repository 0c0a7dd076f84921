use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::language::SteamLanguage;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// One target language of a run.
#[derive(Debug, Serialize, Clone)]
pub struct LanguageJob {
    pub language: &'static SteamLanguage,

    pub state: JobState,

    pub output: Option<PathBuf>,

    pub error: Option<String>,

    /// Values the remote service translated.
    pub translated: usize,

    /// Values that fell back to the source text after a remote failure.
    pub passthrough: usize,
}

impl LanguageJob {
    pub fn new(language: &'static SteamLanguage) -> Self {
        Self {
            language,
            state: JobState::default(),
            output: None,
            error: None,
            translated: 0,
            passthrough: 0,
        }
    }

    pub fn start(&mut self) {
        debug_assert_eq!(self.state, JobState::Pending);
        self.state = JobState::Running;
    }

    pub fn complete(&mut self, output: PathBuf) {
        self.state = JobState::Completed;
        self.output = Some(output);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = JobState::Failed;
        self.error = Some(error.into());
    }

    pub fn cancel(&mut self) {
        self.state = JobState::Cancelled;
    }
}
