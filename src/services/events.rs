use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::Serialize;

use crate::model::job::JobState;
use crate::services::summary::RunSummary;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Worker -> controller messages.
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Log {
        level: LogLevel,
        message: String,
    },
    LanguageStarted {
        language: String,
        index: usize,
        total: usize,
    },
    TokenProgress {
        language: String,
        current: usize,
        total: usize,
        key: String,
    },
    LanguageFinished {
        language: String,
        state: JobState,
        output: Option<PathBuf>,
        error: Option<String>,
    },
    Progress {
        completed: usize,
        total: usize,
        fraction: f64,
    },
    Finished {
        summary: RunSummary,
    },
}

type Callback = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Where the worker's events go: a channel to the controller, a callback,
/// or nowhere. A dropped receiver is not an error for the worker; events are
/// simply discarded.
#[derive(Clone)]
pub struct EventSink(Target);

#[derive(Clone)]
enum Target {
    Channel(Sender<RunEvent>),
    Callback(Callback),
    Disabled,
}

impl EventSink {
    pub fn new(tx: Sender<RunEvent>) -> Self {
        Self(Target::Channel(tx))
    }

    pub fn from_fn(f: impl Fn(RunEvent) + Send + Sync + 'static) -> Self {
        Self(Target::Callback(Arc::new(f)))
    }

    pub fn disabled() -> Self {
        Self(Target::Disabled)
    }

    pub fn emit(&self, event: RunEvent) {
        match &self.0 {
            Target::Channel(tx) => {
                let _ = tx.send(event);
            }
            Target::Callback(f) => f(event),
            Target::Disabled => {}
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(RunEvent::Log {
            level,
            message: message.into(),
        });
    }
}
