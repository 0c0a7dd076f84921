use std::path::PathBuf;

use serde::Serialize;

use crate::model::job::{JobState, LanguageJob};

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a run, derived from the final job states. Languages that were
/// never attempted do not appear in any bucket.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub cancelled_run: bool,
    pub completed: Vec<SummaryEntry>,
    pub failed: Vec<SummaryEntry>,
    pub cancelled: Vec<SummaryEntry>,
}

impl RunSummary {
    pub fn from_jobs(jobs: &[LanguageJob], cancelled_run: bool) -> Self {
        let mut summary = RunSummary {
            total: jobs.len(),
            cancelled_run,
            ..Default::default()
        };

        for job in jobs {
            let entry = SummaryEntry {
                id: job.language.id.to_string(),
                name: job.language.name.to_string(),
                output: job.output.clone(),
                error: job.error.clone(),
            };

            match job.state {
                JobState::Completed => summary.completed.push(entry),
                JobState::Failed => summary.failed.push(entry),
                JobState::Cancelled => summary.cancelled.push(entry),
                JobState::Pending | JobState::Running => {}
            }
        }

        summary
    }

    pub fn state_of(&self, id: &str) -> Option<JobState> {
        let has = |bucket: &[SummaryEntry]| bucket.iter().any(|e| e.id == id);
        if has(&self.completed[..]) {
            Some(JobState::Completed)
        } else if has(&self.failed[..]) {
            Some(JobState::Failed)
        } else if has(&self.cancelled[..]) {
            Some(JobState::Cancelled)
        } else {
            None
        }
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Translation {}! Total: {}, succeeded: {}, failed: {}, cancelled: {}",
            if self.cancelled_run { "cancelled" } else { "finished" },
            self.total,
            self.completed.len(),
            self.failed.len(),
            self.cancelled.len()
        )];

        if !self.failed.is_empty() {
            lines.push(format!("Failed languages: {}", names(&self.failed)));
        }
        if !self.completed.is_empty() {
            lines.push(format!("Translated languages: {}", names(&self.completed)));
        }

        lines
    }
}

fn names(entries: &[SummaryEntry]) -> String {
    entries
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
