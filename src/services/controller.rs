use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::ControllerError;
use crate::services::ai::Translator;
use crate::services::cancel::CancelToken;
use crate::services::events::EventSink;
use crate::services::pipeline::{self, RunRequest};
use crate::services::summary::RunSummary;

type Outcome = Result<RunSummary, String>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the background worker. At most one run is in flight; the worker
/// only talks back through the event sink and the final outcome slot.
#[derive(Default)]
pub struct RunController {
    worker: Mutex<Option<JoinHandle<()>>>,
    cancel: Mutex<CancelToken>,
    outcome: Arc<Mutex<Option<Outcome>>>,
}

impl RunController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Validates the request and starts the worker. Rejected without side
    /// effects while another run is active.
    pub fn start_run(
        &self,
        req: RunRequest,
        translator: Arc<dyn Translator>,
        events: EventSink,
    ) -> Result<(), ControllerError> {
        let mut worker = lock(&self.worker);

        if worker.as_ref().is_some_and(|h| !h.is_finished()) {
            tracing::warn!("start requested while a run is in progress");
            return Err(ControllerError::RunInProgress);
        }

        pipeline::validate(&req)?;

        if let Some(previous) = worker.take() {
            let _ = previous.join();
        }

        let cancel = CancelToken::new();
        *lock(&self.cancel) = cancel.clone();
        *lock(&self.outcome) = None;

        let outcome = Arc::clone(&self.outcome);
        let handle = thread::Builder::new()
            .name("vdf-translate".into())
            .spawn(move || {
                let result = pipeline::run(&req, translator.as_ref(), &cancel, &events);
                if let Err(e) = &result {
                    tracing::error!(error = %e, "run aborted");
                    events.error(format!("Translation failed: {e}"));
                }
                *lock(&outcome) = Some(result.map_err(|e| e.to_string()));
            })
            .map_err(ControllerError::Spawn)?;

        *worker = Some(handle);
        Ok(())
    }

    /// Requests cooperative cancellation. Returns whether a run was active.
    pub fn cancel_run(&self) -> bool {
        // Held across the check so a run started in between keeps its token.
        let worker = lock(&self.worker);
        let running = worker.as_ref().is_some_and(|h| !h.is_finished());
        if running {
            lock(&self.cancel).cancel();
            tracing::info!("cancellation requested");
        }
        running
    }

    /// Summary of the last finished run, if it got that far.
    pub fn summary(&self) -> Option<RunSummary> {
        match lock(&self.outcome).as_ref() {
            Some(Ok(summary)) => Some(summary.clone()),
            _ => None,
        }
    }

    /// Error of the last run, if it aborted before producing a summary.
    pub fn last_error(&self) -> Option<String> {
        match lock(&self.outcome).as_ref() {
            Some(Err(e)) => Some(e.clone()),
            _ => None,
        }
    }

    /// Blocks until the current worker exits and returns its outcome.
    pub fn wait(&self) -> Option<Outcome> {
        let handle = lock(&self.worker).take();
        if let Some(h) = handle {
            if h.join().is_err() {
                return Some(Err("worker thread panicked".into()));
            }
        }
        lock(&self.outcome).clone()
    }
}
