use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vdf_translator::model::language::lookup;
use vdf_translator::{
    ControllerError, EventSink, JobState, RunController, RunEvent, RunRequest, SteamLanguage,
    TranslationError, Translator,
};

const SOURCE: &str = "\"lang\"\n{\n\t\"Language\"\t\"schinese\"\n\t\"Tokens\"\n\t{\n\
                      \t\t\"NEW_ACHIEVEMENT_1_NAME\"\t\"胜利\"\n\t}\n}";

/// Blocks every call until the test releases it.
struct Gated {
    gate: Mutex<Receiver<()>>,
}

impl Translator for Gated {
    fn translate(&self, text: &str, _: &SteamLanguage) -> Result<String, TranslationError> {
        let _ = self.gate.lock().unwrap().recv();
        Ok(format!("[{text}]"))
    }
}

fn request(dir: &Path, langs: &[&str]) -> RunRequest {
    let source = dir.join("1234567_loc_schinese.vdf");
    fs::write(&source, SOURCE).unwrap();
    RunRequest {
        source,
        languages: langs.iter().map(|l| lookup(l).unwrap()).collect(),
        output_dir: dir.to_path_buf(),
        credential: "sk-test".into(),
    }
}

fn wait_for_token(rx: &Receiver<RunEvent>) {
    loop {
        match rx.recv_timeout(Duration::from_secs(10)).expect("worker stalled") {
            RunEvent::TokenProgress { .. } => return,
            _ => continue,
        }
    }
}

#[test]
fn second_start_is_rejected_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let (release, gate) = mpsc::channel();
    let translator: Arc<dyn Translator> = Arc::new(Gated {
        gate: Mutex::new(gate),
    });
    let controller = RunController::new();
    let (tx, rx) = mpsc::channel();

    controller
        .start_run(
            request(dir.path(), &["english"]),
            Arc::clone(&translator),
            EventSink::new(tx),
        )
        .unwrap();
    wait_for_token(&rx);
    assert!(controller.is_running());

    let other = tempfile::tempdir().unwrap();
    let err = controller
        .start_run(
            request(other.path(), &["french"]),
            Arc::clone(&translator),
            EventSink::disabled(),
        )
        .unwrap_err();
    assert!(matches!(err, ControllerError::RunInProgress));

    release.send(()).unwrap();
    let summary = controller.wait().unwrap().unwrap();

    assert_eq!(summary.state_of("english"), Some(JobState::Completed));
    assert_eq!(summary.state_of("french"), None);
    assert!(!other.path().join("1234567_loc_french.vdf").exists());
    assert!(!controller.is_running());
}

#[test]
fn cancel_run_stops_after_in_flight_call() {
    let dir = tempfile::tempdir().unwrap();
    let (release, gate) = mpsc::channel();
    let translator: Arc<dyn Translator> = Arc::new(Gated {
        gate: Mutex::new(gate),
    });
    let controller = RunController::new();
    let (tx, rx) = mpsc::channel();

    controller
        .start_run(
            request(dir.path(), &["english", "french"]),
            translator,
            EventSink::new(tx),
        )
        .unwrap();
    wait_for_token(&rx);

    assert!(controller.cancel_run());
    release.send(()).unwrap();

    let summary = controller.wait().unwrap().unwrap();
    assert!(summary.cancelled_run);
    assert_eq!(summary.state_of("english"), Some(JobState::Cancelled));
    assert_eq!(summary.state_of("french"), None);
    assert!(!dir.path().join("1234567_loc_english.vdf").exists());
    assert_eq!(controller.summary(), Some(summary));
}

#[test]
fn validation_error_is_immediate() {
    let dir = tempfile::tempdir().unwrap();
    let mut req = request(dir.path(), &["english"]);
    req.output_dir = dir.path().join("missing");

    let controller = RunController::new();
    let (release, gate) = mpsc::channel::<()>();
    drop(release);
    let err = controller
        .start_run(
            req,
            Arc::new(Gated {
                gate: Mutex::new(gate),
            }),
            EventSink::disabled(),
        )
        .unwrap_err();

    assert!(matches!(err, ControllerError::Validation(_)));
    assert!(!controller.is_running());
    assert!(controller.summary().is_none());
}

#[test]
fn controller_can_run_again_after_finish() {
    let dir = tempfile::tempdir().unwrap();
    let (release, gate) = mpsc::channel();
    // Closed gate: recv fails immediately, so calls never block.
    drop(release);
    let translator: Arc<dyn Translator> = Arc::new(Gated {
        gate: Mutex::new(gate),
    });
    let controller = RunController::new();

    controller
        .start_run(
            request(dir.path(), &["english"]),
            Arc::clone(&translator),
            EventSink::disabled(),
        )
        .unwrap();
    controller.wait();

    controller
        .start_run(request(dir.path(), &["german"]), translator, EventSink::disabled())
        .unwrap();
    let summary = controller.wait().unwrap().unwrap();

    assert_eq!(summary.state_of("german"), Some(JobState::Completed));
    assert!(dir.path().join("1234567_loc_german.vdf").exists());
}

#[test]
fn late_cancel_does_not_reach_the_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let (release, gate) = mpsc::channel();
    drop(release);
    let translator: Arc<dyn Translator> = Arc::new(Gated {
        gate: Mutex::new(gate),
    });
    let controller = RunController::new();
    assert!(!controller.cancel_run());

    controller
        .start_run(
            request(dir.path(), &["english"]),
            Arc::clone(&translator),
            EventSink::disabled(),
        )
        .unwrap();
    controller.wait();

    // The first run is over, so this must not leak into the second one.
    assert!(!controller.cancel_run());

    controller
        .start_run(request(dir.path(), &["french"]), translator, EventSink::disabled())
        .unwrap();
    let summary = controller.wait().unwrap().unwrap();

    assert!(!summary.cancelled_run);
    assert_eq!(summary.state_of("french"), Some(JobState::Completed));
}
